//! Weight, calorie and meal API routes

use crate::error::{ApiError, LedgerError};
use crate::services::nutrition::validate_estimate;
use crate::services::{EstimateError, MealInput};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use fitness_tracker_shared::types::{
    DailySummary, DateQuery, EstimateNutritionRequest, MealsResponse, NutritionEstimate,
    RecordMealRequest, RecordWeightRequest, WeightRecorded,
};
use fitness_tracker_shared::validation::validate_food_name;
use fitness_tracker_shared::{Macros, MealEntry};
use uuid::Uuid;

/// Create fitness routes
pub fn fitness_routes() -> Router<AppState> {
    Router::new()
        .route("/weight", post(log_weight))
        .route("/calories", post(log_calories))
        .route("/calories/estimate", post(estimate_calories))
        .route("/meals/:user_id", get(get_meals))
        .route("/summary/:user_id", get(get_summary))
}

fn estimate_error(err: EstimateError) -> ApiError {
    match err {
        EstimateError::Disabled => ApiError::Unavailable("Nutrition estimates are disabled".to_string()),
        other => ApiError::Upstream(other.to_string()),
    }
}

/// Macros are stored only when at least one was supplied
fn supplied_macros(protein_g: Option<f64>, carbs_g: Option<f64>, fat_g: Option<f64>) -> Option<Macros> {
    if protein_g.is_none() && carbs_g.is_none() && fat_g.is_none() {
        return None;
    }
    Some(Macros {
        protein_g: protein_g.unwrap_or_default(),
        carbs_g: carbs_g.unwrap_or_default(),
        fat_g: fat_g.unwrap_or_default(),
    })
}

/// POST /api/v1/fitness/weight - Log a weight entry
///
/// Accepts weight in any unit (kg, lbs, stone); converted to kg before
/// validation. `measured_on` defaults to today.
async fn log_weight(
    State(state): State<AppState>,
    payload: Result<Json<RecordWeightRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WeightRecorded>), ApiError> {
    let Json(req) = payload?;
    let weight_kg = req.unit.to_kg(req.weight);
    let measured_on = req.measured_on.unwrap_or_else(|| state.ledger.today());

    let recorded = state
        .ledger
        .record_weight(req.user_id, weight_kg, measured_on)
        .await?;

    Ok((StatusCode::CREATED, Json(recorded)))
}

/// POST /api/v1/fitness/calories - Log a meal
///
/// When `calories` is omitted the meal is estimated first; the estimate is
/// validated like user input before it is logged.
async fn log_calories(
    State(state): State<AppState>,
    payload: Result<Json<RecordMealRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MealEntry>), ApiError> {
    let Json(req) = payload?;
    let food_name = validate_food_name(&req.food_name)
        .map_err(|e| LedgerError::invalid_meal("food_name", e))?;
    let eaten_on = req.date.unwrap_or_else(|| state.ledger.today());
    let macros = supplied_macros(req.protein_g, req.carbs_g, req.fat_g);

    let (calories, macros) = match req.calories {
        Some(calories) => (calories, macros),
        None => {
            let estimate = match state
                .estimator
                .estimate(&food_name, req.quantity.as_deref())
                .await
            {
                Ok(estimate) => validate_estimate(estimate)?,
                Err(EstimateError::Disabled) => {
                    return Err(LedgerError::invalid_meal("calories", "Calories are required").into())
                }
                Err(e) => return Err(estimate_error(e)),
            };
            let estimated = Macros {
                protein_g: estimate.protein_g,
                carbs_g: estimate.carbs_g,
                fat_g: estimate.fat_g,
            };
            (estimate.calories, macros.or(Some(estimated)))
        }
    };

    let meal = state
        .ledger
        .record_meal(
            req.user_id,
            MealInput {
                eaten_on,
                food_name,
                calories,
                macros,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(meal)))
}

/// POST /api/v1/fitness/calories/estimate - Suggest nutrition for a food
async fn estimate_calories(
    State(state): State<AppState>,
    payload: Result<Json<EstimateNutritionRequest>, JsonRejection>,
) -> Result<Json<NutritionEstimate>, ApiError> {
    let Json(req) = payload?;
    let food_name = validate_food_name(&req.food_name)
        .map_err(|e| LedgerError::invalid_meal("food_name", e))?;

    let estimate = state
        .estimator
        .estimate(&food_name, req.quantity.as_deref())
        .await
        .map_err(estimate_error)?;

    Ok(Json(validate_estimate(estimate)?))
}

/// GET /api/v1/fitness/meals/:user_id - Meals for a day (default today)
async fn get_meals(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> Result<Json<MealsResponse>, ApiError> {
    let date = query.date.unwrap_or_else(|| state.ledger.today());
    Ok(Json(state.ledger.meals_for_day(user_id, date).await?))
}

/// GET /api/v1/fitness/summary/:user_id - Calories for a day plus current state
async fn get_summary(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> Result<Json<DailySummary>, ApiError> {
    let date = query.date.unwrap_or_else(|| state.ledger.today());
    Ok(Json(state.ledger.get_daily_summary(user_id, date).await?))
}
