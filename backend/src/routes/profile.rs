//! Profile and dashboard API routes

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use fitness_tracker_shared::types::{Dashboard, ProfileSnapshot, ProfileUpdateRequest};
use uuid::Uuid;

/// Create profile routes
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/:user_id", get(get_profile))
        .route("/update/:user_id", post(update_profile))
}

/// Create dashboard routes
pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/:user_id", get(get_dashboard))
}

/// GET /api/v1/profile/:user_id - Identity, age and current measurement
async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ProfileSnapshot>, ApiError> {
    Ok(Json(state.profiles.get_profile(user_id).await?))
}

/// POST /api/v1/profile/update/:user_id - Partial profile and measurement update
///
/// Every field is optional. Measurement fields go through the ledger;
/// identity fields are written to the user record afterwards.
async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    payload: Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> Result<Json<ProfileSnapshot>, ApiError> {
    let Json(req) = payload?;
    let snapshot = state
        .profiles
        .update_profile_and_measurement(user_id, req)
        .await?;
    Ok(Json(snapshot))
}

/// GET /api/v1/dashboard/:user_id - Current state and recent chart series
async fn get_dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Dashboard>, ApiError> {
    Ok(Json(state.ledger.get_dashboard(user_id).await?))
}
