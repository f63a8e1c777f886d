//! Measurement ledger
//!
//! Owns the per-user current measurement and the append-only weight and
//! meal histories. Every measurement write goes through
//! [`MeasurementLedger::record_measurement`], which hands a pure planner to
//! the store; the store runs it under the per-user lock and persists its
//! result atomically.
//!
//! Weight change is always `latest - starting`, recomputed from the stored
//! starting weight on every write. It is never accumulated from a previous
//! change value, so replaying the same input cannot drift.

use crate::clock::Clock;
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::repositories::{
    CommittedMeasurement, LedgerStore, MealStore, MeasurementStore, PlannedMeasurement, UserStore,
};
use chrono::NaiveDate;
use fitness_tracker_shared::validation::{
    validate_activity_factor, validate_calories, validate_food_name, validate_height_cm,
    validate_macro_grams, validate_weight,
};
use fitness_tracker_shared::{
    compute_age, daily_calorie_target, round_2dp, CurrentMeasurement, DailySummary, DailyValue,
    Dashboard, Gender, Macros, MealEntry, MealsResponse, NewMealEntry, NewWeightEntry, User,
    WeightRecorded,
};
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A measurement change. `None` keeps the stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementUpdate {
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub gender: Option<Gender>,
    pub activity_factor: Option<f64>,
    /// Birthday to use for the age instead of the stored one
    pub birthday: Option<NaiveDate>,
    pub measured_on: NaiveDate,
}

impl MeasurementUpdate {
    pub fn weight(weight_kg: f64, measured_on: NaiveDate) -> Self {
        Self {
            weight_kg: Some(weight_kg),
            height_cm: None,
            gender: None,
            activity_factor: None,
            birthday: None,
            measured_on,
        }
    }

    fn validate(&self) -> Result<(), LedgerError> {
        if let Some(w) = self.weight_kg {
            validate_weight(w).map_err(|e| LedgerError::invalid_measurement("weight", e))?;
        }
        if let Some(h) = self.height_cm {
            validate_height_cm(h).map_err(|e| LedgerError::invalid_measurement("height", e))?;
        }
        if let Some(f) = self.activity_factor {
            validate_activity_factor(f)
                .map_err(|e| LedgerError::invalid_measurement("activity_level", e))?;
        }
        Ok(())
    }
}

/// A meal to append
#[derive(Debug, Clone, PartialEq)]
pub struct MealInput {
    pub eaten_on: NaiveDate,
    pub food_name: String,
    pub calories: f64,
    pub macros: Option<Macros>,
}

/// Decide the next current measurement
///
/// Weight falls back to the stored latest weight, so updates that only
/// touch height, gender or activity recompute the target without adding
/// history. With no stored row a weight is mandatory, because it becomes
/// the starting weight.
///
/// A weight dated before the stored `last_updated` is appended to history
/// only; the current state keeps its newer weight and date.
pub fn plan_measurement(
    user: &User,
    existing: Option<&CurrentMeasurement>,
    update: &MeasurementUpdate,
    policy: &LedgerConfig,
) -> Result<PlannedMeasurement, LedgerError> {
    let as_of = existing.map_or(update.measured_on, |m| m.last_updated.max(update.measured_on));
    let backdated = as_of != update.measured_on;

    let weight = match (update.weight_kg, existing) {
        (Some(w), _) if !backdated => w,
        (_, Some(current)) => current.latest_weight_kg,
        (_, None) => {
            return Err(LedgerError::invalid_measurement(
                "weight",
                "A weight is required for the first measurement",
            ))
        }
    };
    let starting = existing.map_or(weight, |m| m.starting_weight_kg);

    let height = update.height_cm.or_else(|| existing.and_then(|m| m.height_cm));
    let gender = update
        .gender
        .or_else(|| existing.map(|m| m.gender))
        .unwrap_or_default();
    let activity_factor = update
        .activity_factor
        .or_else(|| existing.map(|m| m.activity_factor))
        .unwrap_or(policy.default_activity_factor);

    let age = update
        .birthday
        .or(user.birthday)
        .map(|birthday| compute_age(birthday, as_of).max(0))
        .unwrap_or(policy.fallback_age_years);

    Ok(PlannedMeasurement {
        latest_weight_kg: weight,
        starting_weight_kg: starting,
        weight_change_kg: round_2dp(weight - starting),
        height_cm: height,
        gender,
        activity_factor,
        daily_calorie_target: height
            .map(|h| daily_calorie_target(weight, h, age, gender, activity_factor)),
        last_updated: as_of,
        history: update.weight_kg.map(|weight_kg| NewWeightEntry {
            measured_on: update.measured_on,
            weight_kg,
        }),
    })
}

/// Sum of a day's meals
pub fn aggregate_meals(meals: &[MealEntry]) -> f64 {
    round_2dp(meals.iter().map(|m| m.calories).sum())
}

pub struct MeasurementLedger {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    policy: LedgerConfig,
}

impl MeasurementLedger {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>, policy: LedgerConfig) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Record a weight observation and return the new state plus the
    /// appended history entry
    pub async fn record_weight(
        &self,
        user_id: Uuid,
        weight_kg: f64,
        measured_on: NaiveDate,
    ) -> Result<WeightRecorded, LedgerError> {
        if measured_on > self.today() {
            return Err(LedgerError::invalid_measurement(
                "measured_on",
                "Measurement date cannot be in the future",
            ));
        }

        let committed = self
            .record_measurement(user_id, MeasurementUpdate::weight(weight_kg, measured_on))
            .await?;

        let entry = committed.entry.ok_or_else(|| {
            LedgerError::Persistence(anyhow::anyhow!("weight commit returned no history entry"))
        })?;

        Ok(WeightRecorded {
            measurement: committed.measurement,
            entry,
        })
    }

    /// Apply a measurement change atomically
    pub async fn record_measurement(
        &self,
        user_id: Uuid,
        update: MeasurementUpdate,
    ) -> Result<CommittedMeasurement, LedgerError> {
        // Validate the rounded values, which are the ones stored
        let update = MeasurementUpdate {
            weight_kg: update.weight_kg.map(round_2dp),
            height_cm: update.height_cm.map(round_2dp),
            ..update
        };
        update.validate()?;

        let policy = self.policy.clone();
        let planner = move |user: &User, existing: Option<&CurrentMeasurement>| {
            plan_measurement(user, existing, &update, &policy)
        };

        match self.store.commit_measurement(user_id, &planner).await {
            Ok(committed) => {
                if let Some(entry) = &committed.entry {
                    counter!("ledger_weight_records_total").increment(1);
                    info!(
                        user_id = %user_id,
                        weight_kg = entry.weight_kg,
                        change_kg = committed.measurement.weight_change_kg,
                        "Weight recorded"
                    );
                } else {
                    debug!(user_id = %user_id, "Measurement recomputed without new weight");
                }
                Ok(committed)
            }
            Err(err) => {
                if let LedgerError::Persistence(cause) = &err {
                    counter!("ledger_commit_failures_total").increment(1);
                    warn!(user_id = %user_id, error = %cause, "Measurement commit rolled back");
                }
                Err(err)
            }
        }
    }

    /// Append a meal entry
    pub async fn record_meal(&self, user_id: Uuid, input: MealInput) -> Result<MealEntry, LedgerError> {
        let calories = round_2dp(input.calories);
        validate_calories(calories).map_err(|e| LedgerError::invalid_meal("calories", e))?;
        let food_name = validate_food_name(&input.food_name)
            .map_err(|e| LedgerError::invalid_meal("food_name", e))?;
        let macros = input.macros.map(|m| Macros {
            protein_g: round_2dp(m.protein_g),
            carbs_g: round_2dp(m.carbs_g),
            fat_g: round_2dp(m.fat_g),
        });
        if let Some(m) = &macros {
            for (field, grams) in [("protein_g", m.protein_g), ("carbs_g", m.carbs_g), ("fat_g", m.fat_g)] {
                validate_macro_grams(grams).map_err(|e| LedgerError::invalid_meal(field, e))?;
            }
        }

        self.require_user(user_id).await?;

        let meal = self
            .store
            .insert_meal(NewMealEntry {
                user_id,
                eaten_on: input.eaten_on,
                food_name,
                calories,
                macros,
            })
            .await?;

        counter!("ledger_meal_records_total").increment(1);
        info!(user_id = %user_id, calories = meal.calories, "Meal recorded");
        Ok(meal)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Calories eaten on `date` joined with the current measurement.
    /// A day without meals totals zero.
    pub async fn get_daily_summary(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<DailySummary, LedgerError> {
        self.require_user(user_id).await?;

        let meals = self.store.meals_on(user_id, date).await?;
        let current_measurement = self.store.current_measurement(user_id).await?;

        Ok(DailySummary {
            date,
            total_calories: aggregate_meals(&meals),
            meal_count: meals.len(),
            current_measurement,
        })
    }

    pub async fn meals_for_day(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<MealsResponse, LedgerError> {
        self.require_user(user_id).await?;

        let meals = self.store.meals_on(user_id, date).await?;
        Ok(MealsResponse {
            date,
            total_calories: aggregate_meals(&meals),
            meals,
        })
    }

    /// Current state, today's intake and the recent chart series
    pub async fn get_dashboard(&self, user_id: Uuid) -> Result<Dashboard, LedgerError> {
        self.require_user(user_id).await?;

        let limit = self.policy.history_limit;
        let today = self.today();

        let current_measurement = self.store.current_measurement(user_id).await?;
        let meals_today = self.store.meals_on(user_id, today).await?;
        let weight_history = self
            .store
            .weight_history(user_id, limit)
            .await?
            .into_iter()
            .map(|e| DailyValue {
                date: e.measured_on,
                value: e.weight_kg,
            })
            .collect();
        let calorie_history = self.store.calorie_history(user_id, limit).await?;

        Ok(Dashboard {
            current_measurement,
            calories_today: aggregate_meals(&meals_today),
            weight_history,
            calorie_history,
        })
    }

    async fn require_user(&self, user_id: Uuid) -> Result<User, LedgerError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(LedgerError::UserNotFound(user_id))
    }
}
