//! Data models for the fitness tracker
//!
//! Measurements are in SI units: kilograms, centimeters, kcal, grams.

use crate::health_metrics::Gender;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User identity, owned by the account subsystem and referenced by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub fitness_goal: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to register a user record
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub birthday: Option<NaiveDate>,
}

/// Partial identity update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub fitness_goal: Option<String>,
    pub image_url: Option<String>,
}

impl IdentityUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.birthday.is_none()
            && self.fitness_goal.is_none()
            && self.image_url.is_none()
    }
}

/// The single mutable "latest known state" row per user
///
/// `starting_weight_kg` is fixed at the first write. `weight_change_kg` and
/// `daily_calorie_target` are derived on every write and never set directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentMeasurement {
    pub user_id: Uuid,
    pub latest_weight_kg: f64,
    pub starting_weight_kg: f64,
    pub weight_change_kg: f64,
    pub height_cm: Option<f64>,
    pub gender: Gender,
    pub activity_factor: f64,
    /// Absent until a height is known
    pub daily_calorie_target: Option<i32>,
    pub last_updated: NaiveDate,
}

/// Append-only weight observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightHistoryEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub measured_on: NaiveDate,
    pub weight_kg: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Weight observation about to be appended
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewWeightEntry {
    pub measured_on: NaiveDate,
    pub weight_kg: f64,
}

/// Optional macronutrient breakdown of a meal, in grams
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Macros {
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// Append-only meal record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub eaten_on: NaiveDate,
    pub food_name: String,
    pub calories: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macros: Option<Macros>,
    pub recorded_at: DateTime<Utc>,
}

/// Validated meal about to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewMealEntry {
    pub user_id: Uuid,
    pub eaten_on: NaiveDate,
    pub food_name: String,
    pub calories: f64,
    pub macros: Option<Macros>,
}

/// One point of a per-day chart series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyValue {
    pub date: NaiveDate,
    pub value: f64,
}
