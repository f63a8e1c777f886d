//! API request and response types

use crate::health_metrics::ActivityInput;
use crate::models::{CurrentMeasurement, DailyValue, MealEntry, User, WeightHistoryEntry};
use crate::units::{HeightUnit, WeightUnit};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Optional `?date=` query parameter; defaults to today
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

// ============================================================================
// Weight
// ============================================================================

/// Weight log request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordWeightRequest {
    pub user_id: Uuid,
    pub weight: f64,
    #[serde(default)]
    pub unit: WeightUnit,
    /// Defaults to today
    #[serde(default)]
    pub measured_on: Option<NaiveDate>,
}

/// Snapshot returned after a weight is recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRecorded {
    pub measurement: CurrentMeasurement,
    pub entry: WeightHistoryEntry,
}

// ============================================================================
// Nutrition
// ============================================================================

/// Meal log request. `calories` may be omitted when estimation is enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMealRequest {
    pub user_id: Uuid,
    #[serde(alias = "food")]
    pub food_name: String,
    #[serde(default)]
    pub calories: Option<f64>,
    /// Free-text portion, only used for estimation
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub protein_g: Option<f64>,
    #[serde(default)]
    pub carbs_g: Option<f64>,
    #[serde(default)]
    pub fat_g: Option<f64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Nutrition estimate request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateNutritionRequest {
    #[serde(alias = "food")]
    pub food_name: String,
    #[serde(default)]
    pub quantity: Option<String>,
}

/// Suggested nutrition values for a food, before validation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutritionEstimate {
    pub calories: f64,
    #[serde(alias = "protein")]
    pub protein_g: f64,
    #[serde(alias = "carbs")]
    pub carbs_g: f64,
    #[serde(alias = "fat")]
    pub fat_g: f64,
}

/// Meals logged on one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealsResponse {
    pub date: NaiveDate,
    pub meals: Vec<MealEntry>,
    pub total_calories: f64,
}

/// Calories consumed on a day joined with the current measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_calories: f64,
    pub meal_count: usize,
    pub current_measurement: Option<CurrentMeasurement>,
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub current_measurement: Option<CurrentMeasurement>,
    pub calories_today: f64,
    /// Most recent weights, newest first
    pub weight_history: Vec<DailyValue>,
    /// Most recent per-day calorie totals, newest first
    pub calorie_history: Vec<DailyValue>,
}

// ============================================================================
// Profile
// ============================================================================

/// Partial profile and measurement update
///
/// Every field is optional. Gender is taken as text so that an unknown
/// value is reported as a validation error naming the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub fitness_goal: Option<String>,
    pub image_url: Option<String>,
    pub weight: Option<f64>,
    #[serde(default)]
    pub unit: WeightUnit,
    pub height: Option<f64>,
    #[serde(default)]
    pub height_unit: HeightUnit,
    pub gender: Option<String>,
    pub activity_level: Option<ActivityInput>,
}

/// Merged identity and measurement state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    pub measurement: Option<CurrentMeasurement>,
}
