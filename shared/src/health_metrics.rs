//! Health metrics calculations module
//!
//! Provides the derived body metrics the measurement ledger recomputes on
//! every update: calendar age and the Mifflin-St Jeor daily calorie target.
//!
//! Everything here is a pure function of its arguments. Callers validate
//! inputs (finite, positive weight and height) before calling in; these
//! functions never reject numeric values.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// User Profile Types
// ============================================================================

/// Gender used for the BMR constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    /// Unspecified or neither; uses the midpoint constant
    #[default]
    Other,
}

impl Gender {
    /// Sex-specific constant added to the Mifflin-St Jeor base
    pub fn bmr_offset(&self) -> f64 {
        match self {
            Gender::Male => 5.0,
            Gender::Female => -161.0,
            Gender::Other => -120.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" | "unspecified" => Ok(Gender::Other),
            _ => Err(format!(
                "Invalid gender '{}'. Must be one of: male, female, other",
                s
            )),
        }
    }
}

/// Activity level presets for the TDEE multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    #[default]
    Sedentary,
    /// Light exercise 1-3 days/week
    #[serde(alias = "light")]
    LightlyActive,
    /// Moderate exercise 3-5 days/week
    #[serde(alias = "moderate")]
    ModeratelyActive,
    /// Hard exercise 6-7 days/week
    VeryActive,
    /// Very hard exercise, physical job
    ExtraActive,
}

impl ActivityLevel {
    /// Get the activity multiplier for TDEE calculation
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtraActive => 1.9,
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" | "lightly_active" => Ok(ActivityLevel::LightlyActive),
            "moderate" | "moderately_active" => Ok(ActivityLevel::ModeratelyActive),
            "very_active" => Ok(ActivityLevel::VeryActive),
            "extra_active" => Ok(ActivityLevel::ExtraActive),
            _ => Err(format!("Unknown activity level: {}", s)),
        }
    }
}

/// Activity as supplied by a client: a named preset or a raw multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActivityInput {
    Level(ActivityLevel),
    Factor(f64),
}

impl ActivityInput {
    pub fn factor(&self) -> f64 {
        match self {
            ActivityInput::Level(level) => level.multiplier(),
            ActivityInput::Factor(factor) => *factor,
        }
    }
}

// ============================================================================
// Age
// ============================================================================

/// Whole calendar years between `birthdate` and `as_of`
///
/// Decrements by one when the birthday has not yet occurred in the
/// `as_of` year. Birthdates after `as_of` yield a negative age; callers
/// reject those at validation time.
pub fn compute_age(birthdate: NaiveDate, as_of: NaiveDate) -> i32 {
    let mut years = as_of.year() - birthdate.year();
    if (as_of.month(), as_of.day()) < (birthdate.month(), birthdate.day()) {
        years -= 1;
    }
    years
}

// ============================================================================
// BMR and TDEE Calculations
// ============================================================================

/// Calculate Basal Metabolic Rate using Mifflin-St Jeor equation
///
/// Men: BMR = 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) + 5
/// Women: BMR = 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) - 161
/// Other: BMR = 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) - 120
pub fn calculate_bmr_mifflin(weight_kg: f64, height_cm: f64, age_years: i32, gender: Gender) -> f64 {
    10.0 * weight_kg + 6.25 * height_cm - 5.0 * age_years as f64 + gender.bmr_offset()
}

/// Daily calorie target: BMR × activity factor, rounded to whole kcal
pub fn daily_calorie_target(
    weight_kg: f64,
    height_cm: f64,
    age_years: i32,
    gender: Gender,
    activity_factor: f64,
) -> i32 {
    let bmr = calculate_bmr_mifflin(weight_kg, height_cm, age_years, gender);
    (bmr * activity_factor).round() as i32
}
