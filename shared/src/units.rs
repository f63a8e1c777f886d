//! Unit conversion and normalization module
//!
//! All measurements are stored in SI units (kg, cm). Clients may submit
//! other units; values are converted once at the API boundary, before
//! validation, and never inside ledger logic.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Weight Units
// ============================================================================

/// Weight unit accepted on input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
    Stone,
}

impl WeightUnit {
    /// Convert from this unit to kilograms
    pub fn to_kg(&self, value: f64) -> f64 {
        match self {
            WeightUnit::Kg => value,
            WeightUnit::Lbs => value * 0.453592,
            WeightUnit::Stone => value * 6.35029,
        }
    }

    /// Get the unit abbreviation
    pub fn abbreviation(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lbs => "lbs",
            WeightUnit::Stone => "st",
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

impl std::str::FromStr for WeightUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kg" | "kilogram" | "kilograms" => Ok(WeightUnit::Kg),
            "lbs" | "lb" | "pound" | "pounds" => Ok(WeightUnit::Lbs),
            "st" | "stone" | "stones" => Ok(WeightUnit::Stone),
            _ => Err(format!("Unknown weight unit: {}", s)),
        }
    }
}

// ============================================================================
// Height Units
// ============================================================================

/// Height unit accepted on input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HeightUnit {
    #[default]
    Cm,
    Meters,
    Inches,
}

impl HeightUnit {
    /// Convert from this unit to centimeters
    pub fn to_cm(&self, value: f64) -> f64 {
        match self {
            HeightUnit::Cm => value,
            HeightUnit::Meters => value * 100.0,
            HeightUnit::Inches => value * 2.54,
        }
    }

    /// Get the unit abbreviation
    pub fn abbreviation(&self) -> &'static str {
        match self {
            HeightUnit::Cm => "cm",
            HeightUnit::Meters => "m",
            HeightUnit::Inches => "in",
        }
    }
}

impl fmt::Display for HeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

impl std::str::FromStr for HeightUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cm" | "centimeter" | "centimeters" => Ok(HeightUnit::Cm),
            "m" | "meter" | "meters" => Ok(HeightUnit::Meters),
            "in" | "inch" | "inches" => Ok(HeightUnit::Inches),
            _ => Err(format!("Unknown height unit: {}", s)),
        }
    }
}

/// Round a stored quantity (kg or cm) to two decimal places
pub fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
