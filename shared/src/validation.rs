//! Input validation functions
//!
//! Every client-supplied number or string passes through one of these
//! before it can reach the ledger. Each returns a human-readable reason on
//! rejection; callers attach the field label.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use validator::ValidateUrl;

/// Upper bound on a single weight entry (kg)
pub const MAX_WEIGHT_KG: f64 = 500.0;
/// Upper bound on a single meal (kcal)
pub const MAX_MEAL_CALORIES: f64 = 50_000.0;
/// Longest accepted food name
pub const MAX_FOOD_NAME_LEN: usize = 200;
/// Largest macronutrient amount accepted for one meal, in grams
pub const MAX_MACRO_GRAMS: f64 = 10_000.0;
/// Accepted range for a raw activity multiplier
pub const ACTIVITY_FACTOR_RANGE: (f64, f64) = (1.0, 2.5);

static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ().-]{5,19}$").expect("phone pattern compiles"));

/// Validate weight value (in kg): finite, positive, plausible
pub fn validate_weight(weight_kg: f64) -> Result<(), String> {
    if weight_kg.is_nan() || weight_kg.is_infinite() {
        return Err("Weight must be a valid number".to_string());
    }
    if weight_kg <= 0.0 {
        return Err("Weight must be greater than 0 kg".to_string());
    }
    if weight_kg > MAX_WEIGHT_KG {
        return Err(format!("Weight must be at most {} kg", MAX_WEIGHT_KG));
    }
    Ok(())
}

/// Validate height value (in cm)
/// Valid range: 50-300 cm (covers infants to tallest recorded humans)
pub fn validate_height_cm(height_cm: f64) -> Result<(), String> {
    if height_cm.is_nan() || height_cm.is_infinite() {
        return Err("Height must be a valid number".to_string());
    }
    if height_cm < 50.0 {
        return Err("Height must be at least 50 cm".to_string());
    }
    if height_cm > 300.0 {
        return Err("Height must be at most 300 cm".to_string());
    }
    Ok(())
}

/// Validate meal calories: finite and strictly positive
pub fn validate_calories(calories: f64) -> Result<(), String> {
    if calories.is_nan() || calories.is_infinite() {
        return Err("Calories must be a valid number".to_string());
    }
    if calories <= 0.0 {
        return Err("Calories must be greater than 0".to_string());
    }
    if calories > MAX_MEAL_CALORIES {
        return Err("Calorie value unreasonably high".to_string());
    }
    Ok(())
}

/// Validate a macronutrient amount in grams
pub fn validate_macro_grams(grams: f64) -> Result<(), String> {
    if grams.is_nan() || grams.is_infinite() {
        return Err("Amount must be a valid number".to_string());
    }
    if grams < 0.0 {
        return Err("Amount cannot be negative".to_string());
    }
    if grams > MAX_MACRO_GRAMS {
        return Err(format!("Amount must be at most {} g", MAX_MACRO_GRAMS));
    }
    Ok(())
}

/// Validate a food name; returns the trimmed name
pub fn validate_food_name(name: &str) -> Result<String, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Food name cannot be empty".to_string());
    }
    if trimmed.chars().count() > MAX_FOOD_NAME_LEN {
        return Err(format!(
            "Food name must be at most {} characters",
            MAX_FOOD_NAME_LEN
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate a raw activity multiplier
pub fn validate_activity_factor(factor: f64) -> Result<(), String> {
    let (min, max) = ACTIVITY_FACTOR_RANGE;
    if factor.is_nan() || factor.is_infinite() || factor < min || factor > max {
        return Err(format!("Activity factor must be between {} and {}", min, max));
    }
    Ok(())
}

/// Validate date of birth against `today`
/// Must not be in the future, and age must not exceed 150 years
pub fn validate_date_of_birth(dob: NaiveDate, today: NaiveDate) -> Result<(), String> {
    if dob > today {
        return Err("Date of birth cannot be in the future".to_string());
    }

    match today.years_since(dob) {
        Some(age) if age > 150 => Err("Age cannot exceed 150 years".to_string()),
        Some(_) => Ok(()),
        None => Err("Invalid date of birth".to_string()),
    }
}

/// Validate a display name; returns the trimmed name
pub fn validate_name(name: &str) -> Result<String, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    if trimmed.chars().count() > 100 {
        return Err("Name must be at most 100 characters".to_string());
    }
    Ok(trimmed.to_string())
}

/// Validate phone number format
pub fn validate_phone(phone: &str) -> Result<(), String> {
    if PHONE_REGEX.is_match(phone.trim()) {
        Ok(())
    } else {
        Err("Invalid phone number format".to_string())
    }
}

/// Validate profile image URL
pub fn validate_image_url(url: &str) -> Result<(), String> {
    if url.validate_url() {
        Ok(())
    } else {
        Err("Invalid image URL".to_string())
    }
}

// ============================================================================
// User-Friendly Field Labels
// ============================================================================

/// Map technical field names to user-friendly display labels
pub fn get_field_display_label(field_name: &str) -> &'static str {
    match field_name {
        "weight" => "Current Weight",
        "height" | "height_cm" => "Height",
        "gender" => "Gender",
        "activity_level" => "Activity Level",
        "birthday" | "date_of_birth" => "Date of Birth",
        "name" => "Name",
        "phone" => "Phone Number",
        "image_url" => "Profile Image",
        "food" | "food_name" => "Food",
        "calories" => "Calories",
        "protein_g" => "Protein",
        "carbs_g" => "Carbohydrates",
        "fat_g" => "Fat",
        "unit" | "weight_unit" => "Weight Unit",
        "height_unit" => "Height Unit",
        _ => "Value",
    }
}
