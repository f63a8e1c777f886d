//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories and external systems.

pub mod ledger;
pub mod nutrition;
pub mod profile;

pub use ledger::{MealInput, MeasurementLedger, MeasurementUpdate};
pub use nutrition::{DisabledEstimator, EstimateError, NutritionEstimator, OllamaEstimator};
pub use profile::{ProfileCommand, ProfileService};
