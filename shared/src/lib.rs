//! Fitness Tracker Shared Library
//!
//! This crate contains the I/O-free pieces of the tracker: the derived
//! metrics calculator, domain models, API types, unit conversion and input
//! validation. The backend depends on it; so can any future client.

pub mod errors;
pub mod health_metrics;
pub mod models;
pub mod types;
pub mod units;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use health_metrics::*;
pub use models::*;
pub use types::*;
pub use units::*;
