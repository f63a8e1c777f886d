//! Error types shared between the backend and clients

use thiserror::Error;

/// Rejection produced by boundary validation, naming the offending field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{label}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub label: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            label: crate::validation::get_field_display_label(field),
            message: message.into(),
        }
    }
}
