//! Application error handling
//!
//! `LedgerError` is the domain taxonomy returned by the ledger and profile
//! services. `ApiError` is the HTTP boundary: it wraps ledger errors and
//! the few failures that only exist at the edge, and renders them as
//! `{"error": {"code", "message", "field"?}}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fitness_tracker_shared::{ErrorDetail, ErrorResponse, FieldError};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

/// Failures of the measurement ledger and the services built on it
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(FieldError),

    #[error("Invalid meal: {0}")]
    InvalidMeal(FieldError),

    /// Storage or transport failure; the unit of work was rolled back
    #[error("Persistence error: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl LedgerError {
    pub fn invalid_measurement(field: &'static str, message: impl Into<String>) -> Self {
        LedgerError::InvalidMeasurement(FieldError::new(field, message))
    }

    pub fn invalid_meal(field: &'static str, message: impl Into<String>) -> Self {
        LedgerError::InvalidMeal(FieldError::new(field, message))
    }

    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::UserNotFound(_) => "user_not_found",
            LedgerError::InvalidMeasurement(_) => "invalid_measurement",
            LedgerError::InvalidMeal(_) => "invalid_meal",
            LedgerError::Persistence(_) => "persistence",
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Persistence(anyhow::Error::new(err))
    }
}

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The nutrition estimator failed or returned garbage
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Body was not valid JSON or did not match the request shape
    #[error(transparent)]
    InvalidBody(#[from] JsonRejection),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, field) = match self {
            ApiError::Ledger(LedgerError::UserNotFound(id)) => (
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                format!("No user with id {}", id),
                None,
            ),
            ApiError::Ledger(LedgerError::InvalidMeasurement(err)) => (
                StatusCode::BAD_REQUEST,
                "INVALID_MEASUREMENT",
                err.to_string(),
                Some(err.field),
            ),
            ApiError::Ledger(LedgerError::InvalidMeal(err)) => (
                StatusCode::BAD_REQUEST,
                "INVALID_MEAL",
                err.to_string(),
                Some(err.field),
            ),
            ApiError::Ledger(LedgerError::Persistence(err)) => {
                error!("Persistence error: {:?}", err);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "PERSISTENCE_ERROR",
                    "Storage is temporarily unavailable, please retry".to_string(),
                    None,
                )
            }
            ApiError::Upstream(msg) => {
                warn!("Upstream error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "Nutrition estimate is unavailable right now".to_string(),
                    None,
                )
            }
            ApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg, None)
            }
            ApiError::InvalidBody(rejection) => {
                (rejection.status(), "INVALID_REQUEST", rejection.body_text(), None)
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field: field.map(str::to_string),
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
