//! Health check endpoints
//!
//! Provides Kubernetes-compatible health check endpoints:
//! - /health - Basic health check
//! - /health/ready - Readiness check (checks dependencies)
//! - /health/live - Liveness check (always returns OK if server is running)
//!
//! `/metrics` also lives here: it exposes the Prometheus text rendering of
//! the ledger counters when a recorder is installed.

use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
}

/// Individual health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub store: CheckStatus,
}

/// Status of an individual check
#[derive(Debug, Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
    })
}

/// Readiness check - checks if the service is ready to accept traffic
/// Returns 503 if any dependency is unhealthy
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let store_check = match state.store.health_check().await {
        Ok(_) => CheckStatus {
            status: "healthy".to_string(),
            message: None,
        },
        Err(e) => CheckStatus {
            status: "unhealthy".to_string(),
            message: Some(e.to_string()),
        },
    };

    let is_healthy = store_check.status == "healthy";

    let response = HealthResponse {
        status: if is_healthy { "ready" } else { "not_ready" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(HealthChecks { store: store_check }),
    };

    if is_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Liveness check - checks if the service is alive
/// Always returns OK if the server is running
pub async fn liveness_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
    })
}

/// Prometheus scrape endpoint
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::AppConfig;
    use crate::repositories::MemoryStore;
    use chrono::NaiveDate;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_health_check_returns_healthy() {
        let response = health_check().await;
        assert_eq!(response.status, "healthy");
        assert!(!response.version.is_empty());
    }

    #[tokio::test]
    async fn test_liveness_check_returns_alive() {
        let response = liveness_check().await;
        assert_eq!(response.status, "alive");
    }

    fn state_over(store: Arc<MemoryStore>) -> AppState {
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        AppState::with_store(store, Arc::new(clock), AppConfig::default())
    }

    #[tokio::test]
    async fn test_readiness_follows_store_health() {
        let store = Arc::new(MemoryStore::new());
        let state = state_over(store.clone());

        let ready = readiness_check(State(state.clone())).await.unwrap();
        assert_eq!(ready.status, "ready");

        store.set_unhealthy(true);
        let (status, body) = readiness_check(State(state)).await.unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "not_ready");
    }

    #[tokio::test]
    async fn test_metrics_without_recorder_is_404() {
        let state = state_over(Arc::new(MemoryStore::new()));
        let response = metrics(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
