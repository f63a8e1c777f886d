//! HTTP surface of the tracker
//!
//! Health checks and metrics sit at the root; everything else is nested
//! under `/api/v1`.

use crate::state::AppState;
use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod fitness;
mod health;
mod profile;

pub use fitness::fitness_routes;
pub use profile::{dashboard_routes, profile_routes};

/// Build the router; the request timeout comes from `server.request_timeout_secs`
pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config().server.request_timeout_secs);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(health::metrics))
        .nest("/api/v1", api_routes())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API v1 routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { "Fitness Tracker API v1" }))
        .nest("/fitness", fitness::fitness_routes())
        .nest("/dashboard", profile::dashboard_routes())
        .nest("/profile", profile::profile_routes())
}
