//! Fitness Tracker Backend
//!
//! Weight, calorie and profile tracking over a measurement ledger.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! - Routes: HTTP request handling and routing
//! - Services: Measurement ledger, profile updates, nutrition estimates
//! - Repositories: Persistence ports with PostgreSQL and in-memory adapters
//! - Database: PostgreSQL with SQLx

use anyhow::Result;
use fitness_tracker_backend::clock::SystemClock;
use fitness_tracker_backend::repositories::MemoryStore;
use fitness_tracker_backend::{config, db, routes, state::AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// `database.url` value that selects the in-process store
const MEMORY_STORE_URL: &str = "memory://";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = config::AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() { "production" } else { "development" },
        "Starting Fitness Tracker Backend"
    );

    if config::AppConfig::is_production() {
        validate_production_config(&config)?;
    }

    let metrics_handle = PrometheusBuilder::new().install_recorder()?;
    let state = build_state(&config).await?.with_metrics(metrics_handle);

    if config.ai.enabled {
        info!(url = %config.ai.ollama_url, model = %config.ai.model, "Nutrition estimates enabled");
    }

    let app = routes::create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Select the store named by `database.url` and wire the services over it
async fn build_state(config: &config::AppConfig) -> Result<AppState> {
    if config.database.url == MEMORY_STORE_URL {
        warn!("Using in-memory store; data is lost on shutdown");
        return Ok(AppState::with_store(
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
            config.clone(),
        ));
    }

    info!(max_connections = config.database.max_connections, "Connecting to database");
    let pool = db::create_pool(&config.database).await?;

    // Production runs migrations as a separate deploy step
    if !config::AppConfig::is_production() {
        db::run_migrations(&pool).await?;
    }

    Ok(AppState::new(pool, config.clone()))
}

/// JSON logs in production, pretty logs otherwise
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "info,fitness_tracker_backend=info,tower_http=info".into()
        } else {
            "info,fitness_tracker_backend=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Refuse to start in production on development storage settings
fn validate_production_config(config: &config::AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    if config.database.url == MEMORY_STORE_URL {
        errors.push("The in-memory store cannot be used in production");
    }
    if config.database.url.contains("postgres:postgres@") {
        errors.push("Database credentials must not be the development defaults");
    }

    if config.database.url.contains("localhost") || config.database.url.contains("127.0.0.1") {
        warn!("Database URL contains localhost - ensure this is intentional for production");
    }

    if !errors.is_empty() {
        for err in &errors {
            error!("Configuration error: {}", err);
        }
        anyhow::bail!("Invalid production configuration");
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
