//! Database connection and pool management
//!
//! Pool construction, embedded migrations and the liveness check used by
//! `/health/ready`. Ledger commits take connections from this pool, so the
//! acquire timeout bounds how long a write waits before it fails as a
//! persistence error.

use crate::config::DatabaseConfig;
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Pool tuning
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 600,  // 10 minutes
            max_lifetime_secs: 1800, // 30 minutes
        }
    }
}

impl From<&DatabaseConfig> for PoolSettings {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.max_connections.min(1),
            ..Default::default()
        }
    }
}

/// Create a PostgreSQL connection pool from application config
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    create_pool_with_settings(&PoolSettings::from(config)).await
}

/// Create a PostgreSQL connection pool with explicit settings
pub async fn create_pool_with_settings(settings: &PoolSettings) -> Result<PgPool> {
    let connect_options = PgConnectOptions::from_str(&settings.url)
        .context("invalid database url")?
        .application_name("fitness-tracker");

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(settings.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(settings.max_lifetime_secs))
        .test_before_acquire(true)
        .connect_with(connect_options)
        .await?;

    info!(
        max = settings.max_connections,
        min = settings.min_connections,
        "Database pool created"
    );

    Ok(pool)
}

/// Run embedded migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed successfully");
    Ok(())
}

/// Check database health
pub async fn health_check(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| {
            warn!(error = %e, "Database health check failed");
            e.into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_database_config() {
        let config = DatabaseConfig {
            url: "postgres://localhost/fitness_tracker".to_string(),
            max_connections: 4,
        };
        let settings = PoolSettings::from(&config);
        assert_eq!(settings.max_connections, 4);
        assert_eq!(settings.min_connections, 1);
        assert_eq!(settings.acquire_timeout_secs, 5);
    }

    #[tokio::test]
    async fn test_create_pool_rejects_malformed_url() {
        let settings = PoolSettings {
            url: "not-a-database-url".to_string(),
            ..Default::default()
        };
        assert!(create_pool_with_settings(&settings).await.is_err());
    }
}
