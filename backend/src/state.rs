//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! Everything is built once at startup and wrapped in `Arc`, so cloning
//! the state per request is a handful of reference-count bumps.

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::repositories::{LedgerStore, PgStore};
use crate::services::{
    DisabledEstimator, MeasurementLedger, NutritionEstimator, OllamaEstimator, ProfileService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::warn;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Persistence behind the ledger ports
    pub store: Arc<dyn LedgerStore>,
    /// Application configuration
    pub config: Arc<AppConfig>,
    pub ledger: Arc<MeasurementLedger>,
    pub profiles: Arc<ProfileService>,
    pub estimator: Arc<dyn NutritionEstimator>,
    /// Renders `/metrics`; absent when no recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Production state over a PostgreSQL pool and the system clock
    pub fn new(db: PgPool, config: AppConfig) -> Self {
        Self::with_store(Arc::new(PgStore::new(db)), Arc::new(SystemClock), config)
    }

    /// Wire the services over any store and clock
    pub fn with_store(
        store: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
        config: AppConfig,
    ) -> Self {
        let ledger = Arc::new(MeasurementLedger::new(
            store.clone(),
            clock.clone(),
            config.ledger.clone(),
        ));
        let profiles = Arc::new(ProfileService::new(store.clone(), ledger.clone(), clock));
        let estimator = build_estimator(&config);

        Self {
            store,
            config: Arc::new(config),
            ledger,
            profiles,
            estimator,
            metrics: None,
        }
    }

    /// Replace the nutrition estimator
    pub fn with_estimator(mut self, estimator: Arc<dyn NutritionEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Attach the Prometheus handle served at `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

fn build_estimator(config: &AppConfig) -> Arc<dyn NutritionEstimator> {
    if !config.ai.enabled {
        return Arc::new(DisabledEstimator);
    }
    match OllamaEstimator::new(&config.ai) {
        Ok(estimator) => Arc::new(estimator),
        Err(e) => {
            warn!(error = %e, "Could not build nutrition estimator, estimates disabled");
            Arc::new(DisabledEstimator)
        }
    }
}
