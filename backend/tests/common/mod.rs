//! Common test utilities for integration tests
//!
//! The router runs over the in-memory store with a pinned clock, so these
//! suites need no database. Users are seeded straight into the store.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use fitness_tracker_backend::clock::FixedClock;
use fitness_tracker_backend::config::AppConfig;
use fitness_tracker_backend::repositories::{MemoryStore, UserStore};
use fitness_tracker_backend::services::NutritionEstimator;
use fitness_tracker_backend::{routes, state::AppState};
use fitness_tracker_shared::NewUser;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

/// Date every TestApp believes is today
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

/// Test application wrapper
#[derive(Clone)]
pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    /// Create a test application over a fresh in-memory store
    pub fn new() -> Self {
        Self::build(AppConfig::default(), None)
    }

    /// Create a test application with a custom nutrition estimator
    pub fn with_estimator(estimator: Arc<dyn NutritionEstimator>) -> Self {
        Self::build(AppConfig::default(), Some(estimator))
    }

    fn build(config: AppConfig, estimator: Option<Arc<dyn NutritionEstimator>>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let mut state =
            AppState::with_store(store.clone(), Arc::new(FixedClock::on(today())), config);
        if let Some(estimator) = estimator {
            state = state.with_estimator(estimator);
        }

        Self {
            app: routes::create_router(state),
            store,
        }
    }

    /// Seed a user with generated identity fields
    pub async fn create_user(&self) -> Uuid {
        self.create_user_born(None).await
    }

    pub async fn create_user_born(&self, birthday: Option<NaiveDate>) -> Uuid {
        self.store
            .create_user(NewUser {
                email: SafeEmail().fake(),
                name: Some(Name().fake()),
                birthday,
            })
            .await
            .expect("Failed to seed user")
            .id
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        self.send(request).await
    }

    /// Make a POST request with JSON body
    pub async fn post(&self, path: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    /// GET and parse the body as JSON
    pub async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let (status, body) = self.get(path).await;
        (status, parse(&body))
    }

    /// POST a JSON value and parse the body as JSON
    pub async fn post_json(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let (status, body) = self.post(path, &body.to_string()).await;
        (status, parse(&body))
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body_str = String::from_utf8(body.to_vec()).unwrap();

        (status, body_str)
    }
}

fn parse(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or(Value::Null)
}
