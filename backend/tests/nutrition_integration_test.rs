//! Integration tests for meal logging, daily summaries and the dashboard

mod common;

use async_trait::async_trait;
use axum::http::StatusCode;
use common::{today, TestApp};
use fitness_tracker_backend::config::AiConfig;
use fitness_tracker_backend::services::{EstimateError, NutritionEstimator, OllamaEstimator};
use fitness_tracker_shared::types::NutritionEstimate;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Estimator returning a fixed answer for every food
struct FixedEstimator(NutritionEstimate);

#[async_trait]
impl NutritionEstimator for FixedEstimator {
    async fn estimate(&self, _: &str, _: Option<&str>) -> Result<NutritionEstimate, EstimateError> {
        Ok(self.0)
    }
}

fn banana() -> NutritionEstimate {
    NutritionEstimate {
        calories: 105.0,
        protein_g: 1.3,
        carbs_g: 27.0,
        fat_g: 0.4,
    }
}

#[tokio::test]
async fn test_meals_sum_into_daily_summary() {
    let app = TestApp::new();
    let user_id = app.create_user().await;

    for (food, calories) in [("Oatmeal", 350.0), ("Chicken salad", 520.0)] {
        let (status, _) = app
            .post_json(
                "/api/v1/fitness/calories",
                &json!({ "user_id": user_id, "food_name": food, "calories": calories }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .get_json(&format!("/api/v1/fitness/summary/{}", user_id))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], today().to_string());
    assert_eq!(body["total_calories"], 870.0);
    assert_eq!(body["meal_count"], 2);
}

#[tokio::test]
async fn test_summary_for_empty_day_is_zero() {
    let app = TestApp::new();
    let user_id = app.create_user().await;

    let (status, body) = app
        .get_json(&format!("/api/v1/fitness/summary/{}?date=2024-06-01", user_id))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_calories"], 0.0);
    assert_eq!(body["meal_count"], 0);
    assert!(body["current_measurement"].is_null());
}

#[tokio::test]
async fn test_meals_listed_by_day() {
    let app = TestApp::new();
    let user_id = app.create_user().await;

    app.post_json(
        "/api/v1/fitness/calories",
        &json!({ "user_id": user_id, "food": "Toast", "calories": 180, "date": "2024-06-14" }),
    )
    .await;
    app.post_json(
        "/api/v1/fitness/calories",
        &json!({ "user_id": user_id, "food": "Pasta", "calories": 640 }),
    )
    .await;

    let (status, body) = app
        .get_json(&format!("/api/v1/fitness/meals/{}?date=2024-06-14", user_id))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_calories"], 180.0);
    let meals = body["meals"].as_array().unwrap();
    assert_eq!(meals.len(), 1);
    assert_eq!(meals[0]["food_name"], "Toast");

    let (_, today_body) = app
        .get_json(&format!("/api/v1/fitness/meals/{}", user_id))
        .await;
    assert_eq!(today_body["total_calories"], 640.0);
}

#[tokio::test]
async fn test_non_positive_calories_rejected() {
    let app = TestApp::new();
    let user_id = app.create_user().await;

    for calories in [0.0, -1.0] {
        let (status, body) = app
            .post_json(
                "/api/v1/fitness/calories",
                &json!({ "user_id": user_id, "food_name": "Water", "calories": calories }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_MEAL");
        assert_eq!(body["error"]["field"], "calories");
    }

    let (status, body) = app
        .post_json(
            "/api/v1/fitness/calories",
            &json!({ "user_id": user_id, "food_name": "Mint", "calories": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["calories"], 1.0);
}

#[tokio::test]
async fn test_blank_food_name_rejected() {
    let app = TestApp::new();
    let user_id = app.create_user().await;

    let (status, body) = app
        .post_json(
            "/api/v1/fitness/calories",
            &json!({ "user_id": user_id, "food_name": "   ", "calories": 100 }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "food_name");
}

#[tokio::test]
async fn test_meal_for_unknown_user_is_404() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/api/v1/fitness/calories",
            &json!({ "user_id": Uuid::new_v4(), "food_name": "Apple", "calories": 95 }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn test_missing_calories_without_estimator() {
    let app = TestApp::new();
    let user_id = app.create_user().await;

    let (status, body) = app
        .post_json(
            "/api/v1/fitness/calories",
            &json!({ "user_id": user_id, "food_name": "Banana" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_MEAL");
    assert_eq!(body["error"]["field"], "calories");
}

#[tokio::test]
async fn test_missing_calories_filled_by_estimate() {
    let app = TestApp::with_estimator(Arc::new(FixedEstimator(banana())));
    let user_id = app.create_user().await;

    let (status, body) = app
        .post_json(
            "/api/v1/fitness/calories",
            &json!({ "user_id": user_id, "food_name": "Banana", "quantity": "1 medium" }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["calories"], 105.0);
    assert_eq!(body["macros"]["carbs_g"], 27.0);
}

#[tokio::test]
async fn test_supplied_macros_win_over_estimate() {
    let app = TestApp::with_estimator(Arc::new(FixedEstimator(banana())));
    let user_id = app.create_user().await;

    let (status, body) = app
        .post_json(
            "/api/v1/fitness/calories",
            &json!({ "user_id": user_id, "food_name": "Banana", "protein_g": 2.0 }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["macros"]["protein_g"], 2.0);
    assert_eq!(body["macros"]["carbs_g"], 0.0);
}

#[tokio::test]
async fn test_estimate_endpoint() {
    let app = TestApp::with_estimator(Arc::new(FixedEstimator(banana())));

    let (status, body) = app
        .post_json(
            "/api/v1/fitness/calories/estimate",
            &json!({ "food_name": "Banana" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["calories"], 105.0);
    assert_eq!(body["protein_g"], 1.3);
}

#[tokio::test]
async fn test_estimate_endpoint_when_disabled() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/api/v1/fitness/calories/estimate",
            &json!({ "food_name": "Banana" }),
        )
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_estimate_rejects_non_physical_answer() {
    let mut bad = banana();
    bad.calories = -20.0;
    let app = TestApp::with_estimator(Arc::new(FixedEstimator(bad)));

    let (status, body) = app
        .post_json(
            "/api/v1/fitness/calories/estimate",
            &json!({ "food_name": "Banana" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "calories");
}

#[tokio::test]
async fn test_estimate_through_ollama() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": r#"{"calories": 210, "protein": 26, "carbs": 0, "fat": 11.5}"#
        })))
        .mount(&server)
        .await;

    let estimator = OllamaEstimator::new(&AiConfig {
        enabled: true,
        ollama_url: server.uri(),
        ..AiConfig::default()
    })
    .unwrap();
    let app = TestApp::with_estimator(Arc::new(estimator));

    let (status, body) = app
        .post_json(
            "/api/v1/fitness/calories/estimate",
            &json!({ "food_name": "Grilled salmon", "quantity": "150g" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["calories"], 210.0);
    assert_eq!(body["fat_g"], 11.5);
}

#[tokio::test]
async fn test_ollama_failure_is_502() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let estimator = OllamaEstimator::new(&AiConfig {
        enabled: true,
        ollama_url: server.uri(),
        ..AiConfig::default()
    })
    .unwrap();
    let app = TestApp::with_estimator(Arc::new(estimator));
    let user_id = app.create_user().await;

    let (status, body) = app
        .post_json(
            "/api/v1/fitness/calories",
            &json!({ "user_id": user_id, "food_name": "Salmon" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn test_blank_food_name_never_reaches_ollama() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let estimator = OllamaEstimator::new(&AiConfig {
        enabled: true,
        ollama_url: server.uri(),
        ..AiConfig::default()
    })
    .unwrap();
    let app = TestApp::with_estimator(Arc::new(estimator));
    let user_id = app.create_user().await;

    let (status, body) = app
        .post_json(
            "/api/v1/fitness/calories",
            &json!({ "user_id": user_id, "food_name": "  " }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_MEAL");
    assert_eq!(body["error"]["field"], "food_name");
    server.verify().await;
}

#[tokio::test]
async fn test_dashboard_combines_weight_and_calories() {
    let app = TestApp::new();
    let user_id = app.create_user().await;

    for (weight, day) in [(82.0, "2024-06-13"), (81.4, "2024-06-14"), (81.0, "2024-06-15")] {
        app.post_json(
            "/api/v1/fitness/weight",
            &json!({ "user_id": user_id, "weight": weight, "measured_on": day }),
        )
        .await;
    }
    for (calories, day) in [(1800, "2024-06-14"), (450, "2024-06-15"), (300, "2024-06-15")] {
        app.post_json(
            "/api/v1/fitness/calories",
            &json!({ "user_id": user_id, "food_name": "Meal", "calories": calories, "date": day }),
        )
        .await;
    }

    let (status, body) = app
        .get_json(&format!("/api/v1/dashboard/{}", user_id))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["calories_today"], 750.0);
    assert_eq!(body["current_measurement"]["weight_change_kg"], -1.0);

    let weights = body["weight_history"].as_array().unwrap();
    assert_eq!(weights.len(), 3);
    assert_eq!(weights[0]["date"], "2024-06-15");
    assert_eq!(weights[0]["value"], 81.0);

    let calories = body["calorie_history"].as_array().unwrap();
    assert_eq!(calories.len(), 2);
    assert_eq!(calories[0]["value"], 750.0);
    assert_eq!(calories[1]["value"], 1800.0);
}

#[tokio::test]
async fn test_dashboard_for_unknown_user_is_404() {
    let app = TestApp::new();

    let (status, _) = app
        .get_json(&format!("/api/v1/dashboard/{}", Uuid::new_v4()))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
