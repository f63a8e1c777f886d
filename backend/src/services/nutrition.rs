//! Nutrition estimates from a local LLM
//!
//! An estimate is only a suggestion: it is checked with the same rules as
//! a number typed by the user before anything is logged.

use crate::config::AiConfig;
use crate::error::LedgerError;
use async_trait::async_trait;
use fitness_tracker_shared::validation::{validate_calories, validate_macro_grams};
use fitness_tracker_shared::{round_2dp, NutritionEstimate};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum EstimateError {
    #[error("nutrition estimates are disabled")]
    Disabled,

    #[error("estimator request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("estimator returned an unusable answer: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait NutritionEstimator: Send + Sync {
    async fn estimate(
        &self,
        food_name: &str,
        quantity: Option<&str>,
    ) -> Result<NutritionEstimate, EstimateError>;
}

/// Round an estimate for storage, then check it like user input
pub fn validate_estimate(estimate: NutritionEstimate) -> Result<NutritionEstimate, LedgerError> {
    let rounded = NutritionEstimate {
        calories: round_2dp(estimate.calories),
        protein_g: round_2dp(estimate.protein_g),
        carbs_g: round_2dp(estimate.carbs_g),
        fat_g: round_2dp(estimate.fat_g),
    };

    validate_calories(rounded.calories)
        .map_err(|e| LedgerError::invalid_measurement("calories", e))?;
    for (field, grams) in [
        ("protein_g", rounded.protein_g),
        ("carbs_g", rounded.carbs_g),
        ("fat_g", rounded.fat_g),
    ] {
        validate_macro_grams(grams).map_err(|e| LedgerError::invalid_measurement(field, e))?;
    }

    Ok(rounded)
}

/// Used when `ai.enabled = false`
pub struct DisabledEstimator;

#[async_trait]
impl NutritionEstimator for DisabledEstimator {
    async fn estimate(&self, _: &str, _: Option<&str>) -> Result<NutritionEstimate, EstimateError> {
        Err(EstimateError::Disabled)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    format: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Estimator backed by Ollama's `/api/generate`
pub struct OllamaEstimator {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaEstimator {
    pub fn new(config: &AiConfig) -> Result<Self, EstimateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn prompt(food_name: &str, quantity: Option<&str>) -> String {
        let portion = quantity.unwrap_or("one typical serving");
        format!(
            "Estimate the nutrition of {portion} of \"{food_name}\". Reply with JSON only: \
             {{\"calories\": number, \"protein_g\": number, \"carbs_g\": number, \"fat_g\": number}}"
        )
    }
}

#[async_trait]
impl NutritionEstimator for OllamaEstimator {
    async fn estimate(
        &self,
        food_name: &str,
        quantity: Option<&str>,
    ) -> Result<NutritionEstimate, EstimateError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: Self::prompt(food_name, quantity),
            stream: false,
            format: "json",
        };

        let reply: GenerateResponse = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(food = food_name, raw = %reply.response, "Nutrition estimate received");

        serde_json::from_str::<NutritionEstimate>(&reply.response)
            .map_err(|e| EstimateError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: String) -> AiConfig {
        AiConfig {
            enabled: true,
            ollama_url: url,
            model: "test-model".to_string(),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_ollama_estimate_parses_json_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({"model": "test-model", "stream": false, "format": "json"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "test-model",
                "response": "{\"calories\": 95, \"protein\": 0.5, \"carbs\": 25, \"fat\": 0.3}",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let estimator = OllamaEstimator::new(&config(server.uri())).unwrap();
        let estimate = estimator.estimate("apple", Some("1 medium")).await.unwrap();
        assert_eq!(estimate.calories, 95.0);
        assert_eq!(estimate.carbs_g, 25.0);
    }

    #[tokio::test]
    async fn test_ollama_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let estimator = OllamaEstimator::new(&config(server.uri())).unwrap();
        let err = estimator.estimate("apple", None).await.unwrap_err();
        assert!(matches!(err, EstimateError::Request(_)));
    }

    #[tokio::test]
    async fn test_ollama_non_json_answer_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "about a hundred calories",
                "done": true
            })))
            .mount(&server)
            .await;

        let estimator = OllamaEstimator::new(&config(server.uri())).unwrap();
        let err = estimator.estimate("apple", None).await.unwrap_err();
        assert!(matches!(err, EstimateError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_disabled_estimator() {
        let err = DisabledEstimator.estimate("apple", None).await.unwrap_err();
        assert!(matches!(err, EstimateError::Disabled));
    }

    #[test]
    fn test_validate_estimate_rejects_non_physical_values() {
        let bad = NutritionEstimate {
            calories: -50.0,
            protein_g: 1.0,
            carbs_g: 1.0,
            fat_g: 1.0,
        };
        assert!(matches!(
            validate_estimate(bad),
            Err(LedgerError::InvalidMeasurement(ref e)) if e.field == "calories"
        ));

        let bad_macro = NutritionEstimate {
            calories: 100.0,
            protein_g: f64::NAN,
            carbs_g: 1.0,
            fat_g: 1.0,
        };
        assert!(validate_estimate(bad_macro).is_err());
    }

    #[test]
    fn test_validate_estimate_rounds() {
        let estimate = NutritionEstimate {
            calories: 95.456,
            protein_g: 0.504,
            carbs_g: 25.0,
            fat_g: 0.3,
        };
        let checked = validate_estimate(estimate).unwrap();
        assert_eq!(checked.calories, 95.46);
        assert_eq!(checked.protein_g, 0.5);
    }

    #[test]
    fn test_validate_estimate_checks_rounded_values() {
        let tiny = NutritionEstimate {
            calories: 0.004,
            protein_g: 0.0,
            carbs_g: 0.0,
            fat_g: 0.0,
        };
        assert!(matches!(
            validate_estimate(tiny),
            Err(LedgerError::InvalidMeasurement(ref e)) if e.field == "calories"
        ));

        let smallest = NutritionEstimate { calories: 0.005, ..tiny };
        assert_eq!(validate_estimate(smallest).unwrap().calories, 0.01);

        let huge_macro = NutritionEstimate {
            calories: 100.0,
            fat_g: 1.0e6,
            ..tiny
        };
        assert!(matches!(
            validate_estimate(huge_macro),
            Err(LedgerError::InvalidMeasurement(ref e)) if e.field == "fat_g"
        ));
    }
}
