use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;

use super::types::{PillClassifier, Prediction};
use super::ClassifyError;
use crate::config::ClassifierConfig;
use crate::pipeline::http::join_url;

/// Object-detection prediction client (Custom Vision v3.0 REST).
pub struct CustomVisionClient {
    endpoint: String,
    prediction_key: String,
    project_id: String,
    model_name: String,
    client: reqwest::blocking::Client,
}

impl CustomVisionClient {
    pub fn new(config: &ClassifierConfig, client: reqwest::blocking::Client) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            prediction_key: config.prediction_key.clone(),
            project_id: config.project_id.clone(),
            model_name: config.model_name.clone(),
            client,
        }
    }

    fn detect_url(&self) -> String {
        join_url(
            &self.endpoint,
            &format!(
                "customvision/v3.0/Prediction/{}/detect/iterations/{}/image",
                self.project_id, self.model_name
            ),
        )
    }
}

/// Response body from the detect endpoint
#[derive(Deserialize)]
struct DetectResponse {
    #[serde(default)]
    predictions: Vec<DetectPrediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectPrediction {
    tag_name: String,
    probability: f64,
}

impl PillClassifier for CustomVisionClient {
    fn detect(&self, image: &[u8]) -> Result<Vec<Prediction>, ClassifyError> {
        let response = self
            .client
            .post(self.detect_url())
            .header("Prediction-Key", &self.prediction_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifyError::Unavailable("request timed out".into())
                } else {
                    ClassifyError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClassifyError::ServiceError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: DetectResponse = response
            .json()
            .map_err(|e| ClassifyError::ResponseParsing(e.to_string()))?;

        Ok(parsed
            .predictions
            .into_iter()
            .map(|p| Prediction {
                label: p.tag_name,
                probability: p.probability,
            })
            .collect())
    }
}

/// Mock classifier for testing: returns configured predictions and counts calls.
pub struct MockClassifier {
    predictions: Vec<Prediction>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockClassifier {
    pub fn new(predictions: Vec<Prediction>) -> Self {
        Self {
            predictions,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// A classifier whose service is always down.
    pub fn unavailable() -> Self {
        Self {
            predictions: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PillClassifier for MockClassifier {
    fn detect(&self, _image: &[u8]) -> Result<Vec<Prediction>, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ClassifyError::Unavailable("mock service down".into()));
        }
        Ok(self.predictions.clone())
    }
}
