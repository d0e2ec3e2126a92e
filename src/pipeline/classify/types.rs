use serde::{Deserialize, Serialize};

use super::ClassifyError;

/// Unit abbreviation used in classifier tags.
const UNIT_ABBREVIATION: &str = "mg";
/// Spelling the registry uses for the same unit in product names.
const UNIT_REGISTRY_SPELLING: &str = "밀리그램";

/// One tag detected in an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Probability in 0.0..=1.0 as reported by the service.
    pub probability: f64,
}

impl Prediction {
    pub fn new(label: &str, probability: f64) -> Self {
        Self {
            label: label.to_string(),
            probability,
        }
    }

    /// Probability as a percentage (0..100).
    pub fn confidence(&self) -> f64 {
        self.probability * 100.0
    }
}

/// Image classifier abstraction (allows mocking)
pub trait PillClassifier {
    fn detect(&self, image: &[u8]) -> Result<Vec<Prediction>, ClassifyError>;
}

/// Keep labels whose confidence is strictly greater than `threshold` percent.
pub fn filter_labels(predictions: &[Prediction], threshold: f64) -> Vec<String> {
    for p in predictions {
        tracing::debug!(label = %p.label, "{}: {:.2}%", p.label, p.confidence());
    }
    predictions
        .iter()
        .filter(|p| p.confidence() > threshold)
        .map(|p| p.label.clone())
        .collect()
}

/// Turn a classifier tag into a registry search term.
pub fn normalize_label(label: &str) -> String {
    label.replace(UNIT_ABBREVIATION, UNIT_REGISTRY_SPELLING)
}
