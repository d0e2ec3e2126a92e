//! Shared types for the API layer.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::models::drug::AttributeValue;
use crate::models::result::{InteractionEdge, RequestResult};
use crate::pipeline::PillIdentifier;
use crate::render::render_markdown;

/// Shared context for all API routes.
///
/// The identifier holds blocking HTTP clients; whoever builds it must keep
/// one handle alive outside the async runtime so the final drop happens there.
#[derive(Clone)]
pub struct ApiContext {
    pub identifier: Arc<PillIdentifier>,
}

impl ApiContext {
    pub fn new(identifier: Arc<PillIdentifier>) -> Self {
        Self { identifier }
    }
}

/// Body of a successful `POST /api/identify`.
#[derive(Debug, Serialize)]
pub struct IdentifyResponse {
    /// Registry identifier → attributes, in collection order.
    pub pills: IndexMap<String, IndexMap<String, AttributeValue>>,
    /// Display names of every contraindicated pair.
    pub taboo: Vec<(String, String)>,
    pub edges: Vec<InteractionEdge>,
    /// Markdown report of the same result.
    pub report: String,
}

impl From<&RequestResult> for IdentifyResponse {
    fn from(result: &RequestResult) -> Self {
        Self {
            pills: result
                .records()
                .iter()
                .map(|(id, record)| (id.clone(), record.attributes().clone()))
                .collect(),
            taboo: result.taboo_names(),
            edges: result.edges().to_vec(),
            report: render_markdown(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::drug::DrugRecord;

    #[test]
    fn response_flattens_records_to_attributes() {
        let mut records = IndexMap::new();
        records.insert("A".to_string(), DrugRecord::builder("A", "에이정").build());
        records.insert("B".to_string(), DrugRecord::builder("B", "비정").build());
        let result = RequestResult::new(records, vec![InteractionEdge::new("A", "B")]);

        let json = serde_json::to_value(IdentifyResponse::from(&result)).unwrap();
        assert_eq!(json["pills"]["A"]["약이름"], "에이정");
        assert_eq!(json["taboo"][0][0], "에이정");
        assert_eq!(json["taboo"][0][1], "비정");
        assert_eq!(json["edges"][0]["first"], "A");
        assert!(json["report"].as_str().unwrap().contains("에이정 - 비정"));
    }

    #[test]
    fn empty_result_serializes_empty_collections() {
        let json = serde_json::to_value(IdentifyResponse::from(&RequestResult::default())).unwrap();
        assert_eq!(json["pills"], serde_json::json!({}));
        assert_eq!(json["taboo"], serde_json::json!([]));
        assert_eq!(json["edges"], serde_json::json!([]));
    }
}
