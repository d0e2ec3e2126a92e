use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::drug::DrugRecord;

/// Two registry products flagged as not to be taken together.
///
/// The pair is materialized in the order the resolver met it; it carries no
/// direction of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InteractionEdge {
    pub first: String,
    pub second: String,
}

impl InteractionEdge {
    pub fn new(first: &str, second: &str) -> Self {
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestResult {
    records: IndexMap<String, DrugRecord>,
    edges: Vec<InteractionEdge>,
}

impl RequestResult {
    /// Build a result, dropping any edge whose ends were not collected.
    pub fn new(records: IndexMap<String, DrugRecord>, edges: Vec<InteractionEdge>) -> Self {
        let edges = edges
            .into_iter()
            .filter(|edge| {
                let known =
                    records.contains_key(&edge.first) && records.contains_key(&edge.second);
                if !known {
                    tracing::warn!(
                        first = %edge.first,
                        second = %edge.second,
                        "Dropping interaction edge for uncollected identifier"
                    );
                }
                known
            })
            .collect();
        Self { records, edges }
    }

    pub fn records(&self) -> &IndexMap<String, DrugRecord> {
        &self.records
    }

    pub fn edges(&self) -> &[InteractionEdge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.edges.is_empty()
    }

    /// Display names of both ends of every edge, in edge order.
    pub fn taboo_names(&self) -> Vec<(String, String)> {
        self.edges
            .iter()
            .filter_map(|edge| {
                let a = self.records.get(&edge.first)?;
                let b = self.records.get(&edge.second)?;
                Some((a.name().to_string(), b.name().to_string()))
            })
            .collect()
    }
}
