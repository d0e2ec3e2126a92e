//! Pairwise concurrent-use ("taboo") resolution.
//!
//! One concurrent-use lookup per distinct identifier builds an index of what
//! each product is flagged against; every ordered pair of requested
//! identifiers is then checked against that index.

use std::collections::{HashMap, HashSet};

use crate::models::enums::{EdgePolicy, ListKind};
use crate::models::result::InteractionEdge;
use crate::pipeline::lookup::Lookup;
use crate::pipeline::registry::RegistryClient;

/// Identifier → identifiers it must not be taken with. Lives for one resolution.
pub type InteractionIndex = HashMap<String, HashSet<String>>;

/// Resolves contraindicated pairs among a set of registry identifiers.
pub struct InteractionResolver<'a> {
    registry: &'a dyn RegistryClient,
    policy: EdgePolicy,
}

impl<'a> InteractionResolver<'a> {
    pub fn new(registry: &'a dyn RegistryClient, policy: EdgePolicy) -> Self {
        Self { registry, policy }
    }

    /// Build the flagged-against index, one lookup per distinct identifier.
    ///
    /// A failed lookup leaves that identifier with an empty set.
    pub fn build_index(&self, ids: &[String]) -> InteractionIndex {
        let mut index = InteractionIndex::new();
        for id in ids {
            if index.contains_key(id) {
                continue;
            }
            let against: HashSet<String> =
                match self.registry.lookup_interaction_list(id, ListKind::ConcurrentUse) {
                    Lookup::Found(records) => records
                        .iter()
                        .filter_map(|r| r.counterpart_item_seq())
                        .collect(),
                    Lookup::Empty => HashSet::new(),
                    Lookup::Unavailable(reason) => {
                        tracing::warn!(
                            item_seq = %id,
                            reason = %reason,
                            "Concurrent-use list unavailable, treating as no interactions"
                        );
                        HashSet::new()
                    }
                };
            index.insert(id.clone(), against);
        }
        index
    }

    /// All flagged pairs among `ids`, in iteration order of `ids`.
    pub fn resolve(&self, ids: &[String]) -> Vec<InteractionEdge> {
        if ids.is_empty() {
            return Vec::new();
        }
        let index = self.build_index(ids);
        let edges = pair_edges(ids, &index);
        let edges = match self.policy {
            EdgePolicy::AsReported => edges,
            EdgePolicy::Canonical => canonicalize(edges),
        };
        tracing::debug!(ids = ids.len(), edges = edges.len(), "Interaction resolution done");
        edges
    }
}

/// Emit `(a, b)` for every ordered pair with `a != b` and `b` flagged by `a`.
pub fn pair_edges(ids: &[String], index: &InteractionIndex) -> Vec<InteractionEdge> {
    let mut edges = Vec::new();
    for first in ids {
        let Some(against) = index.get(first) else {
            continue;
        };
        for second in ids {
            if first == second {
                continue;
            }
            if against.contains(second) {
                edges.push(InteractionEdge::new(first, second));
            }
        }
    }
    edges
}

/// Smaller identifier first; each unordered pair kept once, at its first position.
fn canonicalize(edges: Vec<InteractionEdge>) -> Vec<InteractionEdge> {
    let mut seen = HashSet::new();
    edges
        .into_iter()
        .map(|e| {
            if e.first <= e.second {
                e
            } else {
                InteractionEdge::new(&e.second, &e.first)
            }
        })
        .filter(|e| seen.insert(e.clone()))
        .collect()
}
