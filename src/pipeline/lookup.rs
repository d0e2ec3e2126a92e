//! Outcome of a best-effort remote lookup.
//!
//! Every collaborator degrades to "nothing" on failure, but a confirmed
//! zero-match answer and a failed call are kept apart here so callers and
//! tests can tell which one happened.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Lookup<T> {
    /// The service answered with data.
    Found(T),
    /// The service answered and reported zero matches.
    Empty,
    /// The call failed (transport, status or body); reason is for logs only.
    Unavailable(String),
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(v) => Some(v),
            Self::Empty | Self::Unavailable(_) => None,
        }
    }
}

impl<T> Lookup<Vec<T>> {
    /// `Found` for a non-empty list, `Empty` otherwise.
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            Self::Empty
        } else {
            Self::Found(items)
        }
    }
}
