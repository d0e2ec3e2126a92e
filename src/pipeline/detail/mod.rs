//! Drug detail page scraping.
//!
//! The detail page is plain HTML; a handful of fields are pulled out by CSS
//! selector and anything that does not match is simply left out.

pub mod nedrug;

pub use nedrug::*;

use indexmap::IndexMap;
use thiserror::Error;

use super::lookup::Lookup;

/// Field name → extracted text, in extraction order.
pub type DetailFields = IndexMap<String, String>;

#[derive(Error, Debug)]
pub enum DetailError {
    #[error("Detail page request failed: {0}")]
    Request(String),

    #[error("Detail page returned status {0}")]
    Status(u16),

    #[error("Invalid selector {selector}: {reason}")]
    Selector { selector: String, reason: String },
}

/// Detail page abstraction (allows mocking)
pub trait DetailSource {
    fn fetch_detail(&self, item_seq: &str) -> Lookup<DetailFields>;
}
