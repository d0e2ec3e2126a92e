use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RegistryError;
use crate::models::enums::ListKind;
use crate::pipeline::lookup::Lookup;

/// First result page.
pub const DEFAULT_PAGE: u32 = 1;
/// Rows requested when searching by product name.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Rows requested for every DUR list.
pub const DUR_PAGE_SIZE: u32 = 100;

/// One row of a DUR list, kept as the raw JSON object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurRecord(Map<String, Value>);

impl DurRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Field as text. Numbers are stringified; null and missing are `None`.
    pub fn field(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn item_seq(&self) -> Option<String> {
        self.field("ITEM_SEQ")
    }

    /// Ingredient name; the concurrent-use list calls it `INGR_KOR_NAME`.
    pub fn ingredient_name(&self) -> Option<String> {
        self.field("INGR_NAME")
            .or_else(|| self.field("INGR_KOR_NAME"))
    }

    pub fn prohibition(&self) -> Option<String> {
        self.field("PROHBT_CONTENT")
    }

    pub fn effect_name(&self) -> Option<String> {
        self.field("EFFECT_NAME")
    }

    /// Product the concurrent-use row is flagged against.
    pub fn counterpart_item_seq(&self) -> Option<String> {
        self.field("MIXTURE_ITEM_SEQ")
    }
}

/// Public drug registry abstraction (allows mocking)
///
/// Implementations never fail outright: transport and status problems are
/// reported as [`Lookup::Unavailable`].
pub trait RegistryClient {
    /// Registry identifiers for a product name. Only the first identifier of
    /// the requested page is returned.
    fn lookup_identifiers(&self, name: &str, page: u32, page_size: u32) -> Lookup<Vec<String>>;

    fn lookup_interaction_list(&self, item_seq: &str, kind: ListKind) -> Lookup<Vec<DurRecord>>;
}

#[derive(Deserialize)]
struct Envelope {
    body: Option<EnvelopeBody>,
}

#[derive(Deserialize)]
struct EnvelopeBody {
    #[serde(rename = "totalCount")]
    total_count: Option<Count>,
    items: Option<Vec<Map<String, Value>>>,
}

/// `totalCount` arrives as a number on most operations and as a string on some.
#[derive(Deserialize)]
#[serde(untagged)]
enum Count {
    Number(u64),
    Text(String),
}

impl Count {
    fn value(&self) -> Result<u64, RegistryError> {
        match self {
            Count::Number(n) => Ok(*n),
            Count::Text(s) => s.trim().parse().map_err(|_| {
                RegistryError::MalformedResponse(format!("totalCount is not a number: {s:?}"))
            }),
        }
    }
}

/// Parse the `{ body: { totalCount, items } }` envelope.
///
/// A zero or absent total yields an empty list. A missing body (error
/// envelopes carry only a header), an unreadable total, or a positive total
/// without items is malformed.
pub fn parse_envelope(raw: &str) -> Result<Vec<DurRecord>, RegistryError> {
    let envelope: Envelope =
        serde_json::from_str(raw).map_err(|e| RegistryError::MalformedResponse(e.to_string()))?;
    let body = envelope
        .body
        .ok_or_else(|| RegistryError::MalformedResponse("response has no body".into()))?;
    let total = match &body.total_count {
        Some(count) => count.value()?,
        None => 0,
    };
    if total == 0 {
        return Ok(Vec::new());
    }
    let items = body.items.ok_or_else(|| {
        RegistryError::MalformedResponse(format!("totalCount is {total} but items are missing"))
    })?;
    Ok(items.into_iter().map(DurRecord::new).collect())
}
