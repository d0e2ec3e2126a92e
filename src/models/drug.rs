use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Canonical attribute keys, in the order they are usually collected.
pub const KEY_NAME: &str = "약이름";
pub const KEY_EFFICACY: &str = "효능";
pub const KEY_IMAGE: &str = "이미지";

/// Value of a single drug attribute. Caution lists hold several entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    List(Vec<String>),
}

impl AttributeValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::Text(_) => None,
            Self::List(items) => Some(items),
        }
    }
}

/// Everything collected about one registry product during a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugRecord {
    item_seq: String,
    name: String,
    attributes: IndexMap<String, AttributeValue>,
}

impl DrugRecord {
    pub fn item_seq(&self) -> &str {
        &self.item_seq
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &IndexMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn builder(item_seq: &str, name: &str) -> DrugRecordBuilder {
        DrugRecordBuilder::new(item_seq, name)
    }
}

/// Assembles a [`DrugRecord`]; the record itself has no mutating API.
#[derive(Debug)]
pub struct DrugRecordBuilder {
    record: DrugRecord,
}

impl DrugRecordBuilder {
    fn new(item_seq: &str, name: &str) -> Self {
        let mut attributes = IndexMap::new();
        attributes.insert(KEY_NAME.to_string(), AttributeValue::Text(name.to_string()));
        Self {
            record: DrugRecord {
                item_seq: item_seq.to_string(),
                name: name.to_string(),
                attributes,
            },
        }
    }

    /// Add a text attribute. The drug name key cannot be overwritten.
    pub fn text(mut self, key: &str, value: impl Into<String>) -> Self {
        if key != KEY_NAME {
            self.record
                .attributes
                .insert(key.to_string(), AttributeValue::Text(value.into()));
        }
        self
    }

    /// Add a list attribute; empty lists are skipped.
    pub fn list(mut self, key: &str, items: Vec<String>) -> Self {
        if key != KEY_NAME && !items.is_empty() {
            self.record
                .attributes
                .insert(key.to_string(), AttributeValue::List(items));
        }
        self
    }

    pub fn build(self) -> DrugRecord {
        self.record
    }
}
