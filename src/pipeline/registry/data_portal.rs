use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::types::{parse_envelope, DurRecord, RegistryClient, DEFAULT_PAGE, DUR_PAGE_SIZE};
use super::RegistryError;
use crate::config::RegistryConfig;
use crate::models::enums::ListKind;
use crate::pipeline::http::join_url;
use crate::pipeline::lookup::Lookup;

/// Open-data portal client for product permits and DUR lists.
pub struct DataPortalClient {
    item_lookup_url: String,
    item_lookup_key: String,
    dur_base_url: String,
    dur_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl DataPortalClient {
    pub fn new(config: &RegistryConfig, client: reqwest::blocking::Client, timeout_secs: u64) -> Self {
        Self {
            item_lookup_url: config.item_lookup_url.clone(),
            item_lookup_key: config.item_lookup_key.clone(),
            dur_base_url: config.dur_base_url.trim_end_matches('/').to_string(),
            dur_key: config.dur_key.clone(),
            client,
            timeout_secs,
        }
    }

    fn fetch(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<DurRecord>, RegistryError> {
        let response = self.client.get(url).query(query).send().map_err(|e| {
            if e.is_timeout() {
                RegistryError::Timeout(self.timeout_secs)
            } else {
                RegistryError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .map_err(|e| RegistryError::MalformedResponse(e.to_string()))?;
        parse_envelope(&body)
    }
}

impl RegistryClient for DataPortalClient {
    fn lookup_identifiers(&self, name: &str, page: u32, page_size: u32) -> Lookup<Vec<String>> {
        let query = [
            ("serviceKey", self.item_lookup_key.clone()),
            ("pageNo", page.to_string()),
            ("numOfRows", page_size.to_string()),
            ("item_name", name.to_string()),
            ("type", "json".to_string()),
        ];

        match self.fetch(&self.item_lookup_url, &query) {
            Ok(records) => match records.first() {
                None => Lookup::Empty,
                Some(first) => match first.item_seq() {
                    Some(seq) => Lookup::Found(vec![seq]),
                    None => {
                        tracing::warn!(name, "Registry match without ITEM_SEQ");
                        Lookup::Unavailable("first match has no ITEM_SEQ".into())
                    }
                },
            },
            Err(e) => {
                tracing::warn!(name, error = %e, "Identifier lookup failed");
                Lookup::Unavailable(e.to_string())
            }
        }
    }

    fn lookup_interaction_list(&self, item_seq: &str, kind: ListKind) -> Lookup<Vec<DurRecord>> {
        let url = join_url(&self.dur_base_url, kind.operation());
        let query = [
            ("serviceKey", self.dur_key.clone()),
            ("pageNo", DEFAULT_PAGE.to_string()),
            ("numOfRows", DUR_PAGE_SIZE.to_string()),
            ("itemSeq", item_seq.to_string()),
            ("type", "json".to_string()),
        ];

        match self.fetch(&url, &query) {
            Ok(records) => Lookup::from_items(records),
            Err(e) => {
                tracing::warn!(
                    item_seq,
                    list = kind.as_str(),
                    error = %e,
                    "DUR list lookup failed"
                );
                Lookup::Unavailable(e.to_string())
            }
        }
    }
}

/// In-memory registry for testing. Records every call it receives.
#[derive(Default)]
pub struct MockRegistry {
    identifiers: HashMap<String, Vec<String>>,
    lists: HashMap<(String, ListKind), Vec<DurRecord>>,
    down: HashSet<String>,
    calls: Mutex<Vec<RegistryCall>>,
}

/// A call observed by [`MockRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    Identifiers(String),
    List(String, ListKind),
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identifiers(mut self, name: &str, ids: &[&str]) -> Self {
        self.identifiers
            .insert(name.to_string(), ids.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_list(mut self, item_seq: &str, kind: ListKind, records: Vec<DurRecord>) -> Self {
        self.lists.insert((item_seq.to_string(), kind), records);
        self
    }

    /// Concurrent-use rows pointing at each of `counterparts`.
    pub fn with_taboo(self, item_seq: &str, counterparts: &[&str]) -> Self {
        let records = counterparts
            .iter()
            .map(|c| {
                let mut fields = serde_json::Map::new();
                fields.insert("ITEM_SEQ".into(), item_seq.into());
                fields.insert("MIXTURE_ITEM_SEQ".into(), (*c).into());
                DurRecord::new(fields)
            })
            .collect();
        self.with_list(item_seq, ListKind::ConcurrentUse, records)
    }

    /// Every lookup for this name or identifier reports the service as down.
    pub fn with_outage(mut self, key: &str) -> Self {
        self.down.insert(key.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RegistryCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: RegistryCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl RegistryClient for MockRegistry {
    fn lookup_identifiers(&self, name: &str, _page: u32, _page_size: u32) -> Lookup<Vec<String>> {
        self.record(RegistryCall::Identifiers(name.to_string()));
        if self.down.contains(name) {
            return Lookup::Unavailable("mock outage".into());
        }
        match self.identifiers.get(name).and_then(|ids| ids.first()) {
            Some(first) => Lookup::Found(vec![first.clone()]),
            None => Lookup::Empty,
        }
    }

    fn lookup_interaction_list(&self, item_seq: &str, kind: ListKind) -> Lookup<Vec<DurRecord>> {
        self.record(RegistryCall::List(item_seq.to_string(), kind));
        if self.down.contains(item_seq) {
            return Lookup::Unavailable("mock outage".into());
        }
        Lookup::from_items(
            self.lists
                .get(&(item_seq.to_string(), kind))
                .cloned()
                .unwrap_or_default(),
        )
    }
}
