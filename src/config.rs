use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::models::enums::{EdgePolicy, ListKind};

/// Application-level constants
pub const APP_NAME: &str = "moyak";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default confidence threshold (percent) for keeping a classifier label.
pub const DEFAULT_THRESHOLD: f64 = 50.0;

/// Default per-request timeout for every outbound HTTP call.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7860";

pub const DEFAULT_ITEM_LOOKUP_URL: &str =
    "https://apis.data.go.kr/1471000/DrugPrdtPrmsnInfoService06/getDrugPrdtPrmsnInq06";
pub const DEFAULT_DUR_BASE_URL: &str = "https://apis.data.go.kr/1471000/DURPrdlstInfoService03";
pub const DEFAULT_DETAIL_URL: &str =
    "https://nedrug.mfds.go.kr/pbp/CCBBB01/getItemDetailCache?cacheSeq=";

/// Caution lists attached to every drug record unless configured otherwise.
pub const DEFAULT_RECORD_LISTS: &[ListKind] = &[
    ListKind::Elderly,
    ListKind::Pregnancy,
    ListKind::SplitTablet,
    ListKind::AgeSpecific,
];

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,moyak_lib=debug,hyper=warn,reqwest=warn"
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Credentials for the image-classification prediction endpoint.
#[derive(Clone)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub prediction_key: String,
    pub project_id: String,
    pub model_name: String,
}

impl std::fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("endpoint", &self.endpoint)
            .field("prediction_key", &"<redacted>")
            .field("project_id", &self.project_id)
            .field("model_name", &self.model_name)
            .finish()
    }
}

/// Service keys and base URLs for the public drug registry.
#[derive(Clone)]
pub struct RegistryConfig {
    pub item_lookup_url: String,
    pub item_lookup_key: String,
    pub dur_base_url: String,
    pub dur_key: String,
    pub detail_url: String,
}

impl std::fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("item_lookup_url", &self.item_lookup_url)
            .field("item_lookup_key", &"<redacted>")
            .field("dur_base_url", &self.dur_base_url)
            .field("dur_key", &"<redacted>")
            .field("detail_url", &self.detail_url)
            .finish()
    }
}

/// Everything the pipeline needs, resolved once at process start.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub classifier: ClassifierConfig,
    pub registry: RegistryConfig,
    /// Labels must score strictly above this percentage.
    pub threshold: f64,
    pub http_timeout_secs: u64,
    pub bind_addr: SocketAddr,
    pub edge_policy: EdgePolicy,
    pub record_lists: Vec<ListKind>,
}

impl ServiceConfig {
    /// Load from `MOYAK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment, test map, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let classifier = ClassifierConfig {
            endpoint: require("MOYAK_PREDICTION_ENDPOINT")?,
            prediction_key: require("MOYAK_PREDICTION_KEY")?,
            project_id: require("MOYAK_PROJECT_ID")?,
            model_name: require("MOYAK_MODEL_NAME")?,
        };

        let item_lookup_key = require("MOYAK_REGISTRY_SERVICE_KEY")?;
        let registry = RegistryConfig {
            item_lookup_url: get("MOYAK_ITEM_LOOKUP_URL")
                .unwrap_or_else(|| DEFAULT_ITEM_LOOKUP_URL.to_string()),
            dur_key: get("MOYAK_DUR_SERVICE_KEY").unwrap_or_else(|| item_lookup_key.clone()),
            item_lookup_key,
            dur_base_url: get("MOYAK_DUR_BASE_URL")
                .unwrap_or_else(|| DEFAULT_DUR_BASE_URL.to_string()),
            detail_url: get("MOYAK_DETAIL_URL").unwrap_or_else(|| DEFAULT_DETAIL_URL.to_string()),
        };

        let threshold = match get("MOYAK_THRESHOLD") {
            Some(raw) => parse_threshold(&raw)?,
            None => DEFAULT_THRESHOLD,
        };

        let http_timeout_secs = match get("MOYAK_HTTP_TIMEOUT_SECS") {
            Some(raw) => parse_value("MOYAK_HTTP_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let bind_addr = parse_value(
            "MOYAK_BIND_ADDR",
            &get("MOYAK_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;

        let edge_policy = match get("MOYAK_EDGE_POLICY") {
            Some(raw) => parse_value("MOYAK_EDGE_POLICY", &raw)?,
            None => EdgePolicy::default(),
        };

        let record_lists = match get("MOYAK_RECORD_LISTS") {
            Some(raw) => parse_record_lists(&raw)?,
            None => DEFAULT_RECORD_LISTS.to_vec(),
        };

        Ok(Self {
            classifier,
            registry,
            threshold,
            http_timeout_secs,
            bind_addr,
            edge_policy,
            record_lists,
        })
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

fn parse_threshold(raw: &str) -> Result<f64, ConfigError> {
    let value: f64 = parse_value("MOYAK_THRESHOLD", raw)?;
    if !(0.0..=100.0).contains(&value) {
        return Err(ConfigError::Invalid {
            key: "MOYAK_THRESHOLD",
            value: raw.to_string(),
        });
    }
    Ok(value)
}

/// Comma-separated list kinds; lists that cannot be rendered per drug are rejected.
fn parse_record_lists(raw: &str) -> Result<Vec<ListKind>, ConfigError> {
    let mut kinds = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let kind: ListKind = parse_value("MOYAK_RECORD_LISTS", part)?;
        if kind.record_key().is_none() {
            return Err(ConfigError::Invalid {
                key: "MOYAK_RECORD_LISTS",
                value: part.to_string(),
            });
        }
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn required() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("MOYAK_PREDICTION_ENDPOINT", "https://vision.example.com"),
            ("MOYAK_PREDICTION_KEY", "pk-secret"),
            ("MOYAK_PROJECT_ID", "project-1"),
            ("MOYAK_MODEL_NAME", "pills-v3"),
            ("MOYAK_REGISTRY_SERVICE_KEY", "registry-secret"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<ServiceConfig, ConfigError> {
        ServiceConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_fill_optional_settings() {
        let config = load(&required()).unwrap();
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.edge_policy, EdgePolicy::AsReported);
        assert_eq!(config.record_lists, DEFAULT_RECORD_LISTS.to_vec());
        assert_eq!(config.registry.dur_base_url, DEFAULT_DUR_BASE_URL);
    }

    #[test]
    fn dur_key_falls_back_to_registry_key() {
        let config = load(&required()).unwrap();
        assert_eq!(config.registry.dur_key, "registry-secret");

        let mut vars = required();
        vars.insert("MOYAK_DUR_SERVICE_KEY", "dur-secret");
        let config = load(&vars).unwrap();
        assert_eq!(config.registry.dur_key, "dur-secret");
    }

    #[test]
    fn missing_credential_is_reported_by_name() {
        let mut vars = required();
        vars.remove("MOYAK_PREDICTION_KEY");
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("MOYAK_PREDICTION_KEY")));
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut vars = required();
        vars.insert("MOYAK_PROJECT_ID", "   ");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Missing("MOYAK_PROJECT_ID")
        ));
    }

    #[test]
    fn threshold_out_of_range_is_invalid() {
        let mut vars = required();
        vars.insert("MOYAK_THRESHOLD", "150");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid { key: "MOYAK_THRESHOLD", .. }
        ));

        vars.insert("MOYAK_THRESHOLD", "72.5");
        assert_eq!(load(&vars).unwrap().threshold, 72.5);
    }

    #[test]
    fn record_lists_parse_and_dedup() {
        let mut vars = required();
        vars.insert("MOYAK_RECORD_LISTS", "pregnancy, elderly,pregnancy,dosage_caution");
        let config = load(&vars).unwrap();
        assert_eq!(
            config.record_lists,
            vec![ListKind::Pregnancy, ListKind::Elderly, ListKind::DosageCaution]
        );
    }

    #[test]
    fn record_lists_reject_concurrent_use() {
        let mut vars = required();
        vars.insert("MOYAK_RECORD_LISTS", "elderly,concurrent_use");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid { key: "MOYAK_RECORD_LISTS", .. }
        ));
    }

    #[test]
    fn edge_policy_and_bind_addr_are_parsed() {
        let mut vars = required();
        vars.insert("MOYAK_EDGE_POLICY", "canonical");
        vars.insert("MOYAK_BIND_ADDR", "0.0.0.0:9000");
        let config = load(&vars).unwrap();
        assert_eq!(config.edge_policy, EdgePolicy::Canonical);
        assert_eq!(config.bind_addr.port(), 9000);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = load(&required()).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("pk-secret"));
        assert!(!debug.contains("registry-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn app_name_is_moyak() {
        assert_eq!(APP_NAME, "moyak");
    }
}
