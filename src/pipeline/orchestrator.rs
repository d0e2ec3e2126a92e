use indexmap::IndexMap;
use uuid::Uuid;

use super::cautions::format_cautions;
use super::classify::{filter_labels, normalize_label, CustomVisionClient, PillClassifier};
use super::detail::{DetailSource, NedrugScraper};
use super::http::build_http_client;
use super::interaction::InteractionResolver;
use super::lookup::Lookup;
use super::registry::{DataPortalClient, RegistryClient, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use super::PipelineError;
use crate::config::{ServiceConfig, DEFAULT_RECORD_LISTS, DEFAULT_THRESHOLD};
use crate::models::drug::DrugRecord;
use crate::models::enums::{EdgePolicy, ListKind};
use crate::models::result::RequestResult;

/// Pipeline stages, in the only order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Classifying,
    NameNormalizing,
    IdentifierLookup,
    DetailFetch,
    InteractionResolution,
    Aggregated,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Classifying => "classifying",
            Self::NameNormalizing => "name_normalizing",
            Self::IdentifierLookup => "identifier_lookup",
            Self::DetailFetch => "detail_fetch",
            Self::InteractionResolution => "interaction_resolution",
            Self::Aggregated => "aggregated",
        }
    }
}

/// One span per pipeline run, tagged with a fresh request id.
fn run_span() -> tracing::Span {
    tracing::info_span!("identify", request_id = %Uuid::new_v4())
}

fn enter(stage: PipelineStage) {
    tracing::debug!(stage = stage.as_str(), "Pipeline stage");
}

/// Tunables that shape a run but involve no credentials.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub threshold: f64,
    pub edge_policy: EdgePolicy,
    pub record_lists: Vec<ListKind>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            edge_policy: EdgePolicy::default(),
            record_lists: DEFAULT_RECORD_LISTS.to_vec(),
        }
    }
}

impl From<&ServiceConfig> for PipelineSettings {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            threshold: config.threshold,
            edge_policy: config.edge_policy,
            record_lists: config.record_lists.clone(),
        }
    }
}

/// Orchestrates the full identification pipeline:
/// classify → normalize → identifier lookup → details → interactions → result
///
/// No stage aborts the run; a failed collaborator only makes the result smaller.
pub struct PillIdentifier {
    classifier: Box<dyn PillClassifier + Send + Sync>,
    registry: Box<dyn RegistryClient + Send + Sync>,
    details: Box<dyn DetailSource + Send + Sync>,
    settings: PipelineSettings,
}

impl PillIdentifier {
    pub fn new(
        classifier: Box<dyn PillClassifier + Send + Sync>,
        registry: Box<dyn RegistryClient + Send + Sync>,
        details: Box<dyn DetailSource + Send + Sync>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            classifier,
            registry,
            details,
            settings,
        }
    }

    /// Wire the real service adapters from configuration.
    ///
    /// Builds a blocking HTTP client; call outside of an async runtime.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, PipelineError> {
        let http = build_http_client(config.http_timeout_secs)?;
        let classifier = CustomVisionClient::new(&config.classifier, http.clone());
        let registry = DataPortalClient::new(&config.registry, http.clone(), config.http_timeout_secs);
        let details = NedrugScraper::new(&config.registry.detail_url, http)?;
        Ok(Self::new(
            Box::new(classifier),
            Box::new(registry),
            Box::new(details),
            PipelineSettings::from(config),
        ))
    }

    /// Run the whole pipeline on one photograph.
    ///
    /// No image (or an empty one) yields an empty result without any remote call.
    pub fn identify(&self, image: Option<&[u8]>) -> RequestResult {
        enter(PipelineStage::Idle);
        let Some(image) = image.filter(|bytes| !bytes.is_empty()) else {
            tracing::debug!("No image supplied, returning empty result");
            return RequestResult::default();
        };

        let _span = run_span().entered();

        enter(PipelineStage::Classifying);
        let labels = match self.classifier.detect(image) {
            Ok(predictions) => filter_labels(&predictions, self.settings.threshold),
            Err(e) => {
                tracing::warn!(error = %e, "Classification unavailable, continuing with no labels");
                Vec::new()
            }
        };
        tracing::info!(labels = labels.len(), "Classification done");

        enter(PipelineStage::NameNormalizing);
        let names: Vec<String> = labels.iter().map(|l| normalize_label(l)).collect();

        self.resolve_names(&names)
    }

    /// Run the pipeline from already-normalized registry search terms.
    pub fn identify_names(&self, names: &[String]) -> RequestResult {
        let _span = run_span().entered();
        self.resolve_names(names)
    }

    fn resolve_names(&self, names: &[String]) -> RequestResult {
        // One detection per bounding box: the same pill twice yields the same name twice.
        let mut unique: Vec<&String> = Vec::with_capacity(names.len());
        for name in names {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }

        enter(PipelineStage::IdentifierLookup);
        let mut resolved: Vec<(String, String)> = Vec::new();
        for name in unique {
            let ids = match self
                .registry
                .lookup_identifiers(name, DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
            {
                Lookup::Found(ids) => ids,
                Lookup::Empty => {
                    tracing::info!(name = %name, "No registry match");
                    Vec::new()
                }
                Lookup::Unavailable(reason) => {
                    tracing::warn!(name = %name, reason = %reason, "Registry lookup unavailable");
                    Vec::new()
                }
            };
            for item_seq in ids {
                if resolved.iter().any(|(_, seq)| *seq == item_seq) {
                    tracing::debug!(name = %name, item_seq = %item_seq, "Identifier already collected");
                    continue;
                }
                resolved.push((name.clone(), item_seq));
            }
        }

        enter(PipelineStage::DetailFetch);
        let records: IndexMap<String, DrugRecord> = resolved
            .iter()
            .map(|(name, item_seq)| (item_seq.clone(), self.collect_record(name, item_seq)))
            .collect();

        enter(PipelineStage::InteractionResolution);
        let ids: Vec<String> = records.keys().cloned().collect();
        let edges = InteractionResolver::new(self.registry.as_ref(), self.settings.edge_policy)
            .resolve(&ids);

        enter(PipelineStage::Aggregated);
        let result = RequestResult::new(records, edges);
        tracing::info!(
            drugs = result.records().len(),
            taboo_pairs = result.edges().len(),
            "Identification complete"
        );
        result
    }

    /// Detail page fields plus the configured caution lists for one product.
    fn collect_record(&self, name: &str, item_seq: &str) -> DrugRecord {
        let mut builder = DrugRecord::builder(item_seq, name);

        if let Lookup::Found(fields) = self.details.fetch_detail(item_seq) {
            for (key, value) in fields {
                builder = builder.text(&key, value);
            }
        }

        for kind in &self.settings.record_lists {
            let Some(key) = kind.record_key() else {
                continue;
            };
            if let Lookup::Found(rows) = self.registry.lookup_interaction_list(item_seq, *kind) {
                builder = builder.list(key, format_cautions(*kind, &rows));
            }
        }

        builder.build()
    }
}
