pub mod cautions;
pub mod classify;
pub mod detail;
pub mod http;
pub mod interaction;
pub mod lookup;
pub mod orchestrator; // classify → identifiers → details → interactions
pub mod registry;

pub use lookup::Lookup;
pub use orchestrator::{PillIdentifier, PipelineSettings, PipelineStage};

use thiserror::Error;

/// Failures while wiring the pipeline. Runs themselves never fail.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Detail scraper setup failed: {0}")]
    Detail(#[from] detail::DetailError),
}
