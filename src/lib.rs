pub mod api;
pub mod config;
pub mod models;
pub mod pipeline; // classify → identifiers → details → interactions
pub mod render;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::api::{start_api_server_on, IdentifyResponse, ServerError};
use crate::config::{ConfigError, ServiceConfig};
use crate::pipeline::{PillIdentifier, PipelineError};

/// Fatal errors before or while starting the service.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline setup failed: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    #[error("Failed to start async runtime: {0}")]
    Runtime(std::io::Error),

    #[error("Failed to read image {path}: {source}")]
    ReadImage {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Initialize tracing. Logs go to stderr so reports on stdout stay clean.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Run the HTTP API until Ctrl-C.
///
/// `bind` overrides the configured listen address.
pub fn serve(bind: Option<SocketAddr>) -> Result<(), StartupError> {
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = ServiceConfig::from_env()?;
    tracing::debug!(?config, "Configuration loaded");
    let addr = bind.unwrap_or(config.bind_addr);

    // Built here and released here: the blocking HTTP clients inside must
    // never be dropped on a runtime thread.
    let identifier = Arc::new(PillIdentifier::from_config(&config)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)?;

    let outcome = runtime.block_on(async {
        let server = start_api_server_on(identifier.clone(), addr).await?;
        tracing::info!(addr = %server.session.server_addr, "Ready");

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
        }

        server.stop().await;
        Ok::<(), StartupError>(())
    });

    drop(runtime);
    drop(identifier);
    outcome
}

/// Identify the pills in one image file and return the report.
///
/// With `json` the API response body is returned instead of Markdown.
pub fn identify_file(path: &Path, json: bool) -> Result<String, StartupError> {
    let image = std::fs::read(path).map_err(|source| StartupError::ReadImage {
        path: path.to_path_buf(),
        source,
    })?;

    let config = ServiceConfig::from_env()?;
    let identifier = PillIdentifier::from_config(&config)?;
    let result = identifier.identify(Some(&image));

    if json {
        Ok(serde_json::to_string_pretty(&IdentifyResponse::from(&result))?)
    } else {
        Ok(render::render_markdown(&result))
    }
}
