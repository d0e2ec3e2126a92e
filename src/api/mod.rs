//! HTTP API.
//!
//! A single identification endpoint plus a health check, nested under
//! `/api/`. Handlers never run the pipeline on the async runtime; each
//! request is handed to a blocking worker.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server_on, ApiServer, ApiSession, ServerError};
pub use types::{ApiContext, IdentifyResponse};
