pub mod data_portal;
pub mod types;

pub use data_portal::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Registry connection failed: {0}")]
    Connection(String),

    #[error("Registry request timed out after {0}s")]
    Timeout(u64),

    #[error("Registry returned error (status {status})")]
    Status { status: u16 },

    #[error("Malformed registry response: {0}")]
    MalformedResponse(String),
}
