pub mod custom_vision;
pub mod types;

pub use custom_vision::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Prediction service unavailable: {0}")]
    Unavailable(String),

    #[error("Prediction service returned error (status {status}): {body}")]
    ServiceError { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}
