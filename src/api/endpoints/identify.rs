//! `POST /api/identify`: receives one pill photo as base64, runs the
//! identification pipeline on a blocking worker, and returns the result.

use axum::extract::State;
use axum::Json;
use base64::Engine;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, IdentifyResponse};

/// Maximum decoded image size.
pub const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct IdentifyRequest {
    /// Base64 data URL (e.g., `data:image/jpeg;base64,/9j/...`) or bare base64.
    #[serde(default)]
    pub image: Option<String>,
}

pub async fn identify(
    State(ctx): State<ApiContext>,
    Json(payload): Json<IdentifyRequest>,
) -> Result<Json<IdentifyResponse>, ApiError> {
    let image = match payload.image.as_deref().map(str::trim) {
        Some(data) if !data.is_empty() => Some(decode_image(data)?),
        _ => None,
    };

    if let Some(bytes) = &image {
        tracing::info!(
            bytes = bytes.len(),
            format = detect_format(bytes),
            "Identification requested"
        );
    }

    let identifier = ctx.identifier.clone();
    let result = tokio::task::spawn_blocking(move || identifier.identify(image.as_deref())).await?;

    Ok(Json(IdentifyResponse::from(&result)))
}

fn decode_image(data: &str) -> Result<Vec<u8>, ApiError> {
    let bytes = decode_data_url(data).map_err(ApiError::BadRequest)?;
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::PayloadTooLarge {
            size: bytes.len(),
            max: MAX_IMAGE_BYTES,
        });
    }
    Ok(bytes)
}

/// Decode a base64 data URL to raw bytes.
///
/// Handles both `data:image/jpeg;base64,...` and raw base64 strings.
fn decode_data_url(data_url: &str) -> Result<Vec<u8>, String> {
    let base64_data = match data_url.find(',') {
        Some(idx) => &data_url[idx + 1..],
        None => data_url,
    };

    base64::engine::general_purpose::STANDARD
        .decode(base64_data)
        .map_err(|e| format!("Base64 decode failed: {e}"))
}

/// Image format from magic bytes, for logging only.
fn detect_format(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "jpeg"
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        "png"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "webp"
    } else if bytes.len() >= 8 && &bytes[4..8] == b"ftyp" {
        "heic"
    } else {
        "unknown"
    }
}
