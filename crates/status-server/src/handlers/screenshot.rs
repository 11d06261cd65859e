//! Latest screenshot and its metadata.
//!
//! Each handler reads the store exactly once, so bytes, dimensions and
//! sequence number always come from the same artifact.

use axum::extract::State;
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use livecap_common::clock::display_timestamp;

use crate::error::ApiError;
use crate::AppState;

/// Sequence number of the served artifact.
pub const SEQUENCE_HEADER: &str = "x-capture-sequence";

#[derive(Debug, Serialize)]
pub struct MetadataResponse {
    /// Capture time, `YYYY-MM-DD HH:MM:SS.mmm` local time.
    pub timestamp: String,
    pub width: u32,
    pub height: u32,
    /// `WIDTHxHEIGHT`.
    pub dimensions: String,
    pub sequence: u64,
}

/// GET /screenshot
///
/// Any query string (the viewer adds `?timestamp=` for cache busting) is
/// ignored.
pub async fn get_screenshot(State(state): State<AppState>) -> Result<Response, ApiError> {
    let published = state.store.current().ok_or_else(|| {
        tracing::debug!("Screenshot requested before the first capture");
        ApiError::NoCaptureYet
    })?;

    tracing::debug!(sequence = published.sequence, "Screenshot requested");
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
        (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        (
            HeaderName::from_static(SEQUENCE_HEADER),
            HeaderValue::from(published.sequence),
        ),
    ];
    Ok((headers, published.artifact.bytes.clone()).into_response())
}

/// GET /metadata
pub async fn get_metadata(
    State(state): State<AppState>,
) -> Result<Json<MetadataResponse>, ApiError> {
    let published = state.store.current().ok_or(ApiError::NoCaptureYet)?;
    let artifact = &published.artifact;

    tracing::debug!(sequence = published.sequence, "Metadata requested");
    Ok(Json(MetadataResponse {
        timestamp: display_timestamp(&artifact.captured_at),
        width: artifact.width,
        height: artifact.height,
        dimensions: artifact.dimensions(),
        sequence: published.sequence,
    }))
}
