//! API error handling.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Body of `/screenshot` and `/metadata` before the first capture.
pub const NO_SCREENSHOT: &str = "No screenshot available.";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Nothing has been captured yet.
    #[error("no screenshot available")]
    NoCaptureYet,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NoCaptureYet => (StatusCode::NOT_FOUND, NO_SCREENSHOT),
        };

        let body = ErrorResponse {
            error: message.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
