use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// `running` while a capture session is active (or stopping), else `idle`.
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// GET /status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let scheduler_state = state.scheduler.state();
    tracing::debug!(state = %scheduler_state, "Status requested");
    Json(StatusResponse {
        status: scheduler_state.as_status(),
    })
}

/// POST /shutdown
///
/// Only signals the host; capture is stopped and connections drained after
/// this response is sent.
pub async fn shutdown(State(state): State<AppState>) -> Json<MessageResponse> {
    tracing::info!("Shutdown requested over HTTP");
    state.shutdown.trigger();
    Json(MessageResponse {
        message: "Server shutting down...",
    })
}
