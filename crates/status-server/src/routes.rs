use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/screenshot", get(handlers::screenshot::get_screenshot))
        .route("/metadata", get(handlers::screenshot::get_metadata))
        .route("/status", get(handlers::control::get_status))
        .route("/viewer", get(handlers::viewer::get_viewer))
        .route("/shutdown", post(handlers::control::shutdown))
}
