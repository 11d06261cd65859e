//! # livecap-status-server
//!
//! Axum HTTP surface over the screenshot store and the capture scheduler.
//!
//! ## Endpoints
//! - `GET /screenshot` latest PNG
//! - `GET /metadata` timestamp, dimensions and sequence of the latest PNG
//! - `GET /status` `running` or `idle`
//! - `GET /viewer` self-refreshing HTML page
//! - `POST /shutdown` stop capture, then stop serving
//!
//! No endpoint starts, stops or reconfigures capture.

pub mod error;
pub mod handlers;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use livecap_capture_engine::{CaptureScheduler, ScreenshotStore, StopOutcome};
use livecap_common::config::ServerConfig;
use livecap_common::error::{LivecapError, LivecapResult};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<CaptureScheduler>,
    pub store: Arc<ScreenshotStore>,
    pub shutdown: ShutdownHandle,
}

/// Requests a graceful shutdown of the server. Cloneable; triggering twice
/// is harmless.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, rx)
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

pub struct StatusServer {
    config: ServerConfig,
    state: AppState,
    shutdown_rx: watch::Receiver<bool>,
}

impl StatusServer {
    pub fn new(scheduler: Arc<CaptureScheduler>, config: ServerConfig) -> Self {
        let (shutdown, shutdown_rx) = ShutdownHandle::new();
        let store = Arc::clone(scheduler.store());
        Self {
            config,
            state: AppState {
                scheduler,
                store,
                shutdown,
            },
            shutdown_rx,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.state.shutdown.clone()
    }

    /// The full router, including request tracing.
    pub fn router(&self) -> Router {
        routes::routes()
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind the configured `host:port`.
    pub async fn bind(&self) -> LivecapResult<TcpListener> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        TcpListener::bind(&addr)
            .await
            .map_err(|e| LivecapError::server(format!("failed to bind {addr}: {e}")))
    }

    /// Bind and serve until shutdown is requested.
    pub async fn run(self) -> LivecapResult<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown is requested.
    ///
    /// On shutdown the scheduler is stopped first, bounded by the configured
    /// grace period, then in-flight requests are drained.
    pub async fn serve(self, listener: TcpListener) -> LivecapResult<()> {
        let local: Option<SocketAddr> = listener.local_addr().ok();
        let app = self.router();
        let scheduler = Arc::clone(&self.state.scheduler);
        let grace = grace_period(self.config.shutdown_grace_secs);
        let mut shutdown_rx = self.shutdown_rx;

        if let Some(addr) = local {
            info!("Status server listening on http://{addr}");
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                loop {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
                info!("Shutdown requested; stopping capture");
                match scheduler.stop_within(grace).await {
                    StopOutcome::TimedOut => warn!(
                        grace_secs = grace.as_secs_f64(),
                        "Capture still busy after the grace period; shutting down anyway"
                    ),
                    outcome => info!(?outcome, "Capture stopped"),
                }
            })
            .await
            .map_err(|e| LivecapError::server(e.to_string()))?;

        info!("Status server stopped");
        Ok(())
    }
}

fn grace_period(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}
