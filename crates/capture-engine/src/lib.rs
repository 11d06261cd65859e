//! Livecap Capture Engine
//!
//! Periodically grabs screen content under one of five capture modes,
//! persists each frame, and keeps the latest one available to readers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 CaptureScheduler                 │
//! │   commands ─▶ Idle / Running / Stopping          │
//! │                     │ every interval             │
//! │                     ▼                            │
//! │  ┌─────────────────┐     ┌────────────────────┐  │
//! │  │ CaptureStrategy │ ──▶ │  CaptureBackend    │  │
//! │  │  (one per mode) │     │ (xcap / synthetic) │  │
//! │  └────────┬────────┘     └────────────────────┘  │
//! │           │ RawCapture (PNG)                     │
//! │           ▼                                      │
//! │  ┌─────────────────────────────────────────────┐ │
//! │  │ ScreenshotStore: persist, swap, broadcast   │ │
//! │  └─────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────┘
//!         ▲ current()                 ▲ subscribe()
//!     HTTP server                  consumers
//! ```

pub mod artifact;
pub mod backend;
pub mod config;
pub mod scheduler;
pub mod store;
pub mod strategy;

pub use artifact::{Published, RawCapture, ScreenshotArtifact};
pub use backend::{get_backend, CaptureBackend, HeadlessBackend, ScriptStep, SyntheticBackend};
pub use config::{CaptureConfig, CaptureTarget};
pub use scheduler::{CaptureScheduler, SchedulerState, SchedulerStats, StopOutcome};
pub use store::{PersistencePolicy, ScreenshotStore};
pub use strategy::CaptureStrategy;

#[cfg(feature = "native")]
pub use backend::NativeBackend;
