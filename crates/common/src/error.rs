//! Error types shared across livecap crates.

use std::path::PathBuf;

use livecap_platform_core::CaptureMode;

/// Failure of a single capture attempt.
///
/// Everything except [`CaptureError::UnsupportedMode`] is a per-tick
/// condition: the scheduler logs it, skips the tick and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("Capture target not found: {target}")]
    TargetNotFound { target: String },

    #[error("Screen capture permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Capture mode '{mode}' is not supported on this platform")]
    UnsupportedMode { mode: CaptureMode },

    #[error("Capture failed: {message}")]
    Failed { message: String },
}

impl CaptureError {
    pub fn target_not_found(target: impl Into<String>) -> Self {
        Self::TargetNotFound {
            target: target.into(),
        }
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: msg.into(),
        }
    }

    pub fn unsupported(mode: CaptureMode) -> Self {
        Self::UnsupportedMode { mode }
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed {
            message: msg.into(),
        }
    }

    /// Whether this error must stop the scheduler instead of skipping a tick.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnsupportedMode { .. })
    }
}

/// Top-level error type for livecap operations.
#[derive(Debug, thiserror::Error)]
pub enum LivecapError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Failed to persist screenshot to {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Capture is already running")]
    AlreadyRunning,

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Server error: {message}")]
    Server { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using LivecapError.
pub type LivecapResult<T> = Result<T, LivecapError>;

impl LivecapError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState {
            message: msg.into(),
        }
    }

    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server {
            message: msg.into(),
        }
    }

    /// Errors that end a capture session rather than a single tick.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Config { .. } => true,
            Self::Capture(e) => e.is_fatal(),
            _ => false,
        }
    }
}
