//! Mode-specific capture dispatch.
//!
//! A [`CaptureStrategy`] is resolved once from a [`CaptureConfig`] when a
//! session starts, then invoked on every tick against the process backend.

use livecap_common::error::CaptureError;
use livecap_platform_core::CaptureMode;

use crate::artifact::RawCapture;
use crate::backend::CaptureBackend;
use crate::config::{CaptureConfig, CaptureTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStrategy {
    FullScreen,
    SpecificApplication { title: String },
    SpecificMonitor { index: usize },
    DirectxGame { title: String },
    SpecificBrowserTab { title: String },
}

impl CaptureStrategy {
    pub fn for_config(config: &CaptureConfig) -> Self {
        let title = || match config.target() {
            Some(CaptureTarget::Window(title)) => title.clone(),
            _ => String::new(),
        };
        match config.mode() {
            CaptureMode::FullScreen => CaptureStrategy::FullScreen,
            CaptureMode::SpecificApplication => {
                CaptureStrategy::SpecificApplication { title: title() }
            }
            CaptureMode::SpecificMonitor => CaptureStrategy::SpecificMonitor {
                index: match config.target() {
                    Some(CaptureTarget::Monitor(index)) => *index,
                    _ => 1,
                },
            },
            CaptureMode::DirectxGame => CaptureStrategy::DirectxGame { title: title() },
            CaptureMode::SpecificBrowserTab => {
                CaptureStrategy::SpecificBrowserTab { title: title() }
            }
        }
    }

    pub fn mode(&self) -> CaptureMode {
        match self {
            CaptureStrategy::FullScreen => CaptureMode::FullScreen,
            CaptureStrategy::SpecificApplication { .. } => CaptureMode::SpecificApplication,
            CaptureStrategy::SpecificMonitor { .. } => CaptureMode::SpecificMonitor,
            CaptureStrategy::DirectxGame { .. } => CaptureMode::DirectxGame,
            CaptureStrategy::SpecificBrowserTab { .. } => CaptureMode::SpecificBrowserTab,
        }
    }

    /// Fail fast with [`CaptureError::UnsupportedMode`] when the backend
    /// cannot serve this strategy at all.
    pub fn check_support(&self, backend: &dyn CaptureBackend) -> Result<(), CaptureError> {
        if backend.supports(self.mode()) {
            Ok(())
        } else {
            Err(CaptureError::unsupported(self.mode()))
        }
    }

    /// Grab one frame. Never writes to disk.
    pub fn capture(&self, backend: &dyn CaptureBackend) -> Result<RawCapture, CaptureError> {
        let frame = match self {
            CaptureStrategy::FullScreen => backend.grab_primary()?,
            CaptureStrategy::SpecificMonitor { index } => backend.grab_monitor(*index)?,
            CaptureStrategy::SpecificApplication { title }
            | CaptureStrategy::SpecificBrowserTab { title } => backend.grab_window(title)?,
            CaptureStrategy::DirectxGame { title } => backend.grab_game(title)?,
        };
        if frame.width() == 0 || frame.height() == 0 {
            return Err(CaptureError::failed(format!(
                "{} returned an empty frame",
                self.mode()
            )));
        }
        RawCapture::encode(&frame)
    }
}

impl std::fmt::Display for CaptureStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureStrategy::FullScreen => write!(f, "Full Screen"),
            CaptureStrategy::SpecificMonitor { index } => write!(f, "Specific Monitor {index}"),
            CaptureStrategy::SpecificApplication { title }
            | CaptureStrategy::DirectxGame { title }
            | CaptureStrategy::SpecificBrowserTab { title } => {
                write!(f, "{} '{title}'", self.mode())
            }
        }
    }
}
