pub mod check;
pub mod config;
pub mod serve;
pub mod settings;
pub mod snap;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use livecap_capture_engine::{get_backend, CaptureBackend, SyntheticBackend};
use livecap_common::config::CaptureDefaults;
use livecap_platform_core::CaptureMode;

/// Capture options shared by `serve` and `snap`.
#[derive(Args, Debug, Clone, Default)]
pub struct CaptureArgs {
    /// Capture mode, e.g. full_screen, specific_monitor, "Specific Application"
    #[arg(long)]
    pub mode: Option<CaptureMode>,

    /// Window title, 1-based monitor index, game window or browser tab title
    #[arg(long)]
    pub target: Option<String>,

    /// Directory screenshots are written to
    #[arg(long)]
    pub directory: Option<PathBuf>,

    /// Keep every screenshot instead of overwriting one file
    #[arg(long)]
    pub no_reuse: bool,
}

impl CaptureArgs {
    /// Layer the command-line flags over the configured defaults. Choosing a
    /// mode drops the configured target, which belonged to the old mode.
    pub fn apply(&self, defaults: &CaptureDefaults) -> CaptureDefaults {
        let mut merged = defaults.clone();
        if let Some(mode) = self.mode {
            if mode != merged.mode {
                merged.target = None;
            }
            merged.mode = mode;
        }
        if let Some(target) = &self.target {
            merged.target = Some(target.clone());
        }
        if let Some(directory) = &self.directory {
            merged.directory = directory.clone();
        }
        if self.no_reuse {
            merged.reuse = false;
        }
        merged
    }
}

pub fn backend(synthetic: bool) -> Arc<dyn CaptureBackend> {
    if synthetic {
        Arc::new(SyntheticBackend::new())
    } else {
        get_backend()
    }
}
