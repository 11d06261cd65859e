use std::sync::Arc;

use image::RgbaImage;

use livecap_common::error::CaptureError;
use livecap_platform_core::{CaptureMode, MonitorInfo, WindowInfo};

/// Platform-specific pixel-capture primitives.
///
/// Every method is blocking; the scheduler calls them from the blocking
/// thread pool. Implementations never touch disk.
pub trait CaptureBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Whether the given mode can be captured on this platform.
    fn supports(&self, mode: CaptureMode) -> bool;

    /// Enumerate connected monitors, 1-based.
    fn monitors(&self) -> Result<Vec<MonitorInfo>, CaptureError>;

    /// Enumerate top-level windows.
    fn windows(&self) -> Result<Vec<WindowInfo>, CaptureError>;

    /// Grab the primary monitor (or the first one when none is primary).
    fn grab_primary(&self) -> Result<RgbaImage, CaptureError>;

    /// Grab a monitor by 1-based index.
    fn grab_monitor(&self, index: usize) -> Result<RgbaImage, CaptureError>;

    /// Grab the first non-minimized window whose title contains `title`.
    fn grab_window(&self, title: &str) -> Result<RgbaImage, CaptureError>;

    /// Grab a DirectX game window. Defaults to a regular window grab, which
    /// works wherever the platform composites game surfaces.
    fn grab_game(&self, title: &str) -> Result<RgbaImage, CaptureError> {
        self.grab_window(title)
    }
}

pub mod headless;
#[cfg(feature = "native")]
pub mod native;
pub mod synthetic;

pub use headless::HeadlessBackend;
#[cfg(feature = "native")]
pub use native::NativeBackend;
pub use synthetic::{ScriptStep, SyntheticBackend};

/// Get the backend for this build: xcap with the `native` feature, otherwise
/// a backend that reports every mode as unsupported.
pub fn get_backend() -> Arc<dyn CaptureBackend> {
    #[cfg(feature = "native")]
    {
        Arc::new(NativeBackend::new())
    }
    #[cfg(not(feature = "native"))]
    {
        Arc::new(HeadlessBackend)
    }
}
