use image::RgbaImage;

use livecap_common::error::CaptureError;
use livecap_platform_core::{CaptureMode, MonitorInfo, WindowInfo};

use crate::backend::CaptureBackend;

/// Backend for builds without screen access. Every capture reports
/// [`CaptureError::UnsupportedMode`], so `start` fails up front.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessBackend;

impl CaptureBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn supports(&self, _mode: CaptureMode) -> bool {
        false
    }

    fn monitors(&self) -> Result<Vec<MonitorInfo>, CaptureError> {
        Ok(Vec::new())
    }

    fn windows(&self) -> Result<Vec<WindowInfo>, CaptureError> {
        Ok(Vec::new())
    }

    fn grab_primary(&self) -> Result<RgbaImage, CaptureError> {
        Err(CaptureError::unsupported(CaptureMode::FullScreen))
    }

    fn grab_monitor(&self, _index: usize) -> Result<RgbaImage, CaptureError> {
        Err(CaptureError::unsupported(CaptureMode::SpecificMonitor))
    }

    fn grab_window(&self, _title: &str) -> Result<RgbaImage, CaptureError> {
        Err(CaptureError::unsupported(CaptureMode::SpecificApplication))
    }

    fn grab_game(&self, _title: &str) -> Result<RgbaImage, CaptureError> {
        Err(CaptureError::unsupported(CaptureMode::DirectxGame))
    }
}
