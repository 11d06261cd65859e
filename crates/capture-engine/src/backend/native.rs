//! Screen grabs through `xcap`.

use image::RgbaImage;
use xcap::{Monitor, Window, XCapError};

use livecap_common::error::CaptureError;
use livecap_platform_core::{CaptureMode, MonitorInfo, PlatformFamily, WindowInfo};

use crate::backend::CaptureBackend;

pub struct NativeBackend {
    platform: PlatformFamily,
}

impl NativeBackend {
    pub fn new() -> Self {
        Self {
            platform: PlatformFamily::current(),
        }
    }
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for NativeBackend {
    fn name(&self) -> &str {
        "xcap"
    }

    fn supports(&self, mode: CaptureMode) -> bool {
        match mode {
            CaptureMode::DirectxGame => self.platform.supports_directx(),
            _ => true,
        }
    }

    fn monitors(&self) -> Result<Vec<MonitorInfo>, CaptureError> {
        let monitors = Monitor::all().map_err(classify)?;
        Ok(monitors
            .iter()
            .enumerate()
            .map(|(i, m)| MonitorInfo {
                index: i + 1,
                name: m.name().unwrap_or_default(),
                width: m.width().unwrap_or(0),
                height: m.height().unwrap_or(0),
                x: m.x().unwrap_or(0),
                y: m.y().unwrap_or(0),
                scale_factor: m.scale_factor().unwrap_or(1.0),
                primary: m.is_primary().unwrap_or(false),
            })
            .collect())
    }

    fn windows(&self) -> Result<Vec<WindowInfo>, CaptureError> {
        let windows = Window::all().map_err(classify)?;
        Ok(windows.iter().map(window_info).collect())
    }

    fn grab_primary(&self) -> Result<RgbaImage, CaptureError> {
        let monitors = Monitor::all().map_err(classify)?;
        let index = monitors
            .iter()
            .position(|m| m.is_primary().unwrap_or(false))
            .unwrap_or(0);
        let monitor = monitors
            .get(index)
            .ok_or_else(|| CaptureError::target_not_found("primary monitor"))?;
        let frame = monitor.capture_image().map_err(classify)?;
        tracing::trace!(
            width = frame.width(),
            height = frame.height(),
            "Primary monitor grabbed"
        );
        Ok(frame)
    }

    fn grab_monitor(&self, index: usize) -> Result<RgbaImage, CaptureError> {
        let monitors = Monitor::all().map_err(classify)?;
        let monitor = index
            .checked_sub(1)
            .and_then(|i| monitors.get(i))
            .ok_or_else(|| {
                CaptureError::target_not_found(format!(
                    "monitor {index} (available: {})",
                    monitors.len()
                ))
            })?;
        monitor.capture_image().map_err(classify)
    }

    fn grab_window(&self, title: &str) -> Result<RgbaImage, CaptureError> {
        let windows = Window::all().map_err(classify)?;
        let window = windows
            .iter()
            .find(|w| {
                let info = window_info(w);
                !info.minimized && info.title_matches(title)
            })
            .ok_or_else(|| CaptureError::target_not_found(format!("window '{title}'")))?;
        window.capture_image().map_err(classify)
    }

    fn grab_game(&self, title: &str) -> Result<RgbaImage, CaptureError> {
        if !self.platform.supports_directx() {
            return Err(CaptureError::unsupported(CaptureMode::DirectxGame));
        }
        // Windows Graphics Capture composites DirectX surfaces, so the game
        // window is grabbed like any other window.
        self.grab_window(title)
    }
}

fn window_info(window: &Window) -> WindowInfo {
    WindowInfo {
        title: window.title().unwrap_or_default(),
        app_name: window.app_name().unwrap_or_default(),
        width: window.width().unwrap_or(0),
        height: window.height().unwrap_or(0),
        minimized: window.is_minimized().unwrap_or(false),
    }
}

/// Map xcap failures onto the capture taxonomy. xcap reports OS denials as
/// plain messages, so permission problems are recognised by wording.
fn classify(err: XCapError) -> CaptureError {
    let message = err.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("permission")
        || lowered.contains("denied")
        || lowered.contains("not authorized")
    {
        CaptureError::permission_denied(message)
    } else {
        CaptureError::failed(message)
    }
}
