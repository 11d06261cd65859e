//! In-memory backend that renders test-pattern frames.
//!
//! Used by the test suites and by `livecap serve --synthetic` to exercise the
//! whole pipeline on machines without screen access. Behaviour is scripted:
//! queued [`ScriptStep`]s are consumed one per grab, after which every grab
//! succeeds.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use image::{Rgba, RgbaImage};
use parking_lot::Mutex;

use livecap_common::error::CaptureError;
use livecap_platform_core::{CaptureMode, MonitorInfo, WindowInfo};

use crate::backend::CaptureBackend;

/// Outcome of one scripted grab.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Frame,
    Fail(CaptureError),
}

pub struct SyntheticBackend {
    width: u32,
    height: u32,
    delay: Duration,
    monitors: Vec<MonitorInfo>,
    windows: Vec<WindowInfo>,
    unsupported: Vec<CaptureMode>,
    script: Mutex<VecDeque<ScriptStep>>,
    grabs_started: AtomicU64,
    grabs_finished: AtomicU64,
}

impl SyntheticBackend {
    pub fn new() -> Self {
        Self {
            width: 64,
            height: 36,
            delay: Duration::ZERO,
            monitors: vec![
                synthetic_monitor(1, 0, true),
                synthetic_monitor(2, 64, false),
            ],
            windows: vec![
                synthetic_window("Synthetic Editor", "editor"),
                synthetic_window("Docs - Synthetic Browser", "browser"),
                synthetic_window("Synthetic Game", "game"),
            ],
            unsupported: Vec::new(),
            script: Mutex::new(VecDeque::new()),
            grabs_started: AtomicU64::new(0),
            grabs_finished: AtomicU64::new(0),
        }
    }

    /// Frame size of every grab.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    /// Simulated duration of each grab.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Report `mode` as unavailable on this "platform".
    pub fn without_mode(mut self, mode: CaptureMode) -> Self {
        self.unsupported.push(mode);
        self
    }

    /// Queue outcomes for the next grabs.
    pub fn with_script(self, steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        self.script.lock().extend(steps);
        self
    }

    /// Queue one more outcome while the backend is in use.
    pub fn push_step(&self, step: ScriptStep) {
        self.script.lock().push_back(step);
    }

    /// Grabs that have begun, including ones still in progress.
    pub fn grabs_started(&self) -> u64 {
        self.grabs_started.load(Ordering::SeqCst)
    }

    /// Grabs that have returned, successfully or not.
    pub fn grabs_finished(&self) -> u64 {
        self.grabs_finished.load(Ordering::SeqCst)
    }

    fn grab(&self, width: u32, height: u32) -> Result<RgbaImage, CaptureError> {
        let n = self.grabs_started.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let step = self.script.lock().pop_front().unwrap_or(ScriptStep::Frame);
        let result = match step {
            ScriptStep::Frame => Ok(test_pattern(width, height, n)),
            ScriptStep::Fail(err) => Err(err),
        };
        self.grabs_finished.fetch_add(1, Ordering::SeqCst);
        result
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for SyntheticBackend {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn supports(&self, mode: CaptureMode) -> bool {
        !self.unsupported.contains(&mode)
    }

    fn monitors(&self) -> Result<Vec<MonitorInfo>, CaptureError> {
        Ok(self.monitors.clone())
    }

    fn windows(&self) -> Result<Vec<WindowInfo>, CaptureError> {
        Ok(self.windows.clone())
    }

    fn grab_primary(&self) -> Result<RgbaImage, CaptureError> {
        self.grab(self.width, self.height)
    }

    fn grab_monitor(&self, index: usize) -> Result<RgbaImage, CaptureError> {
        if !self.monitors.iter().any(|m| m.index == index) {
            return Err(CaptureError::target_not_found(format!("monitor {index}")));
        }
        self.grab(self.width, self.height)
    }

    fn grab_window(&self, title: &str) -> Result<RgbaImage, CaptureError> {
        let window = self
            .windows
            .iter()
            .find(|w| !w.minimized && w.title_matches(title))
            .ok_or_else(|| CaptureError::target_not_found(format!("window '{title}'")))?;
        self.grab(window.width, window.height)
    }
}

/// Diagonal gradient shifted by the grab number, so consecutive frames differ.
fn test_pattern(width: u32, height: u32, n: u64) -> RgbaImage {
    let shift = (n % 256) as u8;
    RgbaImage::from_fn(width, height, |x, y| {
        let r = ((x * 255) / width.max(1)) as u8;
        let g = ((y * 255) / height.max(1)) as u8;
        Rgba([r, g, shift, 255])
    })
}

fn synthetic_monitor(index: usize, x: i32, primary: bool) -> MonitorInfo {
    MonitorInfo {
        index,
        name: format!("synthetic-{index}"),
        width: 64,
        height: 36,
        x,
        y: 0,
        scale_factor: 1.0,
        primary,
    }
}

fn synthetic_window(title: &str, app_name: &str) -> WindowInfo {
    WindowInfo {
        title: title.to_string(),
        app_name: app_name.to_string(),
        width: 32,
        height: 24,
        minimized: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_failures_come_first() {
        let backend = SyntheticBackend::new().with_script([
            ScriptStep::Fail(CaptureError::permission_denied("screen recording")),
            ScriptStep::Frame,
        ]);

        assert!(matches!(
            backend.grab_primary(),
            Err(CaptureError::PermissionDenied { .. })
        ));
        assert!(backend.grab_primary().is_ok());
        assert!(backend.grab_primary().is_ok());
        assert_eq!(backend.grabs_finished(), 3);
    }

    #[test]
    fn consecutive_frames_differ() {
        let backend = SyntheticBackend::new();
        let first = backend.grab_primary().unwrap();
        let second = backend.grab_primary().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn unknown_targets_are_not_found() {
        let backend = SyntheticBackend::new();
        assert!(matches!(
            backend.grab_monitor(3),
            Err(CaptureError::TargetNotFound { .. })
        ));
        assert!(matches!(
            backend.grab_window("Spreadsheet"),
            Err(CaptureError::TargetNotFound { .. })
        ));
        assert_eq!(backend.grab_window("browser").unwrap().width(), 32);
    }
}
