//! livecap platform core contracts.
//!
//! This crate contains the capture-mode and display data structures shared
//! by the engine, the HTTP server and the CLI without coupling any of them to
//! a concrete OS backend.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of capture modes a session can run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    #[default]
    FullScreen,
    SpecificApplication,
    SpecificMonitor,
    DirectxGame,
    SpecificBrowserTab,
}

impl CaptureMode {
    pub const ALL: [CaptureMode; 5] = [
        CaptureMode::FullScreen,
        CaptureMode::SpecificApplication,
        CaptureMode::SpecificMonitor,
        CaptureMode::DirectxGame,
        CaptureMode::SpecificBrowserTab,
    ];

    /// Human-readable name, as shown in mode pickers.
    pub fn display_name(self) -> &'static str {
        match self {
            CaptureMode::FullScreen => "Full Screen",
            CaptureMode::SpecificApplication => "Specific Application",
            CaptureMode::SpecificMonitor => "Specific Monitor",
            CaptureMode::DirectxGame => "DirectX Game",
            CaptureMode::SpecificBrowserTab => "Specific Browser Tab",
        }
    }

    /// Stable snake_case identifier (matches the serde representation).
    pub fn as_str(self) -> &'static str {
        match self {
            CaptureMode::FullScreen => "full_screen",
            CaptureMode::SpecificApplication => "specific_application",
            CaptureMode::SpecificMonitor => "specific_monitor",
            CaptureMode::DirectxGame => "directx_game",
            CaptureMode::SpecificBrowserTab => "specific_browser_tab",
        }
    }

    /// Whether the mode needs a target (window title, monitor index, tab title).
    pub fn requires_target(self) -> bool {
        !matches!(self, CaptureMode::FullScreen)
    }

    /// File stem used for the single reused screenshot file.
    ///
    /// The display name reduced to lowercase alphanumerics, e.g. `fullscreen`.
    pub fn file_stem(self) -> String {
        self.display_name()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect()
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Error returned when a string names no capture mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCaptureMode(pub String);

impl fmt::Display for UnknownCaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown capture mode '{}'", self.0)
    }
}

impl std::error::Error for UnknownCaptureMode {}

impl FromStr for CaptureMode {
    type Err = UnknownCaptureMode;

    /// Accepts the snake_case id, the display name, or either with
    /// separators dropped (`fullscreen`, `full-screen`, `Full Screen`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        CaptureMode::ALL
            .into_iter()
            .find(|mode| mode.file_stem() == wanted)
            .ok_or_else(|| UnknownCaptureMode(s.to_string()))
    }
}

/// Information about a connected monitor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorInfo {
    /// 1-based index as presented to users.
    pub index: usize,
    /// Monitor name/identifier.
    pub name: String,
    /// Resolution in physical pixels.
    pub width: u32,
    pub height: u32,
    /// Position in the virtual desktop (pixels).
    pub x: i32,
    pub y: i32,
    /// Scale factor (for example 1.0, 1.25, 2.0).
    pub scale_factor: f32,
    /// Whether this monitor is primary.
    pub primary: bool,
}

/// A top-level window that can be targeted by title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowInfo {
    pub title: String,
    pub app_name: String,
    pub width: u32,
    pub height: u32,
    pub minimized: bool,
}

impl WindowInfo {
    /// Case-insensitive substring match on the window title.
    pub fn title_matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        !needle.is_empty() && self.title.to_lowercase().contains(&needle)
    }
}

/// Operating system family the process runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformFamily {
    Windows,
    MacOS,
    Linux,
    Other,
}

impl PlatformFamily {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            PlatformFamily::Windows
        } else if cfg!(target_os = "macos") {
            PlatformFamily::MacOS
        } else if cfg!(target_os = "linux") {
            PlatformFamily::Linux
        } else {
            PlatformFamily::Other
        }
    }

    /// DirectX game capture only exists on Windows.
    pub fn supports_directx(self) -> bool {
        self == PlatformFamily::Windows
    }
}
