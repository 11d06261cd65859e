//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use livecap_platform_core::CaptureMode;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_INTERVAL_SECS: f64 = 3.0;
pub const DEFAULT_SHUTDOWN_GRACE_SECS: f64 = 5.0;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP status server settings.
    pub server: ServerConfig,

    /// Default capture session settings.
    pub capture: CaptureDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// HTTP status server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// How long `/shutdown` waits for an in-flight capture before giving up.
    pub shutdown_grace_secs: f64,
}

/// Capture parameters used when the command line does not override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureDefaults {
    pub mode: CaptureMode,

    /// Window title, monitor index or tab title, depending on the mode.
    pub target: Option<String>,

    /// Directory screenshots are written to.
    pub directory: PathBuf,

    /// Overwrite one file instead of keeping a timestamped history.
    pub reuse: bool,

    /// Seconds between captures.
    pub interval_secs: f64,

    /// Begin capturing as soon as the process starts.
    pub start_on_launch: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "livecap=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
        }
    }
}

impl Default for CaptureDefaults {
    fn default() -> Self {
        Self {
            mode: CaptureMode::FullScreen,
            target: None,
            directory: default_screenshots_dir(),
            reuse: true,
            interval_secs: DEFAULT_INTERVAL_SECS,
            start_on_launch: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<PathBuf, std::io::Error> {
        let config_path = config_file_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("livecap").join("config.json")
}

/// Default screenshots directory: `Images/` under the working directory.
fn default_screenshots_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("Images")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.capture.mode, CaptureMode::FullScreen);
        assert!(config.capture.reuse);
        assert_eq!(config.capture.interval_secs, 3.0);
        assert!(config.capture.directory.ends_with("Images"));
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "server": { "port": 8080 }, "capture": { "mode": "specific_monitor", "target": "2" } }"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.capture.mode, CaptureMode::SpecificMonitor);
        assert_eq!(config.capture.target.as_deref(), Some("2"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.server.port, DEFAULT_PORT);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = AppConfig::default();
        config.capture.reuse = false;
        config.capture.interval_secs = 0.5;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert!(!loaded.capture.reuse);
        assert_eq!(loaded.capture.interval_secs, 0.5);
    }
}
