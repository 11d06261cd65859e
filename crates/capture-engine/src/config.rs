//! Capture session configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use livecap_common::config::CaptureDefaults;
use livecap_common::error::{LivecapError, LivecapResult};
use livecap_platform_core::CaptureMode;

/// What a targeted mode points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    /// A window located by (partial) title: applications, games, browser tabs.
    Window(String),
    /// A monitor by 1-based index.
    Monitor(usize),
}

impl std::fmt::Display for CaptureTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureTarget::Window(title) => write!(f, "window '{title}'"),
            CaptureTarget::Monitor(index) => write!(f, "monitor {index}"),
        }
    }
}

/// Immutable configuration of one capture session.
///
/// Construction validates everything the scheduler relies on: the interval
/// is positive and a target is present exactly when the mode needs one.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    mode: CaptureMode,
    target: Option<CaptureTarget>,
    directory: PathBuf,
    reuse: bool,
    interval: Duration,
}

impl CaptureConfig {
    pub fn new(
        mode: CaptureMode,
        target: Option<&str>,
        directory: impl Into<PathBuf>,
        reuse: bool,
        interval: Duration,
    ) -> LivecapResult<Self> {
        if interval.is_zero() {
            return Err(LivecapError::config("capture interval must be greater than zero"));
        }

        let target = target.map(str::trim).filter(|t| !t.is_empty());
        let target = match (mode.requires_target(), target) {
            (false, None) => None,
            (false, Some(t)) => {
                return Err(LivecapError::config(format!(
                    "mode '{mode}' does not take a target (got '{t}')"
                )));
            }
            (true, None) => {
                return Err(LivecapError::config(format!(
                    "mode '{mode}' requires a target"
                )));
            }
            (true, Some(t)) => Some(parse_target(mode, t)?),
        };

        let directory = directory.into();
        if directory.as_os_str().is_empty() {
            return Err(LivecapError::config("output directory must not be empty"));
        }

        Ok(Self {
            mode,
            target,
            directory,
            reuse,
            interval,
        })
    }

    /// Build a config from interval seconds, as given on the command line or
    /// in the config file.
    pub fn with_interval_secs(
        mode: CaptureMode,
        target: Option<&str>,
        directory: impl Into<PathBuf>,
        reuse: bool,
        interval_secs: f64,
    ) -> LivecapResult<Self> {
        if !interval_secs.is_finite() || interval_secs <= 0.0 {
            return Err(LivecapError::config(format!(
                "capture interval must be a positive number of seconds (got {interval_secs})"
            )));
        }
        Self::new(
            mode,
            target,
            directory,
            reuse,
            Duration::from_secs_f64(interval_secs),
        )
    }

    pub fn from_defaults(defaults: &CaptureDefaults) -> LivecapResult<Self> {
        Self::with_interval_secs(
            defaults.mode,
            defaults.target.as_deref(),
            defaults.directory.clone(),
            defaults.reuse,
            defaults.interval_secs,
        )
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn target(&self) -> Option<&CaptureTarget> {
        self.target.as_ref()
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn reuse(&self) -> bool {
        self.reuse
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

fn parse_target(mode: CaptureMode, raw: &str) -> LivecapResult<CaptureTarget> {
    match mode {
        CaptureMode::SpecificMonitor => match raw.parse::<usize>() {
            Ok(index) if index >= 1 => Ok(CaptureTarget::Monitor(index)),
            _ => Err(LivecapError::config(format!(
                "monitor target must be a 1-based index (got '{raw}')"
            ))),
        },
        _ => Ok(CaptureTarget::Window(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn full_screen_needs_no_target() {
        let config =
            CaptureConfig::new(CaptureMode::FullScreen, None, "/tmp/shots", true, secs(1))
                .unwrap();
        assert_eq!(config.target(), None);
        assert_eq!(config.interval(), secs(1));
    }

    #[test]
    fn full_screen_rejects_a_target() {
        let err = CaptureConfig::new(
            CaptureMode::FullScreen,
            Some("Notepad"),
            "/tmp/shots",
            true,
            secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, LivecapError::Config { .. }));
    }

    #[test]
    fn targeted_modes_require_a_target() {
        for mode in [
            CaptureMode::SpecificApplication,
            CaptureMode::SpecificMonitor,
            CaptureMode::DirectxGame,
            CaptureMode::SpecificBrowserTab,
        ] {
            let err = CaptureConfig::new(mode, Some("   "), "/tmp/shots", true, secs(1));
            assert!(err.is_err(), "{mode} accepted a blank target");
        }
    }

    #[test]
    fn monitor_target_is_a_one_based_index() {
        let config = CaptureConfig::new(
            CaptureMode::SpecificMonitor,
            Some("2"),
            "/tmp/shots",
            false,
            secs(1),
        )
        .unwrap();
        assert_eq!(config.target(), Some(&CaptureTarget::Monitor(2)));

        for bad in ["0", "-1", "left"] {
            assert!(CaptureConfig::new(
                CaptureMode::SpecificMonitor,
                Some(bad),
                "/tmp/shots",
                false,
                secs(1)
            )
            .is_err());
        }
    }

    #[test]
    fn window_targets_are_trimmed() {
        let config = CaptureConfig::new(
            CaptureMode::SpecificBrowserTab,
            Some("  Inbox  "),
            "/tmp/shots",
            true,
            secs(1),
        )
        .unwrap();
        assert_eq!(
            config.target(),
            Some(&CaptureTarget::Window("Inbox".to_string()))
        );
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(
            CaptureConfig::new(CaptureMode::FullScreen, None, "/tmp", true, Duration::ZERO)
                .is_err()
        );
        assert!(
            CaptureConfig::with_interval_secs(CaptureMode::FullScreen, None, "/tmp", true, f64::NAN)
                .is_err()
        );
    }

    proptest! {
        #[test]
        fn interval_validation_matches_sign(secs in prop_oneof![-10.0f64..=0.0, 0.001f64..10.0]) {
            let result = CaptureConfig::with_interval_secs(
                CaptureMode::FullScreen, None, "/tmp/shots", true, secs,
            );
            prop_assert_eq!(result.is_ok(), secs > 0.0);
        }
    }
}
