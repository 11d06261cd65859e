//! Runtime settings changes typed at the `serve` prompt.
//!
//! Each change is layered over the scheduler's current configuration and
//! handed to `reconfigure`, so it only lands while capture is idle.

use std::path::PathBuf;

use anyhow::{anyhow, bail};

use livecap_capture_engine::{CaptureConfig, CaptureScheduler, CaptureTarget};
use livecap_common::error::LivecapResult;
use livecap_platform_core::CaptureMode;

pub const USAGE: &str =
    "mode <mode> [target] | target <target> | dir <path> | reuse on|off | interval <secs>";

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsChange {
    /// New mode; the old target only survives if none is given and the mode is unchanged.
    Mode {
        mode: CaptureMode,
        target: Option<String>,
    },
    Target(String),
    Directory(PathBuf),
    Reuse(bool),
    Interval(f64),
}

impl SettingsChange {
    /// Parse one prompt line. `Ok(None)` means the line is not a settings command.
    pub fn parse(line: &str) -> anyhow::Result<Option<Self>> {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        let change = match command.to_lowercase().as_str() {
            "mode" => {
                let (mode, target) = match rest.split_once(char::is_whitespace) {
                    Some((mode, target)) => (mode, Some(target.trim().to_string())),
                    None => (rest, None),
                };
                if mode.is_empty() {
                    bail!("usage: mode <mode> [target]");
                }
                SettingsChange::Mode {
                    mode: mode.parse()?,
                    target: target.filter(|t| !t.is_empty()),
                }
            }
            "target" => {
                if rest.is_empty() {
                    bail!("usage: target <target>");
                }
                SettingsChange::Target(rest.to_string())
            }
            "dir" | "directory" => {
                if rest.is_empty() {
                    bail!("usage: dir <path>");
                }
                SettingsChange::Directory(PathBuf::from(rest))
            }
            "reuse" => match rest.to_lowercase().as_str() {
                "on" | "true" | "yes" => SettingsChange::Reuse(true),
                "off" | "false" | "no" => SettingsChange::Reuse(false),
                _ => bail!("usage: reuse on|off"),
            },
            "interval" => {
                let secs = rest
                    .parse::<f64>()
                    .map_err(|_| anyhow!("usage: interval <secs> (got '{rest}')"))?;
                SettingsChange::Interval(secs)
            }
            _ => return Ok(None),
        };
        Ok(Some(change))
    }

    /// Build the configuration that results from applying this change.
    pub fn apply_to(&self, current: &CaptureConfig) -> LivecapResult<CaptureConfig> {
        let mut mode = current.mode();
        let mut target = current.target().map(target_text);
        let mut directory = current.directory().to_path_buf();
        let mut reuse = current.reuse();
        let mut interval_secs = current.interval().as_secs_f64();

        match self {
            SettingsChange::Mode {
                mode: next,
                target: next_target,
            } => {
                if *next != mode || next_target.is_some() {
                    target = next_target.clone();
                }
                mode = *next;
            }
            SettingsChange::Target(t) => target = Some(t.clone()),
            SettingsChange::Directory(d) => directory = d.clone(),
            SettingsChange::Reuse(r) => reuse = *r,
            SettingsChange::Interval(secs) => interval_secs = *secs,
        }

        CaptureConfig::with_interval_secs(mode, target.as_deref(), directory, reuse, interval_secs)
    }
}

fn target_text(target: &CaptureTarget) -> String {
    match target {
        CaptureTarget::Window(title) => title.clone(),
        CaptureTarget::Monitor(index) => index.to_string(),
    }
}

/// Apply a change through the scheduler. Fails with `InvalidState` while
/// capture is running.
pub async fn apply(
    scheduler: &CaptureScheduler,
    change: &SettingsChange,
) -> LivecapResult<CaptureConfig> {
    let current = scheduler.config().ok_or_else(|| {
        livecap_common::error::LivecapError::config("no capture configuration to change")
    })?;
    let next = change.apply_to(&current)?;
    scheduler.reconfigure(next.clone()).await?;
    Ok(next)
}
