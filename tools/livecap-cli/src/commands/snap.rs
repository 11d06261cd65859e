//! Take a single screenshot.

use anyhow::Context;
use chrono::Local;

use livecap_capture_engine::{CaptureConfig, CaptureStrategy, PersistencePolicy, ScreenshotStore};
use livecap_common::config::AppConfig;

use super::{backend, CaptureArgs};

pub fn run(app: &AppConfig, args: &CaptureArgs, synthetic: bool) -> anyhow::Result<()> {
    let defaults = args.apply(&app.capture);
    let config = CaptureConfig::from_defaults(&defaults).context("invalid capture settings")?;
    let backend = backend(synthetic);

    let strategy = CaptureStrategy::for_config(&config);
    strategy.check_support(backend.as_ref())?;
    let capture = strategy
        .capture(backend.as_ref())
        .with_context(|| format!("{strategy} capture failed"))?;

    let store = ScreenshotStore::new();
    let published = store.publish(
        capture,
        Local::now(),
        &PersistencePolicy::from_config(&config),
    )?;

    println!(
        "{} ({})",
        published.artifact.path().display(),
        published.artifact.dimensions()
    );
    Ok(())
}
