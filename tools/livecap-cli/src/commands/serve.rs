//! Run the capture scheduler behind the status server.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{broadcast, mpsc};

use livecap_capture_engine::{
    CaptureConfig, CaptureScheduler, Published, ScreenshotStore, StopOutcome,
};
use livecap_common::config::AppConfig;
use livecap_status_server::{ShutdownHandle, StatusServer};

use super::settings::{self, SettingsChange};
use super::{backend, CaptureArgs};

pub struct ServeOptions {
    pub capture: CaptureArgs,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub interval: Option<f64>,
    pub start: bool,
    pub synthetic: bool,
}

pub async fn run(app: AppConfig, options: ServeOptions) -> anyhow::Result<()> {
    let mut server_config = app.server.clone();
    if let Some(host) = options.host {
        server_config.host = host;
    }
    if let Some(port) = options.port {
        server_config.port = port;
    }

    let mut defaults = options.capture.apply(&app.capture);
    if let Some(interval) = options.interval {
        defaults.interval_secs = interval;
    }
    let config = CaptureConfig::from_defaults(&defaults).context("invalid capture settings")?;

    let backend = backend(options.synthetic);
    let store = Arc::new(ScreenshotStore::new());
    let scheduler = Arc::new(CaptureScheduler::new(backend, store).with_config(config));

    let server = StatusServer::new(Arc::clone(&scheduler), server_config);
    let shutdown = server.shutdown_handle();
    let listener = server.bind().await?;
    let addr = listener.local_addr()?;

    println!("livecap serving on http://{addr}");
    println!("  Viewer:  http://{addr}/viewer");
    println!("  Backend: {}", scheduler.backend_name());
    println!("Commands: start | stop | toggle | status | quit");
    println!("Settings (while stopped): {}", settings::USAGE);

    tokio::spawn(log_publishes(scheduler.subscribe()));
    tokio::spawn(command_loop(Arc::clone(&scheduler), shutdown.clone()));
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted");
                shutdown.trigger();
            }
        });
    }

    if options.start || app.capture.start_on_launch {
        if let Err(e) = scheduler.start_current().await {
            tracing::error!(error = %e, "Could not start capture");
        }
    }

    server.serve(listener).await?;
    Ok(())
}

/// Consumer of publish events: one log line per screenshot.
async fn log_publishes(mut events: broadcast::Receiver<Published>) {
    loop {
        match events.recv().await {
            Ok(published) => tracing::info!(
                sequence = published.sequence,
                path = %published.artifact.path().display(),
                dimensions = %published.artifact.dimensions(),
                "Screenshot captured"
            ),
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "Publish log fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Line commands from stdin.
///
/// Lines are read on a plain thread so a pending read never holds up
/// runtime shutdown.
async fn command_loop(scheduler: Arc<CaptureScheduler>, shutdown: ShutdownHandle) {
    let (tx, mut rx) = mpsc::channel::<String>(8);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    while let Some(line) = rx.recv().await {
        let command = line.trim().to_lowercase();
        match command.as_str() {
            "" => {}
            "start" => match scheduler.start_current().await {
                Ok(()) => println!("capture started"),
                Err(e) => println!("error: {e}"),
            },
            "stop" => match scheduler.stop().await {
                StopOutcome::AlreadyIdle => println!("capture is not running"),
                _ => println!("capture stopped"),
            },
            "toggle" => match scheduler.toggle().await {
                Ok(state) => println!("capture {state}"),
                Err(e) => println!("error: {e}"),
            },
            "status" => {
                let stats = scheduler.stats();
                println!(
                    "{} | sequence {} | ticks {} published {} skipped {} write failures {} dropped {}",
                    scheduler.state(),
                    scheduler.store().sequence(),
                    stats.ticks,
                    stats.published,
                    stats.skipped,
                    stats.persistence_failures,
                    stats.dropped
                );
                if let Some(config) = scheduler.config() {
                    println!(
                        "{} every {:.3}s -> {}",
                        config.mode(),
                        config.interval().as_secs_f64(),
                        config.directory().display()
                    );
                }
            }
            "quit" | "exit" => {
                shutdown.trigger();
                break;
            }
            _ => match SettingsChange::parse(&line) {
                Ok(Some(change)) => match settings::apply(&scheduler, &change).await {
                    Ok(config) => println!(
                        "settings applied: {} every {:.3}s -> {} ({})",
                        config.mode(),
                        config.interval().as_secs_f64(),
                        config.directory().display(),
                        if config.reuse() { "reuse" } else { "history" }
                    ),
                    Err(e) => println!("error: {e}"),
                },
                Ok(None) => println!(
                    "unknown command '{command}' (start | stop | toggle | status | quit | {})",
                    settings::USAGE
                ),
                Err(e) => println!("error: {e}"),
            },
        }
    }
}
