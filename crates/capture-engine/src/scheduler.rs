//! Capture scheduler: the interval loop and its start/stop state machine.
//!
//! ```text
//!            start / start_current / toggle
//!    Idle ─────────────────────────────────────▶ Running
//!     ▲                                            │
//!     │  in-flight tick finished     stop / toggle │
//!     └──────────────── Stopping ◀─────────────────┘
//! ```
//!
//! Commands are serialized through an async mutex. The worker is a tokio
//! task; each tick runs the capture and the publish on the blocking pool.
//! A fatal capture error (unsupported mode) ends the worker, which then
//! returns the scheduler to `Idle` on its own.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use livecap_common::clock::missed_ticks;
use livecap_common::error::{LivecapError, LivecapResult};

use crate::artifact::Published;
use crate::backend::CaptureBackend;
use crate::config::CaptureConfig;
use crate::store::{PersistencePolicy, ScreenshotStore};
use crate::strategy::CaptureStrategy;

/// Lifecycle state of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    /// No worker; commands may start or reconfigure.
    Idle,
    /// Worker ticking on the configured interval.
    Running,
    /// Stop requested; waiting for the in-flight tick.
    Stopping,
}

impl SchedulerState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SchedulerState::Idle)
    }

    /// Status string exposed over HTTP. `Stopping` still counts as running.
    pub fn as_status(&self) -> &'static str {
        match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Running | SchedulerState::Stopping => "running",
        }
    }
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Running => "running",
            SchedulerState::Stopping => "stopping",
        };
        f.write_str(s)
    }
}

/// Tick bookkeeping, cumulative over the scheduler's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    /// Ticks that ran a capture.
    pub ticks: u64,
    /// Ticks that published a new artifact.
    pub published: u64,
    /// Ticks skipped because the capture failed.
    pub skipped: u64,
    /// Ticks whose capture succeeded but could not be written.
    pub persistence_failures: u64,
    /// Overdue ticks dropped because a capture outlasted the interval.
    pub dropped: u64,
}

/// How a stop request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing was running.
    AlreadyIdle,
    /// The worker finished its in-flight tick and exited.
    Stopped,
    /// The grace period elapsed; the worker was abandoned.
    TimedOut,
}

struct Worker {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

struct Shared {
    backend: Arc<dyn CaptureBackend>,
    store: Arc<ScreenshotStore>,
    config: RwLock<Option<CaptureConfig>>,
    state_tx: watch::Sender<SchedulerState>,
    stats: Mutex<SchedulerStats>,
}

impl Shared {
    fn set_state(&self, state: SchedulerState) {
        self.state_tx.send_replace(state);
    }
}

pub struct CaptureScheduler {
    shared: Arc<Shared>,
    /// Serializes commands; holds the live worker, if any.
    control: tokio::sync::Mutex<Option<Worker>>,
}

impl CaptureScheduler {
    pub fn new(backend: Arc<dyn CaptureBackend>, store: Arc<ScreenshotStore>) -> Self {
        let (state_tx, _) = watch::channel(SchedulerState::Idle);
        Self {
            shared: Arc::new(Shared {
                backend,
                store,
                config: RwLock::new(None),
                state_tx,
                stats: Mutex::new(SchedulerStats::default()),
            }),
            control: tokio::sync::Mutex::new(None),
        }
    }

    /// Preload the configuration used by [`start_current`](Self::start_current).
    pub fn with_config(self, config: CaptureConfig) -> Self {
        *self.shared.config.write() = Some(config);
        self
    }

    pub fn state(&self) -> SchedulerState {
        *self.shared.state_tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SchedulerState> {
        self.shared.state_tx.subscribe()
    }

    /// The configuration of the running session, or the one the next
    /// `start_current` will use.
    pub fn config(&self) -> Option<CaptureConfig> {
        self.shared.config.read().clone()
    }

    pub fn stats(&self) -> SchedulerStats {
        *self.shared.stats.lock()
    }

    pub fn store(&self) -> &Arc<ScreenshotStore> {
        &self.shared.store
    }

    pub fn backend_name(&self) -> &str {
        self.shared.backend.name()
    }

    /// Receive every artifact this scheduler publishes.
    pub fn subscribe(&self) -> broadcast::Receiver<Published> {
        self.shared.store.subscribe()
    }

    /// Start capturing with `config`. Fails with `AlreadyRunning` unless idle
    /// and with `UnsupportedMode` when the backend cannot serve the mode.
    pub async fn start(&self, config: CaptureConfig) -> LivecapResult<()> {
        let mut slot = self.control.lock().await;
        self.reap(&mut slot).await;
        self.start_locked(&mut slot, config)
    }

    /// Start with the last configured session.
    pub async fn start_current(&self) -> LivecapResult<()> {
        let mut slot = self.control.lock().await;
        self.reap(&mut slot).await;
        let config = self.stored_config()?;
        self.start_locked(&mut slot, config)
    }

    /// Stop and wait for the in-flight tick. A no-op when idle.
    pub async fn stop(&self) -> StopOutcome {
        let mut slot = self.control.lock().await;
        self.stop_locked(&mut slot, None).await
    }

    /// Stop, giving the in-flight tick at most `grace` to finish.
    pub async fn stop_within(&self, grace: Duration) -> StopOutcome {
        let mut slot = self.control.lock().await;
        self.stop_locked(&mut slot, Some(grace)).await
    }

    /// Replace the stored configuration. Only allowed while idle.
    pub async fn reconfigure(&self, config: CaptureConfig) -> LivecapResult<()> {
        let mut slot = self.control.lock().await;
        self.reap(&mut slot).await;
        if slot.is_some() {
            return Err(LivecapError::invalid_state(format!(
                "cannot reconfigure while capture is {}; stop it first",
                self.state()
            )));
        }
        tracing::info!(mode = %config.mode(), "Capture reconfigured");
        *self.shared.config.write() = Some(config);
        Ok(())
    }

    /// Stop when running, otherwise start with the stored configuration.
    /// Returns the resulting state.
    pub async fn toggle(&self) -> LivecapResult<SchedulerState> {
        let mut slot = self.control.lock().await;
        self.reap(&mut slot).await;
        if slot.is_some() {
            self.stop_locked(&mut slot, None).await;
        } else {
            let config = self.stored_config()?;
            self.start_locked(&mut slot, config)?;
        }
        Ok(self.state())
    }

    fn stored_config(&self) -> LivecapResult<CaptureConfig> {
        self.config().ok_or_else(|| {
            LivecapError::config("no capture configuration; configure capture before starting")
        })
    }

    fn start_locked(&self, slot: &mut Option<Worker>, config: CaptureConfig) -> LivecapResult<()> {
        if slot.is_some() {
            return Err(LivecapError::AlreadyRunning);
        }

        let strategy = CaptureStrategy::for_config(&config);
        strategy.check_support(self.shared.backend.as_ref())?;

        tracing::info!(
            strategy = %strategy,
            backend = self.shared.backend.name(),
            interval_ms = config.interval().as_millis() as u64,
            directory = %config.directory().display(),
            reuse = config.reuse(),
            "Starting capture"
        );

        *self.shared.config.write() = Some(config.clone());
        let (stop_tx, stop_rx) = watch::channel(false);
        self.shared.set_state(SchedulerState::Running);
        let handle = tokio::spawn(run_worker(
            Arc::clone(&self.shared),
            config,
            strategy,
            stop_rx,
        ));
        *slot = Some(Worker { stop_tx, handle });
        Ok(())
    }

    async fn stop_locked(&self, slot: &mut Option<Worker>, grace: Option<Duration>) -> StopOutcome {
        let Some(mut worker) = slot.take() else {
            return StopOutcome::AlreadyIdle;
        };
        if worker.handle.is_finished() {
            let _ = worker.handle.await;
            self.shared.set_state(SchedulerState::Idle);
            return StopOutcome::AlreadyIdle;
        }

        tracing::info!("Stopping capture");
        self.shared.set_state(SchedulerState::Stopping);
        let _ = worker.stop_tx.send(true);

        let outcome = match grace {
            None => {
                let _ = (&mut worker.handle).await;
                StopOutcome::Stopped
            }
            Some(grace) => match tokio::time::timeout(grace, &mut worker.handle).await {
                Ok(_) => StopOutcome::Stopped,
                Err(_) => {
                    worker.handle.abort();
                    tracing::warn!(
                        grace_ms = grace.as_millis() as u64,
                        "Capture did not stop within the grace period"
                    );
                    StopOutcome::TimedOut
                }
            },
        };

        self.shared.set_state(SchedulerState::Idle);
        tracing::info!(stats = ?self.stats(), "Capture stopped");
        outcome
    }

    /// Drop a worker that exited on its own after a fatal error.
    async fn reap(&self, slot: &mut Option<Worker>) {
        let exited = slot
            .as_ref()
            .is_some_and(|w| w.handle.is_finished() || self.state().is_idle());
        if exited {
            if let Some(worker) = slot.take() {
                let _ = worker.handle.await;
            }
        }
    }
}

enum TickOutcome {
    Continue,
    Fatal,
}

async fn run_worker(
    shared: Arc<Shared>,
    config: CaptureConfig,
    strategy: CaptureStrategy,
    mut stop_rx: watch::Receiver<bool>,
) {
    let interval = config.interval();
    let strategy = Arc::new(strategy);
    let policy = Arc::new(PersistencePolicy::from_config(&config));

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            scheduled = ticker.tick() => {
                if *stop_rx.borrow() {
                    break;
                }
                let outcome = run_tick(&shared, &strategy, &policy).await;

                let missed = missed_ticks(scheduled.into_std(), Instant::now(), interval);
                if missed > 0 {
                    shared.stats.lock().dropped += missed;
                    tracing::debug!(missed, "Capture outlasted the interval; dropping overdue ticks");
                    // Resume on the next slot of the original grid, never immediately.
                    let slots = u32::try_from(missed.saturating_add(1)).unwrap_or(u32::MAX);
                    ticker.reset_at(scheduled + interval.saturating_mul(slots));
                }

                if let TickOutcome::Fatal = outcome {
                    shared.set_state(SchedulerState::Idle);
                    break;
                }
            }
        }
    }
    tracing::debug!("Capture worker exited");
}

async fn run_tick(
    shared: &Arc<Shared>,
    strategy: &Arc<CaptureStrategy>,
    policy: &Arc<PersistencePolicy>,
) -> TickOutcome {
    shared.stats.lock().ticks += 1;

    let result = {
        let shared = Arc::clone(shared);
        let strategy = Arc::clone(strategy);
        let policy = Arc::clone(policy);
        tokio::task::spawn_blocking(move || -> LivecapResult<Published> {
            let capture = strategy.capture(shared.backend.as_ref())?;
            shared.store.publish(capture, Local::now(), &policy)
        })
        .await
    };

    let mut stats = shared.stats.lock();
    match result {
        Ok(Ok(published)) => {
            stats.published += 1;
            tracing::debug!(
                sequence = published.sequence,
                dimensions = %published.artifact.dimensions(),
                "Tick published"
            );
            TickOutcome::Continue
        }
        Ok(Err(LivecapError::Capture(e))) if e.is_fatal() => {
            stats.skipped += 1;
            tracing::error!(error = %e, "Capture mode unavailable; stopping capture");
            TickOutcome::Fatal
        }
        Ok(Err(LivecapError::Capture(e))) => {
            stats.skipped += 1;
            tracing::warn!(error = %e, "Capture failed; skipping tick");
            TickOutcome::Continue
        }
        Ok(Err(e @ LivecapError::Persistence { .. })) => {
            stats.persistence_failures += 1;
            tracing::error!(error = %e, "Keeping previous screenshot");
            TickOutcome::Continue
        }
        Ok(Err(e)) => {
            stats.skipped += 1;
            tracing::warn!(error = %e, "Tick failed; skipping");
            TickOutcome::Continue
        }
        Err(join_err) => {
            stats.skipped += 1;
            tracing::error!(error = %join_err, "Capture task panicked; skipping tick");
            TickOutcome::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopping_is_reported_as_running() {
        assert_eq!(SchedulerState::Idle.as_status(), "idle");
        assert_eq!(SchedulerState::Running.as_status(), "running");
        assert_eq!(SchedulerState::Stopping.as_status(), "running");
        assert_eq!(SchedulerState::Stopping.to_string(), "stopping");
    }

    #[test]
    fn state_serializes_in_snake_case() {
        assert_eq!(
            serde_json::to_string(&SchedulerState::Stopping).unwrap(),
            "\"stopping\""
        );
    }
}
