//! The single source of truth for "the latest capture".
//!
//! Readers take a cheap clone of an `Arc` snapshot under a short read lock,
//! so they never wait on a capture and never see a half-written artifact.
//! Publishing writes the file first and swaps the snapshot only afterwards.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use livecap_common::clock::{file_timestamp, WallClock};
use livecap_common::error::{LivecapError, LivecapResult};
use livecap_platform_core::CaptureMode;

use crate::artifact::{Published, RawCapture, ScreenshotArtifact};
use crate::config::CaptureConfig;

/// Publish events buffered per subscriber before it starts lagging.
const PUBLISH_CHANNEL_CAPACITY: usize = 16;

/// Where and how artifacts are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistencePolicy {
    directory: PathBuf,
    reuse: bool,
    file_stem: String,
}

impl PersistencePolicy {
    pub fn new(directory: impl Into<PathBuf>, reuse: bool, mode: CaptureMode) -> Self {
        Self {
            directory: directory.into(),
            reuse,
            file_stem: mode.file_stem(),
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(config.directory(), config.reuse(), config.mode())
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn reuse(&self) -> bool {
        self.reuse
    }

    /// The single file reuse mode overwrites, e.g. `<dir>/fullscreen.png`.
    pub fn fixed_path(&self) -> PathBuf {
        self.directory.join(format!("{}.png", self.file_stem))
    }

    /// Destination for the artifact captured at `at` under `sequence`.
    pub fn path_for(&self, at: &DateTime<Local>, sequence: u64) -> PathBuf {
        if self.reuse {
            self.fixed_path()
        } else {
            self.directory
                .join(format!("{}_{sequence:06}.png", file_timestamp(at)))
        }
    }
}

pub struct ScreenshotStore {
    current: RwLock<Option<Published>>,
    /// Serializes publishers; holds the last committed sequence number.
    committed: Mutex<u64>,
    clock: WallClock,
    events: broadcast::Sender<Published>,
}

impl ScreenshotStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(PUBLISH_CHANNEL_CAPACITY);
        Self {
            current: RwLock::new(None),
            committed: Mutex::new(0),
            clock: WallClock::new(),
            events,
        }
    }

    /// The latest artifact and its sequence number, if anything was captured.
    pub fn current(&self) -> Option<Published> {
        self.current.read().clone()
    }

    /// Sequence of the current artifact; 0 before the first capture.
    pub fn sequence(&self) -> u64 {
        self.current.read().as_ref().map_or(0, |p| p.sequence)
    }

    /// Receive every future publish (the `onPublish` hook for consumers).
    pub fn subscribe(&self) -> broadcast::Receiver<Published> {
        self.events.subscribe()
    }

    /// Persist `capture` according to `policy`, then make it current.
    ///
    /// All-or-nothing: on a write failure the previous artifact stays current
    /// and the sequence number does not move.
    pub fn publish(
        &self,
        capture: RawCapture,
        captured_at: DateTime<Local>,
        policy: &PersistencePolicy,
    ) -> LivecapResult<Published> {
        let mut committed = self.committed.lock();
        let sequence = *committed + 1;
        let captured_at = self.clock.observe(captured_at);
        let path = policy.path_for(&captured_at, sequence);
        let (bytes, width, height) = capture.into_parts();

        write_artifact(&path, &bytes, policy.reuse())?;

        let published = Published {
            artifact: Arc::new(ScreenshotArtifact {
                bytes,
                width,
                height,
                captured_at,
                path,
            }),
            sequence,
        };
        *self.current.write() = Some(published.clone());
        *committed = sequence;
        drop(committed);

        tracing::debug!(
            sequence,
            path = %published.artifact.path.display(),
            width,
            height,
            "Screenshot published"
        );
        // No subscribers is fine.
        let _ = self.events.send(published.clone());
        Ok(published)
    }
}

impl Default for ScreenshotStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `bytes` to `path`. Overwrites go through a hidden staging file and
/// a rename, so the fixed file is always a complete image.
fn write_artifact(path: &Path, bytes: &[u8], overwrite: bool) -> LivecapResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| LivecapError::persistence(path, e))?;
    }

    if !overwrite {
        return fs::write(path, bytes).map_err(|e| LivecapError::persistence(path, e));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = path.with_file_name(format!(".{file_name}.partial"));
    fs::write(&staging, bytes).map_err(|e| LivecapError::persistence(&staging, e))?;
    if let Err(e) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(LivecapError::persistence(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn capture(tag: &str) -> RawCapture {
        RawCapture::from_png(tag.as_bytes().to_vec(), 4, 3)
    }

    fn files_in(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        files.sort();
        files
    }

    #[test]
    fn empty_store_has_nothing_current() {
        let store = ScreenshotStore::new();
        assert!(store.current().is_none());
        assert_eq!(store.sequence(), 0);
    }

    #[test]
    fn reuse_mode_keeps_one_file_with_latest_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let policy = PersistencePolicy::new(dir.path(), true, CaptureMode::FullScreen);
        let store = ScreenshotStore::new();

        for tag in ["first", "second", "third"] {
            store.publish(capture(tag), Local::now(), &policy).unwrap();
        }

        let files = files_in(dir.path());
        assert_eq!(files, vec![dir.path().join("fullscreen.png")]);
        assert_eq!(fs::read(&files[0]).unwrap(), b"third");

        let current = store.current().unwrap();
        assert_eq!(current.sequence, 3);
        assert_eq!(current.artifact.path, policy.fixed_path());
        assert_eq!(&current.artifact.bytes[..], b"third");
    }

    #[test]
    fn history_mode_keeps_one_file_per_capture() {
        let dir = tempfile::tempdir().unwrap();
        let policy = PersistencePolicy::new(dir.path(), false, CaptureMode::SpecificMonitor);
        let store = ScreenshotStore::new();

        let published: Vec<Published> = ["a", "b", "c"]
            .into_iter()
            .map(|tag| store.publish(capture(tag), Local::now(), &policy).unwrap())
            .collect();

        assert_eq!(files_in(dir.path()).len(), 3);
        for p in &published {
            assert_eq!(fs::read(&p.artifact.path).unwrap(), &p.artifact.bytes[..]);
        }
        let sequences: Vec<u64> = published.iter().map(|p| p.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn failed_write_keeps_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let good = PersistencePolicy::new(dir.path(), true, CaptureMode::FullScreen);
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"file in the way").unwrap();
        let bad = PersistencePolicy::new(&blocker, true, CaptureMode::FullScreen);
        let store = ScreenshotStore::new();

        store.publish(capture("kept"), Local::now(), &good).unwrap();
        let err = store
            .publish(capture("lost"), Local::now(), &bad)
            .unwrap_err();
        assert!(matches!(err, LivecapError::Persistence { .. }));

        let current = store.current().unwrap();
        assert_eq!(current.sequence, 1);
        assert_eq!(&current.artifact.bytes[..], b"kept");

        let next = store.publish(capture("next"), Local::now(), &good).unwrap();
        assert_eq!(next.sequence, 2);
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let dir = tempfile::tempdir().unwrap();
        let policy = PersistencePolicy::new(dir.path(), false, CaptureMode::FullScreen);
        let store = ScreenshotStore::new();
        let later = Local.with_ymd_and_hms(2026, 10, 19, 12, 0, 5).unwrap();
        let earlier = Local.with_ymd_and_hms(2026, 10, 19, 12, 0, 1).unwrap();

        let first = store.publish(capture("a"), later, &policy).unwrap();
        let second = store.publish(capture("b"), earlier, &policy).unwrap();

        assert!(second.artifact.captured_at >= first.artifact.captured_at);
        assert_ne!(first.artifact.path, second.artifact.path);
    }

    #[tokio::test]
    async fn subscribers_see_every_publish() {
        let dir = tempfile::tempdir().unwrap();
        let policy = PersistencePolicy::new(dir.path(), true, CaptureMode::FullScreen);
        let store = ScreenshotStore::new();
        let mut events = store.subscribe();

        store.publish(capture("a"), Local::now(), &policy).unwrap();
        store.publish(capture("b"), Local::now(), &policy).unwrap();

        assert_eq!(events.recv().await.unwrap().sequence, 1);
        let second = events.recv().await.unwrap();
        assert_eq!(second.sequence, 2);
        assert_eq!(&second.artifact.bytes[..], b"b");
    }
}
