//! Clock and timing utilities for the capture loop.
//!
//! Capture timestamps come from the wall clock, but consumers rely on them
//! being monotonically non-decreasing. This module provides:
//! - A wall clock that never steps backwards
//! - Timestamp formats for file names and metadata
//! - Overdue-tick accounting for the interval scheduler

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

/// A wall clock whose readings never go backwards, even if the system
/// clock is adjusted between calls.
#[derive(Debug, Default)]
pub struct WallClock {
    /// Latest reading handed out, in microseconds since the Unix epoch.
    last_micros: AtomicI64,
}

impl WallClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current local time, clamped to the latest reading.
    pub fn now(&self) -> DateTime<Local> {
        self.observe(Local::now())
    }

    /// Clamp an externally produced timestamp so it is not earlier than
    /// anything this clock has already returned.
    pub fn observe(&self, at: DateTime<Local>) -> DateTime<Local> {
        let micros = at.timestamp_micros();
        let previous = self.last_micros.fetch_max(micros, Ordering::SeqCst);
        if previous <= micros {
            return at;
        }
        DateTime::from_timestamp_micros(previous)
            .map(|t| t.with_timezone(&Local))
            .unwrap_or(at)
    }
}

/// Timestamp used in history file names: `2026-10-19_142501_123`.
pub fn file_timestamp(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d_%H%M%S_%3f").to_string()
}

/// Timestamp reported in metadata: `2026-10-19 14:25:01.123`.
pub fn display_timestamp(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Number of whole interval slots that elapsed while a tick was running.
///
/// A tick scheduled at `scheduled` that finished at `finished` occupies its
/// own slot; every further slot that passed is an overdue tick that gets
/// dropped rather than queued.
pub fn missed_ticks(scheduled: Instant, finished: Instant, interval: Duration) -> u64 {
    if interval.is_zero() {
        return 0;
    }
    let busy = finished.saturating_duration_since(scheduled);
    (busy.as_nanos() / interval.as_nanos()) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn wall_clock_never_steps_backwards() {
        let clock = WallClock::new();
        let later = Local.with_ymd_and_hms(2026, 10, 19, 14, 25, 1).unwrap();
        let earlier = Local.with_ymd_and_hms(2026, 10, 19, 14, 24, 0).unwrap();

        assert_eq!(clock.observe(later), later);
        assert_eq!(clock.observe(earlier), later);
    }

    #[test]
    fn wall_clock_readings_are_non_decreasing() {
        let clock = WallClock::new();
        let mut previous = clock.now();
        for _ in 0..1000 {
            let next = clock.now();
            assert!(next >= previous);
            previous = next;
        }
    }

    #[test]
    fn timestamp_formats() {
        let at = Local
            .with_ymd_and_hms(2026, 10, 19, 14, 25, 1)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(123))
            .unwrap();
        assert_eq!(file_timestamp(&at), "2026-10-19_142501_123");
        assert_eq!(display_timestamp(&at), "2026-10-19 14:25:01.123");
    }

    #[test]
    fn missed_ticks_counts_whole_slots() {
        let start = Instant::now();
        let interval = Duration::from_secs(1);
        assert_eq!(missed_ticks(start, start + Duration::from_millis(400), interval), 0);
        assert_eq!(missed_ticks(start, start + Duration::from_millis(1000), interval), 1);
        assert_eq!(missed_ticks(start, start + Duration::from_millis(3500), interval), 3);
        assert_eq!(missed_ticks(start, start, Duration::ZERO), 0);
    }

    proptest::proptest! {
        #[test]
        fn observed_sequence_is_non_decreasing(offsets in proptest::collection::vec(-5_000_000i64..5_000_000, 1..64)) {
            let clock = WallClock::new();
            let base = Local.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
            let mut previous = None;
            for offset in offsets {
                let observed = clock.observe(base + chrono::Duration::microseconds(offset));
                if let Some(previous) = previous {
                    proptest::prop_assert!(observed >= previous);
                }
                previous = Some(observed);
            }
        }
    }
}
