//! Time sources for the session engine.
//!
//! All interval math works on millisecond timestamps from a [`Clock`]. Live
//! elapsed time is always derived from an absolute start timestamp, so the
//! clock is the only thing that has to be right.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Local, Utc};

use crate::aggregate::DateKey;

/// Supplies timestamps and the current calendar date.
pub trait Clock {
    /// Milliseconds since the Unix epoch. Never decreases.
    fn now_ms(&self) -> u64;

    /// The calendar date commits are filed under.
    fn today(&self) -> DateKey;
}

/// Wall clock anchored to a monotonic [`Instant`].
///
/// The wall-clock reading is taken once at construction; later readings add
/// monotonic elapsed time to it, so a system clock adjustment mid-session
/// cannot produce negative intervals.
#[derive(Debug, Clone)]
pub struct SystemClock {
    anchor: Instant,
    anchor_ms: u64,
}

impl SystemClock {
    pub fn new() -> Self {
        let anchor_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        Self {
            anchor: Instant::now(),
            anchor_ms,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        let elapsed = u64::try_from(self.anchor.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.anchor_ms.saturating_add(elapsed)
    }

    fn today(&self) -> DateKey {
        DateKey::new(Local::now().date_naive())
    }
}

/// Manually driven clock for tests and replays.
///
/// Clones share the same reading, so a test can keep a handle while the
/// engine owns another. [`Clock::today`] is the UTC date of the current
/// reading, which keeps date keys independent of the host time zone.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        let ms = u64::try_from(start.timestamp_millis()).unwrap_or(0);
        Self {
            now_ms: Arc::new(AtomicU64::new(ms)),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn today(&self) -> DateKey {
        let ms = i64::try_from(self.now_ms()).unwrap_or(i64::MAX);
        let date = DateTime::from_timestamp_millis(ms)
            .unwrap_or_default()
            .date_naive();
        DateKey::new(date)
    }
}
