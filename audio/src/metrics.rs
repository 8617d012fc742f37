//! Audio health monitoring and diagnostics
//!
//! The device callback only bumps relaxed counters in [`CallbackStats`].
//! They are cumulative and never reset. The game thread diffs them against
//! the previous report in [`AudioMetrics`] and logs at most once per
//! interval, so starvation is reported without ever logging from the
//! real-time thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Counters written by the device callback
#[derive(Debug, Default)]
pub struct CallbackStats {
    callbacks: AtomicU64,
    underruns: AtomicU64,
    partial_underruns: AtomicU64,
    starved_samples: AtomicU64,
}

/// Point-in-time copy of [`CallbackStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Callback invocations
    pub callbacks: u64,
    /// Callbacks that found nothing to read and emitted pure silence
    pub underruns: u64,
    /// Callbacks that ran out of samples part-way through
    pub partial_underruns: u64,
    /// Mono samples replaced by silence
    pub starved_samples: u64,
}

impl CallbackStats {
    /// Record one callback that copied `copied` of `requested` mono samples.
    pub(crate) fn record(&self, requested: usize, copied: usize) {
        self.callbacks.fetch_add(1, Ordering::Relaxed);
        if requested == 0 || copied >= requested {
            return;
        }
        if copied == 0 {
            self.underruns.fetch_add(1, Ordering::Relaxed);
        } else {
            self.partial_underruns.fetch_add(1, Ordering::Relaxed);
        }
        self.starved_samples
            .fetch_add((requested - copied) as u64, Ordering::Relaxed);
    }

    /// Read the counters without resetting them.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            callbacks: self.callbacks.load(Ordering::Relaxed),
            underruns: self.underruns.load(Ordering::Relaxed),
            partial_underruns: self.partial_underruns.load(Ordering::Relaxed),
            starved_samples: self.starved_samples.load(Ordering::Relaxed),
        }
    }

}

impl StatsSnapshot {
    /// Counts accumulated between `earlier` and `self`.
    pub fn since(&self, earlier: &StatsSnapshot) -> StatsSnapshot {
        StatsSnapshot {
            callbacks: self.callbacks.saturating_sub(earlier.callbacks),
            underruns: self.underruns.saturating_sub(earlier.underruns),
            partial_underruns: self
                .partial_underruns
                .saturating_sub(earlier.partial_underruns),
            starved_samples: self.starved_samples.saturating_sub(earlier.starved_samples),
        }
    }
}

/// How often metrics are summarised in the log
const LOG_INTERVAL: Duration = Duration::from_secs(1);

/// Game-thread side metrics for the mixer
#[derive(Debug, Clone)]
pub(crate) struct AudioMetrics {
    /// Mix steps since last log
    pub steps: u64,
    /// Samples mixed since last log
    pub samples_mixed: u64,
    /// Minimum buffered fill seen before a step
    pub buffered_min: usize,
    /// Maximum buffered fill seen before a step
    pub buffered_max: usize,
    /// Callback totals at the last log
    pub last_callback: StatsSnapshot,
    /// Timestamp of last metrics log
    pub last_log_time: Instant,
}

impl AudioMetrics {
    pub fn new() -> Self {
        Self {
            steps: 0,
            samples_mixed: 0,
            buffered_min: usize::MAX,
            buffered_max: 0,
            last_callback: StatsSnapshot::default(),
            last_log_time: Instant::now(),
        }
    }

    /// Account for one mix step that found `buffered` samples and added `mixed`.
    pub fn record_step(&mut self, buffered: usize, mixed: usize) {
        self.steps += 1;
        self.samples_mixed += mixed as u64;
        self.buffered_min = self.buffered_min.min(buffered);
        self.buffered_max = self.buffered_max.max(buffered);
    }

    /// Log and reset if the interval has passed.
    ///
    /// Returns the callback counts for the elapsed interval when a log
    /// happened. The shared counters are left untouched.
    pub fn maybe_log(&mut self, stats: &CallbackStats, capacity: usize) -> Option<StatsSnapshot> {
        if self.last_log_time.elapsed() < LOG_INTERVAL {
            return None;
        }

        let total = stats.snapshot();
        let callback = total.since(&self.last_callback);
        if callback.underruns > 0 || callback.partial_underruns > 0 {
            warn!(
                "audio starvation: {} empty and {} short callbacks, {} samples of silence \
                 (buffered min={}, max={} of {})",
                callback.underruns,
                callback.partial_underruns,
                callback.starved_samples,
                self.buffered_min,
                self.buffered_max,
                capacity
            );
        } else {
            debug!(
                "audio metrics: steps={}, mixed={}, callbacks={}, buffered min={}, max={} of {}",
                self.steps,
                self.samples_mixed,
                callback.callbacks,
                self.buffered_min,
                self.buffered_max,
                capacity
            );
        }

        self.steps = 0;
        self.samples_mixed = 0;
        self.buffered_min = usize::MAX;
        self.buffered_max = 0;
        self.last_callback = total;
        self.last_log_time = Instant::now();
        Some(callback)
    }
}
