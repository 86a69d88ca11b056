//! Recurring background tasks and countdown arithmetic.
//!
//! Periodic maintenance (cleanup sweeps, lobby refreshes) runs as a
//! [`RecurringTask`]: a spawned loop with an explicit handle that stops
//! it, instead of an uninterruptible polling loop. Countdown display and
//! turn deadlines are derived from the authoritative timestamps in the
//! shared record via [`remaining`] — never from an independently ticking
//! local counter, so every client computes the same remaining time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Countdown arithmetic
// ---------------------------------------------------------------------------

/// Time remaining in a turn, computed from the record's authoritative
/// timestamps. Saturates at zero once the deadline has passed.
///
/// All arguments are epoch milliseconds as stored in the room record.
pub fn remaining(now_ms: u64, turn_start_ms: u64, limit_ms: u64) -> Duration {
    let deadline = turn_start_ms.saturating_add(limit_ms);
    Duration::from_millis(deadline.saturating_sub(now_ms))
}

// ---------------------------------------------------------------------------
// Recurring tasks
// ---------------------------------------------------------------------------

/// Configuration for a recurring task.
#[derive(Debug, Clone)]
pub struct RecurringConfig {
    /// Time between the end of one run and the start of the next.
    pub interval: Duration,
    /// Random delay (0–max) before the first run, so identical tasks
    /// started by many clients at once do not all sweep together.
    pub initial_jitter: Duration,
}

impl RecurringConfig {
    /// A config with the given interval and no jitter.
    pub fn every(interval: Duration) -> Self {
        Self { interval, initial_jitter: Duration::ZERO }
    }

    /// Sets the initial jitter window.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.initial_jitter = jitter;
        self
    }
}

/// Handle to a running recurring task. Dropping the handle does NOT stop
/// the task; call [`RecurringTask::stop`] for an orderly shutdown.
pub struct RecurringTask {
    name: &'static str,
    stop_tx: watch::Sender<bool>,
    runs: Arc<AtomicU64>,
}

impl RecurringTask {
    /// Spawns a loop that runs `work` every `config.interval`.
    ///
    /// The first run happens after the jitter delay plus one interval.
    /// A run that takes longer than the interval is logged as an overrun
    /// but never skipped or overlapped — the next run is simply late.
    pub fn spawn<F, Fut>(
        name: &'static str,
        config: RecurringConfig,
        mut work: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let runs = Arc::new(AtomicU64::new(0));
        let run_counter = Arc::clone(&runs);

        let jitter = if config.initial_jitter > Duration::ZERO {
            let max_us = config.initial_jitter.as_micros() as u64;
            Duration::from_micros(rand::rng().random_range(0..max_us))
        } else {
            Duration::ZERO
        };

        tokio::spawn(async move {
            debug!(task = name, interval = ?config.interval, "recurring task started");
            tokio::select! {
                _ = tokio::time::sleep(jitter) => {}
                _ = stop_rx.changed() => return,
            }

            loop {
                tokio::select! {
                    _ = tokio::time::sleep(config.interval) => {}
                    _ = stop_rx.changed() => break,
                }

                let started = tokio::time::Instant::now();
                work().await;
                run_counter.fetch_add(1, Ordering::Relaxed);

                let elapsed = started.elapsed();
                if elapsed > config.interval {
                    warn!(
                        task = name,
                        elapsed_ms = elapsed.as_millis() as u64,
                        interval_ms = config.interval.as_millis() as u64,
                        "recurring task overran its interval"
                    );
                }
            }
            debug!(task = name, "recurring task stopped");
        });

        Self { name, stop_tx, runs }
    }

    /// Signals the loop to stop. A run already in progress completes.
    pub fn stop(&self) {
        if self.stop_tx.send(true).is_ok() {
            debug!(task = self.name, "stop requested");
        }
    }

    /// Whether the loop is still alive.
    pub fn is_running(&self) -> bool {
        !*self.stop_tx.borrow() && self.stop_tx.receiver_count() > 0
    }

    /// Number of completed runs so far.
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_counts_down() {
        assert_eq!(remaining(1_000, 1_000, 15_000), Duration::from_millis(15_000));
        assert_eq!(remaining(6_000, 1_000, 15_000), Duration::from_millis(10_000));
    }

    #[test]
    fn test_remaining_saturates_at_zero() {
        assert_eq!(remaining(20_000, 1_000, 15_000), Duration::ZERO);
        // Clock skew: a turn_start in the local future still yields a
        // bounded value rather than underflowing.
        assert_eq!(remaining(0, 1_000, 15_000), Duration::from_millis(16_000));
    }
}
