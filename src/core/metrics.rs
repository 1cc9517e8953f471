//! Relay metrics for observability
//!
//! Counters for submissions, deliveries, discards, sink failures and
//! dispatcher restarts.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for relay observability
///
/// # Example
///
/// ```
/// use rust_log_relay::RelayMetrics;
///
/// let metrics = RelayMetrics::new();
///
/// metrics.record_submitted();
/// metrics.record_discarded();
///
/// assert_eq!(metrics.submitted(), 1);
/// assert_eq!(metrics.discarded(), 1);
/// ```
#[derive(Debug)]
pub struct RelayMetrics {
    /// Events handed to `submit`
    submitted: AtomicU64,

    /// Events forwarded to the sink registry by a dispatcher
    delivered: AtomicU64,

    /// Events recorded in a discard summary instead of the buffer
    discarded: AtomicU64,

    /// Synthetic discard-summary events produced by drains
    discard_summaries: AtomicU64,

    /// Individual sink append/flush/close failures (errors and panics)
    sink_failures: AtomicU64,

    /// Times a producer waited for buffer space
    blocked_waits: AtomicU64,

    /// Producer waits abandoned because of an interrupt
    interrupted_waits: AtomicU64,

    /// Dispatchers started after the first one
    dispatcher_restarts: AtomicU64,
}

impl RelayMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            discard_summaries: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            blocked_waits: AtomicU64::new(0),
            interrupted_waits: AtomicU64::new(0),
            dispatcher_restarts: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn discard_summaries(&self) -> u64 {
        self.discard_summaries.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn blocked_waits(&self) -> u64 {
        self.blocked_waits.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn interrupted_waits(&self) -> u64 {
        self.interrupted_waits.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dispatcher_restarts(&self) -> u64 {
        self.dispatcher_restarts.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_submitted(&self) -> u64 {
        self.submitted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_discarded(&self) -> u64 {
        self.discarded.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_discard_summaries(&self, count: u64) -> u64 {
        self.discard_summaries.fetch_add(count, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_failure(&self) -> u64 {
        self.sink_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_blocked_wait(&self) -> u64 {
        self.blocked_waits.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_interrupted_wait(&self) -> u64 {
        self.interrupted_waits.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatcher_restart(&self) -> u64 {
        self.dispatcher_restarts.fetch_add(1, Ordering::Relaxed)
    }

    /// Discarded events as a percentage of submitted events (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been submitted.
    pub fn drop_rate(&self) -> f64 {
        let submitted = self.submitted() as f64;
        if submitted == 0.0 {
            0.0
        } else {
            (self.discarded() as f64 / submitted) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.submitted.store(0, Ordering::Relaxed);
        self.delivered.store(0, Ordering::Relaxed);
        self.discarded.store(0, Ordering::Relaxed);
        self.discard_summaries.store(0, Ordering::Relaxed);
        self.sink_failures.store(0, Ordering::Relaxed);
        self.blocked_waits.store(0, Ordering::Relaxed);
        self.interrupted_waits.store(0, Ordering::Relaxed);
        self.dispatcher_restarts.store(0, Ordering::Relaxed);
    }
}

impl Default for RelayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RelayMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            submitted: AtomicU64::new(self.submitted()),
            delivered: AtomicU64::new(self.delivered()),
            discarded: AtomicU64::new(self.discarded()),
            discard_summaries: AtomicU64::new(self.discard_summaries()),
            sink_failures: AtomicU64::new(self.sink_failures()),
            blocked_waits: AtomicU64::new(self.blocked_waits()),
            interrupted_waits: AtomicU64::new(self.interrupted_waits()),
            dispatcher_restarts: AtomicU64::new(self.dispatcher_restarts()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = RelayMetrics::new();
        assert_eq!(metrics.submitted(), 0);
        assert_eq!(metrics.delivered(), 0);
        assert_eq!(metrics.discarded(), 0);
        assert_eq!(metrics.dispatcher_restarts(), 0);
    }

    #[test]
    fn test_record_returns_previous_value() {
        let metrics = RelayMetrics::new();
        assert_eq!(metrics.record_discarded(), 0);
        assert_eq!(metrics.record_discarded(), 1);
        assert_eq!(metrics.discarded(), 2);
        metrics.record_discard_summaries(3);
        assert_eq!(metrics.discard_summaries(), 3);
    }

    #[test]
    fn test_drop_rate() {
        let metrics = RelayMetrics::new();
        assert_eq!(metrics.drop_rate(), 0.0);

        for _ in 0..100 {
            metrics.record_submitted();
        }
        for _ in 0..10 {
            metrics.record_discarded();
        }
        let rate = metrics.drop_rate();
        assert!((9.9..=10.1).contains(&rate), "Drop rate was {}", rate);
    }

    #[test]
    fn test_reset_and_snapshot() {
        let metrics = RelayMetrics::new();
        metrics.record_submitted();
        metrics.record_sink_failure();

        let snapshot = metrics.clone();
        metrics.reset();

        assert_eq!(metrics.submitted(), 0);
        assert_eq!(metrics.sink_failures(), 0);
        assert_eq!(snapshot.submitted(), 1);
        assert_eq!(snapshot.sink_failures(), 1);
    }
}
