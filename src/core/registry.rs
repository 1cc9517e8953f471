//! Ordered, name-addressable collection of attached sinks

use super::error::RelayError;
use super::log_event::LogEvent;
use super::metrics::RelayMetrics;
use super::sink::Sink;
use parking_lot::RwLock;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared handle to an attached sink
pub type SinkHandle = Arc<dyn Sink>;

/// Extract a printable message from a caught panic payload
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Sinks in registration order, guarded by their own lock
///
/// Fan-out works on a snapshot of the handles, so a slow or re-entrant sink
/// never holds the registry lock.
pub struct SinkRegistry {
    sinks: RwLock<Vec<SinkHandle>>,
    metrics: Arc<RelayMetrics>,
    closed: AtomicBool,
    close_after_drain: AtomicBool,
}

impl SinkRegistry {
    pub fn new(metrics: Arc<RelayMetrics>) -> Self {
        Self {
            sinks: RwLock::new(Vec::new()),
            metrics,
            closed: AtomicBool::new(false),
            close_after_drain: AtomicBool::new(false),
        }
    }

    /// Append a sink; returns `false` if this exact sink is already attached
    pub fn add(&self, sink: SinkHandle) -> bool {
        let mut sinks = self.sinks.write();
        if sinks.iter().any(|s| Arc::ptr_eq(s, &sink)) {
            return false;
        }
        sinks.push(sink);
        true
    }

    /// Detach a sink by identity without closing it
    pub fn remove(&self, sink: &SinkHandle) -> bool {
        let mut sinks = self.sinks.write();
        let before = sinks.len();
        sinks.retain(|s| !Arc::ptr_eq(s, sink));
        sinks.len() != before
    }

    /// Detach the first sink with this name without closing it
    pub fn remove_by_name(&self, name: &str) -> Option<SinkHandle> {
        let mut sinks = self.sinks.write();
        let index = sinks.iter().position(|s| s.name() == name)?;
        Some(sinks.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<SinkHandle> {
        self.sinks.read().iter().find(|s| s.name() == name).cloned()
    }

    pub fn is_attached(&self, sink: &SinkHandle) -> bool {
        self.sinks.read().iter().any(|s| Arc::ptr_eq(s, sink))
    }

    /// Snapshot of the attached sinks in registration order
    pub fn all(&self) -> Vec<SinkHandle> {
        self.sinks.read().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.sinks.read().iter().map(|s| s.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.read().is_empty()
    }

    /// Detach and close every sink
    pub fn remove_all(&self) {
        let sinks = std::mem::take(&mut *self.sinks.write());
        for sink in &sinks {
            self.guarded(sink.as_ref(), "close", || sink.close());
        }
    }

    /// Deliver one event to every sink in order.
    ///
    /// Each delivery is isolated: errors and panics are reported and counted
    /// but never stop the remaining sinks. Returns the number of sinks that
    /// accepted the event.
    pub fn append_loop(&self, event: &LogEvent) -> usize {
        let sinks = self.all();
        sinks
            .iter()
            .filter(|sink| self.guarded(sink.as_ref(), "append", || sink.append(event)))
            .count()
    }

    pub fn flush_all(&self) {
        for sink in self.all() {
            self.guarded(sink.as_ref(), "flush", || sink.flush());
        }
    }

    /// Close every attached sink; they stay registered
    pub fn close_all(&self) {
        for sink in self.all() {
            self.guarded(sink.as_ref(), "close", || sink.close());
        }
    }

    /// Close every attached sink the first time this is called.
    ///
    /// Returns `true` only for the call that actually closed them.
    pub fn close_once(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.close_all();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Leave closing to the dispatcher once it has drained the buffer
    pub(crate) fn defer_close(&self) {
        self.close_after_drain.store(true, Ordering::Release);
    }

    pub(crate) fn close_if_deferred(&self) -> bool {
        self.close_after_drain.load(Ordering::Acquire) && self.close_once()
    }

    fn guarded<F>(&self, sink: &dyn Sink, operation: &'static str, call: F) -> bool
    where
        F: FnOnce() -> super::error::Result<()>,
    {
        let error = match catch_unwind(AssertUnwindSafe(call)) {
            Ok(Ok(())) => return true,
            Ok(Err(e)) => RelayError::sink(sink.name(), e.to_string()),
            Err(payload) => RelayError::sink_panicked(sink.name(), panic_message(payload.as_ref())),
        };

        self.metrics.record_sink_failure();
        tracing::error!(
            sink = sink.name(),
            operation,
            error = %error,
            "sink operation failed; continuing with remaining sinks"
        );
        false
    }
}

impl std::fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkRegistry")
            .field("sinks", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Result;
    use crate::core::log_level::LogLevel;
    use parking_lot::Mutex;

    struct Recording {
        name: String,
        seen: Mutex<Vec<String>>,
        closed: Mutex<u32>,
    }

    impl Recording {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                seen: Mutex::new(Vec::new()),
                closed: Mutex::new(0),
            })
        }
    }

    impl Sink for Recording {
        fn append(&self, event: &LogEvent) -> Result<()> {
            self.seen.lock().push(event.message.clone());
            Ok(())
        }

        fn close(&self) -> Result<()> {
            *self.closed.lock() += 1;
            Ok(())
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    struct Failing {
        panic: bool,
    }

    impl Sink for Failing {
        fn append(&self, _event: &LogEvent) -> Result<()> {
            if self.panic {
                panic!("sink exploded");
            }
            Err(RelayError::other("Simulated failure"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn registry() -> SinkRegistry {
        SinkRegistry::new(Arc::new(RelayMetrics::new()))
    }

    #[test]
    fn test_add_preserves_order_and_ignores_duplicates() {
        let registry = registry();
        let first: SinkHandle = Recording::new("first");
        let second: SinkHandle = Recording::new("second");

        assert!(registry.add(Arc::clone(&first)));
        assert!(registry.add(Arc::clone(&second)));
        assert!(!registry.add(Arc::clone(&first)));

        assert_eq!(registry.names(), vec!["first", "second"]);
        assert!(registry.is_attached(&first));
    }

    #[test]
    fn test_lookup_and_remove() {
        let registry = registry();
        let first: SinkHandle = Recording::new("first");
        registry.add(Arc::clone(&first));
        registry.add(Recording::new("second"));

        assert!(registry.get("second").is_some());
        assert!(registry.get("missing").is_none());

        assert!(registry.remove(&first));
        assert!(!registry.remove(&first));
        assert!(registry.remove_by_name("second").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_append_loop_isolates_failures() {
        let registry = registry();
        let recording = Recording::new("recording");
        registry.add(Arc::new(Failing { panic: false }));
        registry.add(Arc::new(Failing { panic: true }));
        registry.add(recording.clone());

        let delivered = registry.append_loop(&LogEvent::new("app", LogLevel::Info, "hello"));

        assert_eq!(delivered, 1);
        assert_eq!(*recording.seen.lock(), vec!["hello".to_string()]);
        assert_eq!(registry.metrics.sink_failures(), 2);
    }

    #[test]
    fn test_remove_all_closes_sinks() {
        let registry = registry();
        let recording = Recording::new("recording");
        registry.add(recording.clone());

        registry.remove_all();

        assert!(registry.is_empty());
        assert_eq!(*recording.closed.lock(), 1);
    }

    #[test]
    fn test_close_all_keeps_sinks_registered() {
        let registry = registry();
        let recording = Recording::new("recording");
        registry.add(recording.clone());

        registry.close_all();

        assert_eq!(registry.len(), 1);
        assert_eq!(*recording.closed.lock(), 1);
    }

    #[test]
    fn test_close_once_and_deferred_close() {
        let registry = registry();
        let recording = Recording::new("recording");
        registry.add(recording.clone());

        assert!(!registry.close_if_deferred());
        assert_eq!(*recording.closed.lock(), 0);

        registry.defer_close();
        assert!(registry.close_if_deferred());
        assert!(!registry.close_once());
        assert!(registry.is_closed());
        assert_eq!(*recording.closed.lock(), 1);
    }
}
