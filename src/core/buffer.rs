//! Bounded event buffer shared by producers and the dispatcher
//!
//! One `parking_lot::Mutex` guards both the pending events and the discard
//! summaries. Producers wait on `not_full`, the dispatcher waits on
//! `not_empty`.

use super::discard::DiscardSummarizer;
use super::log_event::LogEvent;
use super::metrics::RelayMetrics;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// What happened to a submitted event
///
/// Informational only: overflow is never an error for the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The event is in the buffer and will be dispatched
    Enqueued,
    /// The buffer was full; the event was folded into a discard summary
    Discarded,
    /// The producer was waiting for room and got interrupted; the event was
    /// folded into a discard summary
    Interrupted,
}

/// Result of one dispatcher drain
#[derive(Debug)]
pub enum Drain {
    /// Buffered events in arrival order, then one synthetic event per source
    /// that overflowed
    Batch(Vec<LogEvent>),
    /// The relay is closing and nothing is left
    Closed,
    /// The dispatcher was interrupted while waiting for events
    Interrupted,
}

#[derive(Debug)]
struct BufferState {
    events: Vec<LogEvent>,
    discards: DiscardSummarizer,
    capacity: usize,
    blocking: bool,
    closed: bool,
    /// Bumped by `interrupt_waiters`; producers blocked across a bump give up
    interrupt_epoch: u64,
    /// Threads currently running a dispatcher loop
    dispatchers: Vec<ThreadId>,
}

impl BufferState {
    fn has_pending(&self) -> bool {
        !self.events.is_empty() || !self.discards.is_empty()
    }

    fn is_dispatcher(&self, id: ThreadId) -> bool {
        self.dispatchers.contains(&id)
    }
}

#[derive(Debug)]
pub struct EventBuffer {
    state: Mutex<BufferState>,
    not_empty: Condvar,
    not_full: Condvar,
    metrics: Arc<RelayMetrics>,
}

impl EventBuffer {
    /// `capacity` is clamped to at least one
    pub fn new(capacity: usize, blocking: bool, metrics: Arc<RelayMetrics>) -> Self {
        Self {
            state: Mutex::new(BufferState {
                events: Vec::with_capacity(capacity.clamp(1, 1024)),
                discards: DiscardSummarizer::new(),
                capacity: capacity.max(1),
                blocking,
                closed: false,
                interrupt_epoch: 0,
                dispatchers: Vec::new(),
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            metrics,
        }
    }

    /// Admit an event, waiting for room only under the blocking policy.
    ///
    /// A full buffer never waits when the relay is closing, when the caller
    /// is a dispatcher thread, or when the wait gets interrupted; the event
    /// is summarized as discarded instead.
    pub fn submit(&self, event: LogEvent) -> Admission {
        let current = thread::current().id();
        let mut state = self.state.lock();
        let epoch = state.interrupt_epoch;

        loop {
            let previous_size = state.events.len();
            if previous_size < state.capacity {
                state.events.push(event);
                if previous_size == 0 {
                    self.not_empty.notify_all();
                }
                return Admission::Enqueued;
            }

            if state.blocking && !state.closed && !state.is_dispatcher(current) {
                self.metrics.record_blocked_wait();
                self.not_full.wait(&mut state);

                if state.interrupt_epoch != epoch {
                    self.metrics.record_interrupted_wait();
                    tracing::warn!(
                        source = %event.source,
                        "producer interrupted while waiting for buffer space; discarding event"
                    );
                    self.discard(&mut state, event);
                    return Admission::Interrupted;
                }
                continue;
            }

            self.discard(&mut state, event);
            return Admission::Discarded;
        }
    }

    fn discard(&self, state: &mut BufferState, event: LogEvent) {
        self.metrics.record_discarded();
        state.discards.record_discard(event);
    }

    /// Take everything pending, waiting while the buffer is empty and the
    /// relay is still active.
    ///
    /// Only dispatcher threads call this. `interrupted` is checked each time
    /// the caller is about to wait.
    pub fn drain_all(&self, interrupted: &AtomicBool) -> Drain {
        let mut state = self.state.lock();

        while !state.has_pending() && !state.closed {
            if interrupted.load(Ordering::Acquire) {
                return Drain::Interrupted;
            }
            self.not_empty.wait(&mut state);
        }

        if !state.has_pending() {
            return Drain::Closed;
        }

        let mut batch = std::mem::take(&mut state.events);
        let summaries = state.discards.drain();
        if !summaries.is_empty() {
            self.metrics
                .record_discard_summaries(summaries.len() as u64);
            batch.extend(summaries);
        }
        self.not_full.notify_all();

        Drain::Batch(batch)
    }

    /// Mark the relay as closing and wake every waiter
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Abort every producer currently waiting for room
    pub fn interrupt_waiters(&self) {
        let mut state = self.state.lock();
        state.interrupt_epoch = state.interrupt_epoch.wrapping_add(1);
        self.not_full.notify_all();
    }

    /// Wake dispatchers so they re-check their interrupt flag
    pub fn wake_dispatchers(&self) {
        let _state = self.state.lock();
        self.not_empty.notify_all();
    }

    /// Change capacity; existing events stay, blocked producers re-check.
    pub fn set_capacity(&self, capacity: usize) {
        let mut state = self.state.lock();
        state.capacity = capacity.max(1);
        self.not_full.notify_all();
    }

    /// Change capacity and policy together under one lock acquisition
    pub fn reconfigure(&self, capacity: usize, blocking: bool) {
        let mut state = self.state.lock();
        state.capacity = capacity.max(1);
        state.blocking = blocking;
        self.not_full.notify_all();
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().capacity
    }

    pub fn set_blocking(&self, blocking: bool) {
        let mut state = self.state.lock();
        state.blocking = blocking;
        self.not_full.notify_all();
    }

    pub fn is_blocking(&self) -> bool {
        self.state.lock().blocking
    }

    /// Events currently buffered
    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discards not yet turned into summary events
    pub fn pending_discards(&self) -> u64 {
        self.state.lock().discards.total_discarded()
    }

    /// Anything a drain would still deliver: events or discard summaries
    pub fn has_pending(&self) -> bool {
        self.state.lock().has_pending()
    }

    pub(crate) fn register_dispatcher(&self, id: ThreadId) {
        self.state.lock().dispatchers.push(id);
    }

    pub(crate) fn unregister_dispatcher(&self, id: ThreadId) {
        self.state.lock().dispatchers.retain(|d| *d != id);
    }

    pub(crate) fn is_dispatcher_thread(&self, id: ThreadId) -> bool {
        self.state.lock().is_dispatcher(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::LogLevel;
    use std::time::Duration;

    fn buffer(capacity: usize, blocking: bool) -> Arc<EventBuffer> {
        Arc::new(EventBuffer::new(
            capacity,
            blocking,
            Arc::new(RelayMetrics::new()),
        ))
    }

    fn event(source: &str, message: &str) -> LogEvent {
        LogEvent::new(source, LogLevel::Info, message)
    }

    fn batch(drain: Drain) -> Vec<LogEvent> {
        match drain {
            Drain::Batch(events) => events,
            other => panic!("expected a batch, got {:?}", other),
        }
    }

    #[test]
    fn test_submit_within_capacity() {
        let buffer = buffer(4, false);
        for i in 0..4 {
            assert_eq!(buffer.submit(event("app", &i.to_string())), Admission::Enqueued);
        }
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn test_overflow_discards_without_blocking() {
        let buffer = buffer(2, false);
        buffer.submit(event("app", "0"));
        buffer.submit(event("app", "1"));

        assert_eq!(buffer.submit(event("app", "2")), Admission::Discarded);
        assert_eq!(buffer.submit(event("other", "3")), Admission::Discarded);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.pending_discards(), 2);
    }

    #[test]
    fn test_drain_orders_real_events_before_summaries() {
        let buffer = buffer(2, false);
        buffer.submit(event("b", "first"));
        buffer.submit(event("a", "second"));
        buffer.submit(event("z", "lost"));
        buffer.submit(event("a", "lost too"));

        let events = batch(buffer.drain_all(&AtomicBool::new(false)));
        let messages: Vec<_> = events.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages[..2], ["first", "second"]);
        assert_eq!(events[2].source, "a");
        assert_eq!(events[3].source, "z");
        assert!(events[2].message.starts_with("Discarded 1 messages"));
        assert!(buffer.is_empty());
        assert_eq!(buffer.pending_discards(), 0);
    }

    #[test]
    fn test_drain_returns_closed_when_empty_and_closing() {
        let buffer = buffer(2, false);
        buffer.submit(event("app", "pending"));
        buffer.close();

        assert_eq!(batch(buffer.drain_all(&AtomicBool::new(false))).len(), 1);
        assert!(matches!(buffer.drain_all(&AtomicBool::new(false)), Drain::Closed));
    }

    #[test]
    fn test_drain_interrupted_only_when_idle() {
        let buffer = buffer(2, false);
        let interrupted = AtomicBool::new(true);
        buffer.submit(event("app", "pending"));

        assert_eq!(batch(buffer.drain_all(&interrupted)).len(), 1);
        assert!(matches!(buffer.drain_all(&interrupted), Drain::Interrupted));
    }

    #[test]
    fn test_drain_waits_for_first_event() {
        let buffer = buffer(2, false);
        let producer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                buffer.submit(event("app", "late"));
            })
        };

        let events = batch(buffer.drain_all(&AtomicBool::new(false)));
        assert_eq!(events[0].message, "late");
        producer.join().unwrap();
    }

    #[test]
    fn test_blocking_submit_waits_for_room() {
        let buffer = buffer(1, true);
        buffer.submit(event("app", "fills"));

        let producer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.submit(event("app", "waits")))
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(batch(buffer.drain_all(&AtomicBool::new(false))).len(), 1);

        assert_eq!(producer.join().unwrap(), Admission::Enqueued);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.pending_discards(), 0);
    }

    #[test]
    fn test_interrupted_waiter_discards() {
        let buffer = buffer(1, true);
        buffer.submit(event("app", "fills"));

        let producer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.submit(event("app", "interrupted")))
        };

        while buffer.metrics.blocked_waits() == 0 {
            thread::sleep(Duration::from_millis(5));
        }
        buffer.interrupt_waiters();

        assert_eq!(producer.join().unwrap(), Admission::Interrupted);
        assert_eq!(buffer.pending_discards(), 1);
        assert_eq!(buffer.metrics.interrupted_waits(), 1);
    }

    #[test]
    fn test_close_releases_blocked_producer() {
        let buffer = buffer(1, true);
        buffer.submit(event("app", "fills"));

        let producer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.submit(event("app", "closing")))
        };

        while buffer.metrics.blocked_waits() == 0 {
            thread::sleep(Duration::from_millis(5));
        }
        buffer.close();

        assert_eq!(producer.join().unwrap(), Admission::Discarded);
    }

    #[test]
    fn test_dispatcher_thread_never_blocks() {
        let buffer = buffer(1, true);
        buffer.submit(event("app", "fills"));
        buffer.register_dispatcher(thread::current().id());

        assert_eq!(buffer.submit(event("app", "from dispatcher")), Admission::Discarded);

        buffer.unregister_dispatcher(thread::current().id());
        assert!(!buffer.is_dispatcher_thread(thread::current().id()));
    }

    #[test]
    fn test_capacity_change_keeps_events_and_wakes_producers() {
        let buffer = buffer(1, true);
        buffer.submit(event("app", "fills"));

        let producer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.submit(event("app", "admitted after resize")))
        };

        while buffer.metrics.blocked_waits() == 0 {
            thread::sleep(Duration::from_millis(5));
        }
        buffer.set_capacity(2);

        assert_eq!(producer.join().unwrap(), Admission::Enqueued);
        assert_eq!(buffer.len(), 2);

        buffer.set_capacity(1);
        buffer.set_blocking(false);
        assert_eq!(buffer.len(), 2, "shrinking never evicts");
        assert_eq!(buffer.submit(event("app", "over")), Admission::Discarded);
    }
}
