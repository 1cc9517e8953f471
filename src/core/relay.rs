//! Asynchronous relay: bounded buffer, dispatcher lifecycle and sinks

use super::{
    buffer::{Admission, EventBuffer},
    config::{effective_capacity, RelayConfig},
    dispatcher::{self, DispatcherHandle, DEFAULT_THREAD_NAME_PREFIX},
    error::Result,
    log_event::{LogEvent, LogRecord},
    metrics::RelayMetrics,
    overflow_policy::OverflowPolicy,
    registry::{SinkHandle, SinkRegistry},
    sink::Sink,
};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

/// Decouples logging threads from slow sinks
///
/// Producers hand events to [`submit`](Relay::submit); a single background
/// dispatcher drains them in batches and fans each event out to every
/// attached sink in registration order. When the buffer is full, events are
/// either summarized as discarded (default) or the producer waits
/// ([`OverflowPolicy::Block`]).
///
/// # Example
///
/// ```
/// use rust_log_relay::prelude::*;
/// use std::sync::Arc;
///
/// let memory = Arc::new(MemorySink::new("memory"));
/// let relay = Relay::builder()
///     .buffer_size(64)
///     .sink_handle(memory.clone())
///     .build()
///     .unwrap();
///
/// relay.submit(LogRecord::new("app", LogLevel::Info, "started"));
/// relay.close();
///
/// assert_eq!(memory.messages(), vec!["started".to_string()]);
/// ```
pub struct Relay {
    buffer: Arc<EventBuffer>,
    registry: Arc<SinkRegistry>,
    metrics: Arc<RelayMetrics>,
    dispatcher: Mutex<DispatcherSlot>,
    dispatcher_joined: Condvar,
    location_info: AtomicBool,
    closing: AtomicBool,
    thread_name_prefix: String,
    dispatchers_started: AtomicU64,
}

/// The current dispatcher, or the fact that `close` is joining it.
///
/// While `joining` is set the handle is out of the slot but its thread may
/// still be delivering, so nobody may start another dispatcher.
#[derive(Debug, Default)]
struct DispatcherSlot {
    handle: Option<DispatcherHandle>,
    joining: bool,
}

impl DispatcherSlot {
    fn is_running(&self) -> bool {
        self.joining || self.handle.as_ref().is_some_and(DispatcherHandle::is_alive)
    }
}

impl Relay {
    /// Create a relay and start its dispatcher
    pub fn new(config: RelayConfig) -> Result<Self> {
        Self::with_thread_name_prefix(config, DEFAULT_THREAD_NAME_PREFIX)
    }

    fn with_thread_name_prefix(config: RelayConfig, prefix: &str) -> Result<Self> {
        let capacity = config.effective_capacity()?;
        let metrics = Arc::new(RelayMetrics::new());

        let relay = Self {
            buffer: Arc::new(EventBuffer::new(
                capacity,
                config.blocking,
                Arc::clone(&metrics),
            )),
            registry: Arc::new(SinkRegistry::new(Arc::clone(&metrics))),
            metrics,
            dispatcher: Mutex::new(DispatcherSlot::default()),
            dispatcher_joined: Condvar::new(),
            location_info: AtomicBool::new(config.location_info),
            closing: AtomicBool::new(false),
            thread_name_prefix: prefix.to_string(),
            dispatchers_started: AtomicU64::new(0),
        };

        let first = relay.spawn_dispatcher()?;
        relay.dispatcher.lock().handle = Some(first);
        Ok(relay)
    }

    /// Create a builder for Relay
    #[must_use]
    pub fn builder() -> RelayBuilder {
        RelayBuilder::new()
    }

    fn spawn_dispatcher(&self) -> Result<DispatcherHandle> {
        let n = self.dispatchers_started.fetch_add(1, Ordering::Relaxed);
        dispatcher::spawn(
            format!("{}-{}", self.thread_name_prefix, n),
            Arc::clone(&self.buffer),
            Arc::clone(&self.registry),
            Arc::clone(&self.metrics),
        )
    }

    /// Start a dispatcher if none is running.
    ///
    /// Check and spawn happen under the dispatcher slot lock, so racing
    /// producers start at most one. While `close` is joining a dispatcher,
    /// callers wait for it to exit first. A dispatcher thread never replaces
    /// itself.
    fn ensure_dispatcher(&self) {
        if self.buffer.is_dispatcher_thread(thread::current().id()) {
            return;
        }

        let mut slot = self.dispatcher.lock();
        while slot.joining {
            self.dispatcher_joined.wait(&mut slot);
        }
        if slot.is_running() {
            return;
        }

        if let Some(dead) = slot.handle.take() {
            dead.join();
        }
        self.start_dispatcher(&mut slot);
    }

    fn start_dispatcher(&self, slot: &mut DispatcherSlot) -> bool {
        match self.spawn_dispatcher() {
            Ok(handle) => {
                if self.closing.load(Ordering::Acquire) {
                    tracing::debug!(
                        dispatcher = handle.name().unwrap_or("unnamed"),
                        "started dispatcher to drain a submission made after close"
                    );
                } else {
                    self.metrics.record_dispatcher_restart();
                    tracing::warn!(
                        dispatcher = handle.name().unwrap_or("unnamed"),
                        "dispatcher was not running; started a new one"
                    );
                }
                slot.handle = Some(handle);
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to restart dispatcher; events stay buffered");
                false
            }
        }
    }

    /// Capture a logging request on the calling thread and buffer it.
    ///
    /// Never fails: a full buffer either makes the caller wait (blocking
    /// policy) or folds the event into a discard summary.
    pub fn submit(&self, record: LogRecord<'_>) -> Admission {
        self.ensure_dispatcher();
        let event = record.capture(self.location_info.load(Ordering::Relaxed));
        self.enqueue(event)
    }

    /// Buffer an event that was already captured by the caller
    pub fn submit_event(&self, event: LogEvent) -> Admission {
        self.ensure_dispatcher();
        self.enqueue(event)
    }

    fn enqueue(&self, event: LogEvent) -> Admission {
        self.metrics.record_submitted();
        let admission = self.buffer.submit(event);

        // After close, the dispatcher started above may already have found the
        // buffer empty and exited before this event landed.
        if self.closing.load(Ordering::Acquire) {
            self.ensure_dispatcher();
        }
        admission
    }

    /// Apply capacity, overflow policy and location capture in one step
    pub fn configure(&self, config: RelayConfig) -> Result<()> {
        let capacity = config.effective_capacity()?;
        self.buffer.reconfigure(capacity, config.blocking);
        self.location_info
            .store(config.location_info, Ordering::Relaxed);
        Ok(())
    }

    /// Current settings; `buffer_size` reports the effective capacity
    pub fn config(&self) -> RelayConfig {
        RelayConfig {
            buffer_size: self.buffer_size() as i64,
            blocking: self.is_blocking(),
            location_info: self.location_info(),
        }
    }

    /// Set the buffer capacity; negative sizes are rejected and zero means one.
    ///
    /// Events already buffered are kept even if they exceed the new size.
    pub fn set_buffer_size(&self, size: i64) -> Result<()> {
        let capacity = effective_capacity(size)?;
        self.buffer.set_capacity(capacity);
        Ok(())
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn set_blocking(&self, blocking: bool) {
        self.buffer.set_blocking(blocking);
    }

    pub fn is_blocking(&self) -> bool {
        self.buffer.is_blocking()
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        OverflowPolicy::from(self.is_blocking())
    }

    pub fn set_location_info(&self, enabled: bool) {
        self.location_info.store(enabled, Ordering::Relaxed);
    }

    pub fn location_info(&self) -> bool {
        self.location_info.load(Ordering::Relaxed)
    }

    /// Attach a sink; returns `false` if it is already attached
    pub fn add_sink(&self, sink: SinkHandle) -> bool {
        self.registry.add(sink)
    }

    /// Attach an owned sink and return its shared handle
    pub fn attach<S: Sink + 'static>(&self, sink: S) -> SinkHandle {
        let handle: SinkHandle = Arc::new(sink);
        self.registry.add(Arc::clone(&handle));
        handle
    }

    pub fn remove_sink(&self, sink: &SinkHandle) -> bool {
        self.registry.remove(sink)
    }

    pub fn remove_sink_by_name(&self, name: &str) -> Option<SinkHandle> {
        self.registry.remove_by_name(name)
    }

    /// Detach and close every sink
    pub fn remove_all_sinks(&self) {
        self.registry.remove_all();
    }

    pub fn sink(&self, name: &str) -> Option<SinkHandle> {
        self.registry.get(name)
    }

    pub fn sinks(&self) -> Vec<SinkHandle> {
        self.registry.all()
    }

    pub fn is_attached(&self, sink: &SinkHandle) -> bool {
        self.registry.is_attached(sink)
    }

    /// Abort every producer currently blocked on a full buffer; each falls
    /// back to the discard path and gets [`Admission::Interrupted`].
    pub fn interrupt_waiters(&self) {
        self.buffer.interrupt_waiters();
    }

    /// Make the running dispatcher exit the next time it goes idle.
    ///
    /// Buffered events are kept; the next `submit` starts a new dispatcher.
    pub fn interrupt_dispatcher(&self) {
        if let Some(handle) = self.dispatcher.lock().handle.as_ref() {
            handle.interrupt();
        }
        self.buffer.wake_dispatchers();
    }

    pub fn is_dispatcher_running(&self) -> bool {
        self.dispatcher.lock().is_running()
    }

    /// Events buffered and not yet drained
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    /// Get the relay metrics for detailed observability
    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    /// Stop accepting waits, drain everything, then close every sink.
    ///
    /// Blocks until the dispatcher has delivered all pending events and
    /// discard summaries and has exited; there is no timeout. Concurrent
    /// callers all wait for that exit. Sinks are closed only once. Later
    /// calls still wait for any dispatcher started by a submission made after
    /// closing.
    ///
    /// Called from a sink on the dispatcher thread, `close` cannot wait for
    /// itself: it returns at once and the dispatcher closes the sinks when it
    /// has drained the buffer.
    pub fn close(&self) {
        self.closing.store(true, Ordering::Release);
        self.buffer.close();

        if self.buffer.is_dispatcher_thread(thread::current().id()) {
            tracing::warn!("close called from the dispatcher thread; sinks close after the final drain");
            self.registry.defer_close();
            return;
        }

        self.join_dispatchers();

        if self.registry.close_once() {
            let discarded = self.metrics.discarded();
            if discarded > 0 {
                tracing::warn!(
                    discarded,
                    drop_rate = self.metrics.drop_rate(),
                    "relay closed with discarded events"
                );
            }
        }
    }

    /// Join dispatchers until none is running and nothing is pending
    fn join_dispatchers(&self) {
        let mut slot = self.dispatcher.lock();
        loop {
            if slot.joining {
                self.dispatcher_joined.wait(&mut slot);
                continue;
            }
            match slot.handle.take() {
                Some(handle) => {
                    slot.joining = true;
                    MutexGuard::unlocked(&mut slot, || handle.join());
                    slot.joining = false;
                    self.dispatcher_joined.notify_all();
                }
                // A late submission can land after the last dispatcher saw an
                // empty buffer.
                None if self.buffer.has_pending() => {
                    if !self.start_dispatcher(&mut slot) {
                        break;
                    }
                }
                None => break,
            }
        }
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("config", &self.config())
            .field("registry", &self.registry)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a Relay with a fluent API
///
/// # Example
/// ```
/// use rust_log_relay::prelude::*;
///
/// let relay = Relay::builder()
///     .buffer_size(256)
///     .overflow_policy(OverflowPolicy::Block)
///     .location_info(true)
///     .sink(MemorySink::new("memory"))
///     .build()
///     .unwrap();
///
/// assert_eq!(relay.buffer_size(), 256);
/// assert!(relay.sink("memory").is_some());
/// ```
pub struct RelayBuilder {
    config: RelayConfig,
    sinks: Vec<SinkHandle>,
    thread_name_prefix: String,
}

impl RelayBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: RelayConfig::default(),
            sinks: Vec::new(),
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }

    /// Start from a complete configuration
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the buffer size; validated in [`build`](Self::build)
    #[must_use = "builder methods return a new value"]
    pub fn buffer_size(mut self, size: i64) -> Self {
        self.config.buffer_size = size;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn blocking(mut self, blocking: bool) -> Self {
        self.config.blocking = blocking;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.config.blocking = policy.is_blocking();
        self
    }

    /// Capture call-site location for every submitted record
    #[must_use = "builder methods return a new value"]
    pub fn location_info(mut self, enabled: bool) -> Self {
        self.config.location_info = enabled;
        self
    }

    /// Add a sink
    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Add a sink the caller keeps a handle to
    #[must_use = "builder methods return a new value"]
    pub fn sink_handle(mut self, sink: SinkHandle) -> Self {
        self.sinks.push(sink);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Build the Relay and start its dispatcher
    pub fn build(self) -> Result<Relay> {
        let relay = Relay::with_thread_name_prefix(self.config, &self.thread_name_prefix)?;
        for sink in self.sinks {
            relay.add_sink(sink);
        }
        Ok(relay)
    }
}

impl Default for RelayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
