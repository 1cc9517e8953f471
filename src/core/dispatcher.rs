//! Background worker draining the buffer into the sink registry

use super::buffer::{Drain, EventBuffer};
use super::error::{RelayError, Result};
use super::metrics::RelayMetrics;
use super::registry::SinkRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

/// Default prefix for dispatcher thread names
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "relay-dispatcher";

/// A running (or finished) dispatcher thread
#[derive(Debug)]
pub(crate) struct DispatcherHandle {
    handle: JoinHandle<()>,
    interrupted: Arc<AtomicBool>,
}

impl DispatcherHandle {
    pub(crate) fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }

    #[cfg(test)]
    pub(crate) fn thread_id(&self) -> ThreadId {
        self.handle.thread().id()
    }

    pub(crate) fn name(&self) -> Option<&str> {
        self.handle.thread().name()
    }

    /// Ask the dispatcher to exit the next time it would wait for events.
    /// The caller must wake it through the buffer afterwards.
    pub(crate) fn interrupt(&self) {
        self.interrupted.store(true, Ordering::Release);
    }

    /// Wait for the thread to finish, reporting a panic if it died of one
    pub(crate) fn join(self) {
        let name = self.handle.thread().name().map(str::to_string);
        if self.handle.join().is_err() {
            tracing::error!(
                dispatcher = name.as_deref().unwrap_or("unnamed"),
                "dispatcher thread panicked"
            );
        }
    }
}

/// Unregisters the dispatcher thread from the buffer however the loop ends
struct Registration<'a> {
    buffer: &'a EventBuffer,
    id: ThreadId,
}

impl<'a> Registration<'a> {
    fn new(buffer: &'a EventBuffer) -> Self {
        let id = thread::current().id();
        buffer.register_dispatcher(id);
        Self { buffer, id }
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.buffer.unregister_dispatcher(self.id);
    }
}

pub(crate) fn spawn(
    name: String,
    buffer: Arc<EventBuffer>,
    registry: Arc<SinkRegistry>,
    metrics: Arc<RelayMetrics>,
) -> Result<DispatcherHandle> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);

    let handle = thread::Builder::new()
        .name(name)
        .spawn(move || run(&buffer, &registry, &metrics, &flag))
        .map_err(RelayError::DispatcherSpawn)?;

    Ok(DispatcherHandle {
        handle,
        interrupted,
    })
}

/// Drain, deliver, repeat until the relay is closed and empty.
///
/// Batches are delivered one at a time: every event of a batch reaches every
/// sink before the next drain starts.
fn run(
    buffer: &EventBuffer,
    registry: &SinkRegistry,
    metrics: &RelayMetrics,
    interrupted: &AtomicBool,
) {
    let _registration = Registration::new(buffer);
    tracing::debug!("dispatcher started");

    loop {
        match buffer.drain_all(interrupted) {
            Drain::Batch(events) => {
                for event in &events {
                    registry.append_loop(event);
                    metrics.record_delivered();
                }
                registry.flush_all();
            }
            Drain::Closed => {
                if registry.close_if_deferred() {
                    tracing::debug!("dispatcher closed sinks after final drain");
                }
                tracing::debug!("dispatcher drained and closed");
                break;
            }
            Drain::Interrupted => {
                tracing::warn!("dispatcher interrupted while idle; exiting");
                break;
            }
        }
    }
}
