//! In-memory sink for tests and inspection

use crate::core::{LogEvent, Result, Sink};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

const DEFAULT_CAPACITY: usize = 10_000;

/// Keeps delivered events in memory, evicting the oldest past `capacity`
///
/// Appends are accepted even after `close`, so events submitted after
/// shutdown can still be observed.
#[derive(Debug)]
pub struct MemorySink {
    name: String,
    events: Mutex<VecDeque<LogEvent>>,
    capacity: usize,
    evicted: AtomicU64,
    flushes: AtomicU64,
    closes: AtomicU64,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            events: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            evicted: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            closes: AtomicU64::new(0),
        }
    }

    pub fn unbounded(name: impl Into<String>) -> Self {
        Self::with_capacity(name, usize::MAX)
    }

    /// Snapshot of the retained events in delivery order
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().iter().cloned().collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events dropped to stay within capacity
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    pub fn close_count(&self) -> u64 {
        self.closes.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.close_count() > 0
    }
}

impl Sink for MemorySink {
    fn append(&self, event: &LogEvent) -> Result<()> {
        let mut events = self.events.lock();
        if events.len() >= self.capacity {
            events.pop_front();
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        events.push_back(event.clone());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
