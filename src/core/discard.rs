//! Summaries of events dropped on buffer overflow
//!
//! Instead of losing overflowed events silently, the relay keeps one summary
//! per source identifier and turns each into a single synthetic event the
//! next time the buffer is drained.

use super::log_event::LogEvent;
use super::log_level::LogLevel;
use std::collections::BTreeMap;

/// Discards recorded for one source identifier within one drain epoch
#[derive(Debug, Clone)]
pub struct DiscardSummary {
    /// First event seen at the highest severity
    max_event: LogEvent,
    count: u64,
}

impl DiscardSummary {
    pub fn new(event: LogEvent) -> Self {
        Self {
            max_event: event,
            count: 1,
        }
    }

    /// Count another discard, keeping it as the representative only if it
    /// is strictly more severe than the current one.
    pub fn add(&mut self, event: LogEvent) {
        if event.level.rank() > self.max_event.level.rank() {
            self.max_event = event;
        }
        self.count += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn max_level(&self) -> LogLevel {
        self.max_event.level
    }

    pub fn representative(&self) -> &LogEvent {
        &self.max_event
    }

    /// Synthetic event describing this summary, stamped on the calling thread
    pub fn to_event(&self) -> LogEvent {
        LogEvent::new(
            self.max_event.source.clone(),
            self.max_event.level,
            format!(
                "Discarded {} messages due to full event buffer including: {}",
                self.count, self.max_event.message
            ),
        )
    }
}

/// Per-source discard summaries
///
/// Not synchronized on its own: it lives inside the event buffer's state and
/// is only touched while the buffer lock is held.
#[derive(Debug, Default)]
pub struct DiscardSummarizer {
    summaries: BTreeMap<String, DiscardSummary>,
}

impl DiscardSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_discard(&mut self, event: LogEvent) {
        match self.summaries.get_mut(&event.source) {
            Some(summary) => summary.add(event),
            None => {
                self.summaries
                    .insert(event.source.clone(), DiscardSummary::new(event));
            }
        }
    }

    /// One synthetic event per source, in source order; clears all summaries.
    pub fn drain(&mut self) -> Vec<LogEvent> {
        std::mem::take(&mut self.summaries)
            .into_values()
            .map(|summary| summary.to_event())
            .collect()
    }

    pub fn get(&self, source: &str) -> Option<&DiscardSummary> {
        self.summaries.get(source)
    }

    /// Number of distinct sources with pending discards
    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    /// Total discards pending across all sources
    pub fn total_discarded(&self) -> u64 {
        self.summaries.values().map(DiscardSummary::count).sum()
    }
}
