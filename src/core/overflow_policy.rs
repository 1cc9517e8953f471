//! Overflow policies for the relay buffer
//!
//! When the event buffer is full, this policy determines whether a producer
//! waits for room or records the event as discarded and moves on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Policy for handling buffer overflow
///
/// # Example
///
/// ```
/// use rust_log_relay::OverflowPolicy;
///
/// // Default behavior: summarize and drop
/// let policy = OverflowPolicy::default();
/// assert!(!policy.is_blocking());
///
/// let policy = OverflowPolicy::from(true);
/// assert_eq!(policy, OverflowPolicy::Block);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Record the event in the discard summary and return immediately
    ///
    /// Producers never wait; memory stays bounded by one summary per source.
    #[default]
    Discard,

    /// Wait until the dispatcher makes room
    ///
    /// Warning: This applies backpressure to every logging call site.
    /// The dispatcher thread itself never waits.
    Block,
}

impl OverflowPolicy {
    #[inline]
    pub fn is_blocking(&self) -> bool {
        matches!(self, OverflowPolicy::Block)
    }
}

impl From<bool> for OverflowPolicy {
    fn from(blocking: bool) -> Self {
        if blocking {
            OverflowPolicy::Block
        } else {
            OverflowPolicy::Discard
        }
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Discard => write!(f, "Discard"),
            OverflowPolicy::Block => write!(f, "Block"),
        }
    }
}
