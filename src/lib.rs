//! # Rust Log Relay
//!
//! An asynchronous log event relay: producers hand events to a bounded
//! buffer and return immediately, while a single background dispatcher
//! delivers them, in order, to every attached sink.
//!
//! ## Features
//!
//! - **Bounded buffer**: one lock, two condition variables, configurable size
//! - **Overflow policy**: block the producer, or summarize discarded events
//!   per source and deliver one summary event with the highest severity
//! - **Self-healing**: a dead dispatcher is replaced on the next submission
//! - **Isolated sinks**: a failing or panicking sink never stops the others
//! - **Key/value layer**: `message key=value logLevel=LEVEL` rendering
//!
//! ## Example
//!
//! ```
//! use rust_log_relay::prelude::*;
//! use std::sync::Arc;
//!
//! let memory = Arc::new(MemorySink::new("memory"));
//! let relay = Relay::builder()
//!     .buffer_size(4)
//!     .sink_handle(memory.clone())
//!     .build()
//!     .unwrap();
//!
//! relay.submit(LogRecord::new("app", LogLevel::Info, "hello"));
//! relay.close();
//!
//! assert_eq!(memory.messages(), vec!["hello".to_string()]);
//! ```

pub mod core;
pub mod kv;
pub mod macros;
pub mod sinks;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::sinks::ConsoleSink;
    #[cfg(feature = "file")]
    pub use crate::sinks::FileSink;
    pub use crate::core::{
        Admission, ContextGuard, ErrorInfo, FieldValue, LogContext, LogEvent, LogLevel,
        LogRecord, Mdc, Ndc, NdcGuard, OverflowPolicy, Relay, RelayBuilder, RelayConfig,
        RelayError, RelayMetrics, Result, Sink, SinkHandle,
    };
    pub use crate::kv::{KeyValueLogger, KeyValues, KvBuilder};
    pub use crate::sinks::{JsonSink, MemorySink};
}

#[cfg(feature = "console")]
pub use sinks::ConsoleSink;
#[cfg(feature = "file")]
pub use sinks::FileSink;
pub use sinks::{JsonSink, MemorySink};
pub use core::{
    Admission, ContextGuard, DiscardSummarizer, DiscardSummary, ErrorInfo, FieldValue, Location,
    LogContext, LogEvent, LogLevel, LogRecord, Mdc, Ndc, NdcGuard, OverflowPolicy, Relay,
    RelayBuilder, RelayConfig, RelayError, RelayMetrics, Result, Sink, SinkHandle,
    DEFAULT_BUFFER_SIZE,
};
pub use kv::{KeyValueLogger, KeyValues, KvBuilder};
