//! Core relay types and traits

pub mod buffer;
pub mod config;
pub mod discard;
pub mod dispatcher;
pub mod error;
pub mod log_context;
pub mod log_event;
pub mod log_level;
pub mod metrics;
pub mod overflow_policy;
pub mod registry;
pub mod relay;
pub mod sink;

pub use buffer::{Admission, Drain, EventBuffer};
pub use config::{RelayConfig, DEFAULT_BUFFER_SIZE};
pub use discard::{DiscardSummarizer, DiscardSummary};
pub use dispatcher::DEFAULT_THREAD_NAME_PREFIX;
pub use error::{RelayError, Result};
pub use log_context::{ContextGuard, FieldValue, LogContext, Mdc, Ndc, NdcGuard};
pub use log_event::{ErrorInfo, Location, LogEvent, LogRecord};
pub use log_level::LogLevel;
pub use metrics::RelayMetrics;
pub use overflow_policy::OverflowPolicy;
pub use registry::{SinkHandle, SinkRegistry};
pub use relay::{Relay, RelayBuilder};
pub use sink::Sink;
