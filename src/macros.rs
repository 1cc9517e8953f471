//! Logging macros for [`KeyValueLogger`](crate::kv::KeyValueLogger).
//!
//! The message is formatted lazily: nothing is rendered when the level is
//! filtered out, and otherwise it is rendered on the calling thread as the
//! relay captures the event. The call-site module path is recorded too.
//!
//! # Examples
//!
//! ```
//! use rust_log_relay::prelude::*;
//! use rust_log_relay::kv_info;
//! use std::sync::Arc;
//!
//! let relay = Arc::new(Relay::builder().build().unwrap());
//! let logger = KeyValueLogger::new("server", Arc::clone(&relay));
//!
//! let port = 8080;
//! kv_info!(logger, "Server listening on port {}", port);
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use rust_log_relay::prelude::*;
/// # use std::sync::Arc;
/// # let logger = KeyValueLogger::new("app", Arc::new(Relay::builder().build().unwrap()));
/// use rust_log_relay::kv_log;
/// kv_log!(logger, LogLevel::Info, "Simple message");
/// kv_log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! kv_log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_lazy($level, ::core::option::Option::Some(module_path!()), || format!($($arg)+))
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! kv_trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::kv_log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! kv_debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::kv_log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_relay::prelude::*;
/// # use std::sync::Arc;
/// # let logger = KeyValueLogger::new("app", Arc::new(Relay::builder().build().unwrap()));
/// use rust_log_relay::kv_info;
/// kv_info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! kv_info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::kv_log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! kv_warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::kv_log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! kv_error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::kv_log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! kv_fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::kv_log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
