//! Key/value event source on top of [`Relay`](crate::core::Relay)
//!
//! Messages are rendered as
//! `"{message} {object pairs} {key pairs} logLevel={LEVEL}"`, the layout
//! key/value log parsers expect, and the same pairs are attached to the
//! event as its context.

pub mod builder;
pub mod key_values;
pub mod logger;

pub use builder::KvBuilder;
pub use key_values::KeyValues;
pub use logger::{KeyValueLogger, DEFAULT_SEPARATOR};

use crate::core::{FieldValue, LogContext, LogLevel};

/// Render the full message; `Null` values are skipped
pub(crate) fn render_message(
    message: &str,
    objects: &[(String, FieldValue)],
    pairs: &[(String, FieldValue)],
    separator: &str,
    level: LogLevel,
) -> String {
    let mut output = message.trim().to_string();

    for (key, value) in objects.iter().chain(pairs) {
        if value.is_null() {
            continue;
        }
        output.push(' ');
        output.push_str(key);
        output.push_str(separator);
        output.push_str(&value.to_string());
    }

    output.push_str(" logLevel");
    output.push_str(separator);
    output.push_str(level.to_str());
    output
}

pub(crate) fn pairs_context(
    objects: &[(String, FieldValue)],
    pairs: &[(String, FieldValue)],
) -> Option<LogContext> {
    let mut context = LogContext::new();
    for (key, value) in objects.iter().chain(pairs) {
        if !value.is_null() {
            context.add_field(key.clone(), value.clone());
        }
    }
    (!context.is_empty()).then_some(context)
}
