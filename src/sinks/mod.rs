//! Sink implementations

#[cfg(feature = "console")]
pub mod console;
#[cfg(feature = "file")]
pub mod file;
pub mod json;
pub mod memory;

#[cfg(feature = "console")]
pub use console::ConsoleSink;
#[cfg(feature = "file")]
pub use file::FileSink;
pub use json::JsonSink;
pub use memory::MemorySink;

pub use crate::core::Sink;

use crate::core::LogEvent;

/// Timestamp layout used by the text sinks
pub(crate) const TEXT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Render an event as one text line (plus one line per error in its chain).
///
/// `level` is passed in already formatted so the console sink can color it.
pub(crate) fn render_text(event: &LogEvent, level: &str) -> String {
    let mut output = format!(
        "[{}] [{}] [{}] {} - {}",
        event.timestamp.format(TEXT_TIMESTAMP_FORMAT),
        level,
        event.thread_name,
        event.source,
        event.message
    );

    if let Some(ref ndc) = event.ndc {
        output.push_str(" [");
        output.push_str(ndc);
        output.push(']');
    }

    if let Some(ref context) = event.context {
        if !context.is_empty() {
            output.push_str(" | ");
            output.push_str(&context.format_fields());
        }
    }

    if let Some(ref location) = event.location {
        output.push_str(" (");
        output.push_str(&location.to_string());
        output.push(')');
    }

    if let Some(ref error) = event.error {
        for line in error.lines() {
            output.push_str("\n    ");
            output.push_str(&line);
        }
    }

    output
}
