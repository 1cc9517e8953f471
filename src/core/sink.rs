//! Sink trait for relay output destinations

use super::{error::Result, log_event::LogEvent};

/// A downstream consumer of log events
///
/// Sinks are shared between the registry and anyone holding a handle, so
/// every method takes `&self`; implementations synchronize internally.
/// Events are read-only: the same event is handed to every attached sink.
///
/// # Example
///
/// ```
/// use rust_log_relay::core::{LogEvent, Result, Sink};
///
/// struct Stdout;
///
/// impl Sink for Stdout {
///     fn append(&self, event: &LogEvent) -> Result<()> {
///         println!("{} {}", event.level, event.message);
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "stdout"
///     }
/// }
/// ```
pub trait Sink: Send + Sync {
    fn append(&self, event: &LogEvent) -> Result<()>;

    /// Called after each dispatched batch
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Called once when the relay shuts down or the sink is removed via
    /// `remove_all`
    fn close(&self) -> Result<()> {
        self.flush()
    }

    fn name(&self) -> &str;
}
