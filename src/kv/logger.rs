//! Named key/value logger bound to a relay

use super::builder::KvBuilder;
use super::key_values::KeyValues;
use super::{pairs_context, render_message};
use crate::core::{FieldValue, LogLevel, LogRecord, Relay};
use std::error::Error;
use std::sync::Arc;

/// Separator between a key and its value unless configured otherwise
pub const DEFAULT_SEPARATOR: &str = "=";

/// Logs `key=value` style messages through a shared [`Relay`]
///
/// Plain calls render `"{message} logLevel={LEVEL}"`; calls that start with
/// [`with`](Self::with) or [`with_object`](Self::with_object) go through a
/// [`KvBuilder`] and render their pairs in between.
///
/// # Example
///
/// ```
/// use rust_log_relay::prelude::*;
/// use std::sync::Arc;
///
/// let memory = Arc::new(MemorySink::new("memory"));
/// let relay = Arc::new(Relay::builder().sink_handle(memory.clone()).build().unwrap());
/// let logger = KeyValueLogger::new("billing", Arc::clone(&relay)).with_separator(":");
///
/// logger.info("Invoice sent");
/// relay.close();
///
/// assert_eq!(memory.messages(), vec!["Invoice sent logLevel:INFO".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct KeyValueLogger {
    name: String,
    relay: Arc<Relay>,
    separator: String,
    min_level: LogLevel,
}

impl KeyValueLogger {
    pub fn new(name: impl Into<String>, relay: Arc<Relay>) -> Self {
        Self {
            name: name.into(),
            relay,
            separator: DEFAULT_SEPARATOR.to_string(),
            min_level: LogLevel::Trace,
        }
    }

    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    #[must_use]
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    /// Start a call with one key/value pair
    pub fn with<K, V>(&self, key: K, value: V) -> KvBuilder<'_>
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        KvBuilder::new(self).and(key, value)
    }

    /// Start a call with the fields of `object` under its default prefix
    pub fn with_object<T: KeyValues + ?Sized>(&self, object: &T) -> KvBuilder<'_> {
        KvBuilder::new(self).and_object(object)
    }

    pub fn with_object_prefixed<T: KeyValues + ?Sized>(
        &self,
        object: &T,
        prefix: &str,
    ) -> KvBuilder<'_> {
        KvBuilder::new(self).and_object_prefixed(object, prefix)
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: &str) {
        self.emit(level, message, &[], &[], None);
    }

    /// Format the message only if `level` passes the filter, on the calling
    /// thread when the relay captures it. Used by the `kv_*!` macros.
    #[track_caller]
    pub fn log_lazy<F>(&self, level: LogLevel, module_path: Option<&'static str>, render: F)
    where
        F: FnOnce() -> String,
    {
        if !self.is_enabled(level) {
            return;
        }
        let separator = self.separator.as_str();
        let mut record = LogRecord::deferred(self.name.as_str(), level, move || {
            render_message(&render(), &[], &[], separator, level)
        });
        if let Some(module_path) = module_path {
            record = record.with_module_path(module_path);
        }
        self.relay.submit(record);
    }

    #[track_caller]
    pub fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message);
    }

    #[track_caller]
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    #[track_caller]
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    #[track_caller]
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    #[track_caller]
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    #[track_caller]
    pub fn fatal(&self, message: &str) {
        self.log(LogLevel::Fatal, message);
    }

    #[track_caller]
    pub fn debug_with_error(&self, message: &str, error: &(dyn Error + 'static)) {
        self.emit(LogLevel::Debug, message, &[], &[], Some(error));
    }

    #[track_caller]
    pub fn info_with_error(&self, message: &str, error: &(dyn Error + 'static)) {
        self.emit(LogLevel::Info, message, &[], &[], Some(error));
    }

    #[track_caller]
    pub fn warn_with_error(&self, message: &str, error: &(dyn Error + 'static)) {
        self.emit(LogLevel::Warn, message, &[], &[], Some(error));
    }

    #[track_caller]
    pub fn error_with_error(&self, message: &str, error: &(dyn Error + 'static)) {
        self.emit(LogLevel::Error, message, &[], &[], Some(error));
    }

    #[track_caller]
    pub fn fatal_with_error(&self, message: &str, error: &(dyn Error + 'static)) {
        self.emit(LogLevel::Fatal, message, &[], &[], Some(error));
    }

    #[track_caller]
    pub(crate) fn emit(
        &self,
        level: LogLevel,
        message: &str,
        objects: &[(String, FieldValue)],
        pairs: &[(String, FieldValue)],
        error: Option<&(dyn Error + 'static)>,
    ) {
        if !self.is_enabled(level) {
            return;
        }

        let rendered = render_message(message, objects, pairs, &self.separator, level);
        let mut record = LogRecord::new(self.name.as_str(), level, rendered);
        if let Some(context) = pairs_context(objects, pairs) {
            record = record.with_context(context);
        }
        if let Some(error) = error {
            record = record.with_error(error);
        }
        self.relay.submit(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::MemorySink;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn setup(min_level: LogLevel) -> (Arc<Relay>, Arc<MemorySink>, KeyValueLogger) {
        let memory = Arc::new(MemorySink::new("memory"));
        let relay = Arc::new(
            Relay::builder()
                .location_info(true)
                .sink_handle(memory.clone())
                .build()
                .unwrap(),
        );
        let logger = KeyValueLogger::new("orders", Arc::clone(&relay)).with_min_level(min_level);
        (relay, memory, logger)
    }

    #[test]
    fn test_plain_levels() {
        let (relay, memory, logger) = setup(LogLevel::Trace);

        logger.trace("t");
        logger.debug("d");
        logger.info(" i ");
        logger.warn("w");
        logger.error("e");
        logger.fatal("f");
        relay.close();

        assert_eq!(
            memory.messages(),
            vec![
                "t logLevel=TRACE",
                "d logLevel=DEBUG",
                "i logLevel=INFO",
                "w logLevel=WARN",
                "e logLevel=ERROR",
                "f logLevel=FATAL",
            ]
        );
        assert!(memory.events().iter().all(|e| e.source == "orders"));
    }

    #[test]
    fn test_min_level_filters_before_rendering() {
        let (relay, memory, logger) = setup(LogLevel::Warn);
        let rendered = AtomicBool::new(false);

        logger.info("dropped");
        logger.log_lazy(LogLevel::Debug, None, || {
            rendered.store(true, Ordering::SeqCst);
            "never".to_string()
        });
        logger.warn("kept");
        relay.close();

        assert_eq!(memory.messages(), vec!["kept logLevel=WARN"]);
        assert!(!rendered.load(Ordering::SeqCst));
    }

    #[test]
    fn test_call_site_points_at_caller() {
        let (relay, memory, logger) = setup(LogLevel::Trace);

        logger.info("here");
        let expected_line = line!() - 1;
        relay.close();

        let location = memory.events()[0].location.clone().unwrap();
        assert_eq!(location.line, expected_line);
        assert!(location.file.ends_with("logger.rs"));
    }

    #[test]
    fn test_error_variant_keeps_message_format() {
        let (relay, memory, logger) = setup(LogLevel::Trace);
        let err = std::io::Error::new(std::io::ErrorKind::Other, "timeout");

        logger.warn_with_error("Upstream slow", &err);
        relay.close();

        let event = &memory.events()[0];
        assert_eq!(event.message, "Upstream slow logLevel=WARN");
        assert_eq!(event.error.as_ref().unwrap().message, "timeout");
    }
}
