//! Accumulates key/value pairs for a single log call

use super::key_values::KeyValues;
use super::logger::KeyValueLogger;
use crate::core::{FieldValue, LogLevel};
use std::error::Error;

/// Pairs collected for one log call
///
/// Created by [`KeyValueLogger::with`] and friends and consumed by exactly
/// one level method, so pairs never leak into a later call.
///
/// # Example
///
/// ```
/// use rust_log_relay::prelude::*;
/// use std::sync::Arc;
///
/// let memory = Arc::new(MemorySink::new("memory"));
/// let relay = Arc::new(Relay::builder().sink_handle(memory.clone()).build().unwrap());
/// let logger = KeyValueLogger::new("checkout", Arc::clone(&relay));
///
/// logger.with("order", 42).and("status", "paid").info("Order settled");
/// relay.close();
///
/// assert_eq!(
///     memory.messages(),
///     vec!["Order settled order=42 status=paid logLevel=INFO".to_string()]
/// );
/// ```
#[must_use = "pairs are only logged by a level method such as `info`"]
pub struct KvBuilder<'l> {
    logger: &'l KeyValueLogger,
    objects: Vec<(String, FieldValue)>,
    pairs: Vec<(String, FieldValue)>,
}

impl<'l> KvBuilder<'l> {
    pub(crate) fn new(logger: &'l KeyValueLogger) -> Self {
        Self {
            logger,
            objects: Vec::new(),
            pairs: Vec::new(),
        }
    }

    /// Add a pair; a repeated key keeps its position and takes the new value
    pub fn and<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
        self
    }

    /// Add every field of `object` under its default prefix
    pub fn and_object<T: KeyValues + ?Sized>(self, object: &T) -> Self {
        let prefix = object.prefix();
        self.and_object_prefixed(object, &prefix)
    }

    /// Add every field of `object` as `prefix.field`; an empty prefix emits
    /// the field names bare
    pub fn and_object_prefixed<T: KeyValues + ?Sized>(mut self, object: &T, prefix: &str) -> Self {
        for (field, value) in object.key_values() {
            let key = if prefix.is_empty() {
                field
            } else {
                format!("{}.{}", prefix, field)
            };
            self.objects.push((key, value));
        }
        self
    }

    #[track_caller]
    pub fn log(self, level: LogLevel, message: &str) {
        self.emit(level, message, None);
    }

    #[track_caller]
    pub fn trace(self, message: &str) {
        self.emit(LogLevel::Trace, message, None);
    }

    #[track_caller]
    pub fn debug(self, message: &str) {
        self.emit(LogLevel::Debug, message, None);
    }

    #[track_caller]
    pub fn info(self, message: &str) {
        self.emit(LogLevel::Info, message, None);
    }

    #[track_caller]
    pub fn warn(self, message: &str) {
        self.emit(LogLevel::Warn, message, None);
    }

    #[track_caller]
    pub fn error(self, message: &str) {
        self.emit(LogLevel::Error, message, None);
    }

    #[track_caller]
    pub fn fatal(self, message: &str) {
        self.emit(LogLevel::Fatal, message, None);
    }

    #[track_caller]
    pub fn debug_with_error(self, message: &str, error: &(dyn Error + 'static)) {
        self.emit(LogLevel::Debug, message, Some(error));
    }

    #[track_caller]
    pub fn info_with_error(self, message: &str, error: &(dyn Error + 'static)) {
        self.emit(LogLevel::Info, message, Some(error));
    }

    #[track_caller]
    pub fn warn_with_error(self, message: &str, error: &(dyn Error + 'static)) {
        self.emit(LogLevel::Warn, message, Some(error));
    }

    #[track_caller]
    pub fn error_with_error(self, message: &str, error: &(dyn Error + 'static)) {
        self.emit(LogLevel::Error, message, Some(error));
    }

    #[track_caller]
    pub fn fatal_with_error(self, message: &str, error: &(dyn Error + 'static)) {
        self.emit(LogLevel::Fatal, message, Some(error));
    }

    #[track_caller]
    fn emit(self, level: LogLevel, message: &str, error: Option<&(dyn Error + 'static)>) {
        self.logger
            .emit(level, message, &self.objects, &self.pairs, error);
    }
}
