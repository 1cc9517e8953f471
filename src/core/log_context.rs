//! Structured logging context for key-value fields
//!
//! This module provides:
//! - `LogContext`: Per-event structured fields
//! - `Mdc`: Thread-local mapped diagnostic context, snapshotted into each event
//! - `Ndc`: Thread-local nested diagnostic context (a stack of labels)
//! - `ContextGuard` / `NdcGuard`: RAII guards for scoped context

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl FieldValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Null => serde_json::Value::Null,
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::String(s.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u64> for FieldValue {
    fn from(i: u64) -> Self {
        i64::try_from(i)
            .map(FieldValue::Int)
            .unwrap_or_else(|_| FieldValue::String(i.to_string()))
    }
}

impl From<usize> for FieldValue {
    fn from(i: usize) -> Self {
        FieldValue::from(i as u64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Context for structured logging with key-value fields
///
/// Fields are kept sorted by key so rendered output is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogContext {
    fields: BTreeMap<String, FieldValue>,
}

impl LogContext {
    /// Create a new empty log context
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Add a field to the context
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a field to the context (mutable version)
    pub fn add_field<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Get all fields
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Check if context has any fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Copy fields from `other` whose keys are not already present.
    ///
    /// Fields already in `self` take priority.
    pub fn merge_missing(&mut self, other: &LogContext) {
        for (key, value) in &other.fields {
            self.fields
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// Format fields as key=value pairs
    pub fn format_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_fields())
    }
}

thread_local! {
    static MDC: RefCell<BTreeMap<String, FieldValue>> = const { RefCell::new(BTreeMap::new()) };
    static NDC: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Mapped diagnostic context for the current thread
///
/// Values put here are copied into every event captured on this thread
/// until they are removed.
///
/// # Example
///
/// ```
/// use rust_log_relay::core::Mdc;
///
/// {
///     let _guard = Mdc::put("request_id", "abc-123");
///     assert!(Mdc::snapshot().is_some());
/// }
/// assert!(Mdc::snapshot().is_none());
/// ```
pub struct Mdc;

impl Mdc {
    /// Set a field for the current thread; the returned guard restores the
    /// previous value (or removes the key) when dropped.
    pub fn put<K, V>(key: K, value: V) -> ContextGuard
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let key = key.into();
        let previous = MDC.with(|mdc| mdc.borrow_mut().insert(key.clone(), value.into()));
        ContextGuard {
            key,
            previous,
            _not_send: PhantomData,
        }
    }

    pub fn get(key: &str) -> Option<FieldValue> {
        MDC.with(|mdc| mdc.borrow().get(key).cloned())
    }

    pub fn remove(key: &str) -> Option<FieldValue> {
        MDC.with(|mdc| mdc.borrow_mut().remove(key))
    }

    pub fn clear() {
        MDC.with(|mdc| mdc.borrow_mut().clear());
    }

    /// Copy of the current thread's fields, `None` when empty
    pub fn snapshot() -> Option<LogContext> {
        MDC.with(|mdc| {
            let mdc = mdc.borrow();
            if mdc.is_empty() {
                None
            } else {
                Some(LogContext {
                    fields: mdc.clone(),
                })
            }
        })
    }
}

/// RAII guard for a scoped MDC field
///
/// Bound to the thread that created it.
pub struct ContextGuard {
    key: String,
    previous: Option<FieldValue>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        MDC.with(|mdc| {
            let mut mdc = mdc.borrow_mut();
            match self.previous.take() {
                Some(previous) => {
                    mdc.insert(std::mem::take(&mut self.key), previous);
                }
                None => {
                    mdc.remove(&self.key);
                }
            }
        });
    }
}

/// Nested diagnostic context for the current thread
pub struct Ndc;

impl Ndc {
    /// Push a label; the returned guard pops it (and anything pushed after it)
    pub fn push(label: impl Into<String>) -> NdcGuard {
        let depth = NDC.with(|ndc| {
            let mut ndc = ndc.borrow_mut();
            ndc.push(label.into());
            ndc.len() - 1
        });
        NdcGuard {
            depth,
            _not_send: PhantomData,
        }
    }

    pub fn depth() -> usize {
        NDC.with(|ndc| ndc.borrow().len())
    }

    pub fn clear() {
        NDC.with(|ndc| ndc.borrow_mut().clear());
    }

    /// Stack contents joined by a single space, `None` when empty
    pub fn snapshot() -> Option<String> {
        NDC.with(|ndc| {
            let ndc = ndc.borrow();
            if ndc.is_empty() {
                None
            } else {
                Some(ndc.join(" "))
            }
        })
    }
}

pub struct NdcGuard {
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for NdcGuard {
    fn drop(&mut self) {
        NDC.with(|ndc| ndc.borrow_mut().truncate(self.depth));
    }
}
