//! Log events and the raw records they are captured from

use super::log_context::{LogContext, Mdc, Ndc};
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Get cached thread ID, computing and caching it on first access
fn current_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

/// Get cached thread name, falling back to the thread id for unnamed threads
fn current_thread_name() -> String {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| match std::thread::current().name() {
                Some(name) => name.to_string(),
                None => current_thread_id(),
            })
            .clone()
    })
}

/// Replace newlines, carriage returns and tabs with escape sequences so a
/// message can never forge extra log lines.
fn sanitize_message(message: &str) -> String {
    if !message.contains(|c| matches!(c, '\n' | '\r' | '\t')) {
        return message.to_string();
    }
    message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Call-site of a logging request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_path: Option<String>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Rendered form of an error attached to an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// `Display` of the error itself
    pub message: String,
    /// `Display` of each error in the `source()` chain, outermost first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorInfo {
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: error.to_string(),
            causes,
        }
    }

    /// One line per error, causes prefixed with `caused by: `
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.message.clone())
            .chain(self.causes.iter().map(|c| format!("caused by: {}", c)))
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for line in self.lines() {
            if !first {
                f.write_str("\n")?;
            }
            f.write_str(&line)?;
            first = false;
        }
        Ok(())
    }
}

/// Immutable snapshot of a logging call
///
/// Created on the producer thread; after submission it is owned by the relay
/// buffer, then by the dispatcher, and sinks only ever see it by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub source: String,
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub thread_id: String,
    pub thread_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<LogContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ndc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl LogEvent {
    /// Create an event stamped with the current thread and time
    pub fn new(source: impl Into<String>, level: LogLevel, message: impl AsRef<str>) -> Self {
        Self {
            source: source.into(),
            level,
            message: sanitize_message(message.as_ref()),
            timestamp: Utc::now(),
            thread_id: current_thread_id(),
            thread_name: current_thread_name(),
            context: None,
            ndc: None,
            error: None,
            location: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = Some(context);
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    #[must_use]
    pub fn with_location(mut self, file: &str, line: u32, module_path: Option<&str>) -> Self {
        self.location = Some(Location {
            file: file.to_string(),
            line,
            module_path: module_path.map(str::to_string),
        });
        self
    }
}

enum MessageSource<'a> {
    Rendered(String),
    Deferred(Box<dyn FnOnce() -> String + 'a>),
}

/// A logging request that has not been captured yet
///
/// Its message may still be a closure, and the thread diagnostic contexts
/// have not been read. [`LogRecord::capture`] resolves all of it and must run
/// on the thread that issued the request.
pub struct LogRecord<'a> {
    source: String,
    level: LogLevel,
    message: MessageSource<'a>,
    context: Option<LogContext>,
    error: Option<ErrorInfo>,
    call_site: &'static std::panic::Location<'static>,
    module_path: Option<&'static str>,
}

impl<'a> LogRecord<'a> {
    #[track_caller]
    pub fn new(source: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            level,
            message: MessageSource::Rendered(message.into()),
            context: None,
            error: None,
            call_site: std::panic::Location::caller(),
            module_path: None,
        }
    }

    /// Record whose message is rendered only when the record is captured
    #[track_caller]
    pub fn deferred<F>(source: impl Into<String>, level: LogLevel, render: F) -> Self
    where
        F: FnOnce() -> String + 'a,
    {
        Self {
            source: source.into(),
            level,
            message: MessageSource::Deferred(Box::new(render)),
            context: None,
            error: None,
            call_site: std::panic::Location::caller(),
            module_path: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    #[must_use]
    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = Some(context);
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: &(dyn std::error::Error + 'static)) -> Self {
        self.error = Some(ErrorInfo::from_error(error));
        self
    }

    #[must_use]
    pub fn with_error_info(mut self, error: Option<ErrorInfo>) -> Self {
        self.error = error;
        self
    }

    #[must_use]
    pub fn with_module_path(mut self, module_path: &'static str) -> Self {
        self.module_path = Some(module_path);
        self
    }

    /// Override the call-site recorded at construction
    #[must_use]
    pub fn at(mut self, call_site: &'static std::panic::Location<'static>) -> Self {
        self.call_site = call_site;
        self
    }

    /// Materialize the record into an immutable event on the current thread.
    ///
    /// Explicit context fields win over MDC fields with the same key. The
    /// call-site is only kept when `location_info` is set.
    pub fn capture(self, location_info: bool) -> LogEvent {
        let message = match self.message {
            MessageSource::Rendered(message) => message,
            MessageSource::Deferred(render) => render(),
        };

        let context = match (self.context, Mdc::snapshot()) {
            (Some(mut explicit), Some(mdc)) => {
                explicit.merge_missing(&mdc);
                Some(explicit)
            }
            (explicit, mdc) => explicit.or(mdc),
        };

        let mut event = LogEvent::new(self.source, self.level, message);
        event.context = context.filter(|ctx| !ctx.is_empty());
        event.ndc = Ndc::snapshot();
        event.error = self.error;
        if location_info {
            event.location = Some(Location {
                file: self.call_site.file().to_string(),
                line: self.call_site.line(),
                module_path: self.module_path.map(str::to_string),
            });
        }
        event
    }
}

impl fmt::Debug for LogRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogRecord")
            .field("source", &self.source)
            .field("level", &self.level)
            .field("call_site", &self.call_site)
            .finish_non_exhaustive()
    }
}
