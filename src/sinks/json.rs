//! JSON sink for log collectors
//!
//! Each event becomes a single-line JSON object (JSONL) shaped the way
//! logstash-style collectors expect:
//!
//! ```text
//! {"@version":"1","@timestamp":"2024-05-01T10:00:00.000Z","message":"...",
//!  "type":"udp","priority":"INFO","logger_name":"app","thread":"main",...}
//! ```

use crate::core::{LogEvent, Result, Sink};
use chrono::SecondsFormat;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

const DEFAULT_EVENT_TYPE: &str = "udp";

/// Writes collector-shaped JSON lines to any writer
pub struct JsonSink<W: Write + Send> {
    name: String,
    writer: Mutex<W>,
    event_type: String,
    application: Option<String>,
    environment: Option<String>,
}

impl JsonSink<BufWriter<File>> {
    /// Append JSON lines to a file
    pub fn file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            name: "json".to_string(),
            writer: Mutex::new(writer),
            event_type: DEFAULT_EVENT_TYPE.to_string(),
            application: None,
            environment: None,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Value of the `type` field (default `"udp"`)
    #[must_use]
    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    #[must_use]
    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    /// Build the JSON object for one event
    pub fn to_value(&self, event: &LogEvent) -> Value {
        let mut object = Map::new();
        object.insert("@version".into(), Value::from("1"));
        object.insert(
            "@timestamp".into(),
            Value::from(event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        object.insert("message".into(), Value::from(event.message.as_str()));
        object.insert("type".into(), Value::from(self.event_type.as_str()));
        object.insert("priority".into(), Value::from(event.level.to_str()));
        object.insert("logger_name".into(), Value::from(event.source.as_str()));
        object.insert("thread".into(), Value::from(event.thread_name.as_str()));

        if let Some(ref application) = self.application {
            object.insert("application".into(), Value::from(application.as_str()));
        }
        if let Some(ref environment) = self.environment {
            object.insert("environment".into(), Value::from(environment.as_str()));
        }
        if let Some(ref error) = event.error {
            object.insert("stack_trace".into(), Value::from(error.to_string()));
        }
        if let Some(ref ndc) = event.ndc {
            object.insert("NDC".into(), Value::from(ndc.as_str()));
        }
        if let Some(ref location) = event.location {
            if let Some(ref module_path) = location.module_path {
                object.insert("class".into(), Value::from(module_path.as_str()));
            }
            object.insert("file".into(), Value::from(location.file.as_str()));
            object.insert("line".into(), Value::from(location.line));
        }

        // Context fields never shadow the fixed ones
        if let Some(ref context) = event.context {
            for (key, value) in context.fields() {
                object
                    .entry(key.clone())
                    .or_insert_with(|| value.to_json_value());
            }
        }

        Value::Object(object)
    }
}

impl<W: Write + Send> Sink for JsonSink<W> {
    fn append(&self, event: &LogEvent) -> Result<()> {
        let line = serde_json::to_string(&self.to_value(event))?;
        writeln!(self.writer.lock(), "{}", line)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ErrorInfo, LogContext, LogLevel};
    use std::fs;
    use tempfile::tempdir;

    fn parse_lines(bytes: Vec<u8>) -> Vec<Value> {
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_json_sink_fixed_fields() -> Result<()> {
        let sink = JsonSink::new(Vec::new())
            .with_application("billing")
            .with_environment("staging");

        sink.append(&LogEvent::new("app.payments", LogLevel::Warn, "slow charge"))?;

        let lines = parse_lines(sink.into_inner());
        let value = &lines[0];
        assert_eq!(value["@version"], "1");
        assert_eq!(value["type"], "udp");
        assert_eq!(value["priority"], "WARN");
        assert_eq!(value["logger_name"], "app.payments");
        assert_eq!(value["message"], "slow charge");
        assert_eq!(value["application"], "billing");
        assert_eq!(value["environment"], "staging");
        assert!(value["@timestamp"].as_str().unwrap().ends_with('Z'));
        Ok(())
    }

    #[test]
    fn test_json_sink_omits_absent_fields() -> Result<()> {
        let sink = JsonSink::new(Vec::new()).with_event_type("tcp");
        sink.append(&LogEvent::new("app", LogLevel::Info, "plain"))?;

        let lines = parse_lines(sink.into_inner());
        let object = lines[0].as_object().unwrap();
        assert_eq!(object["type"], "tcp");
        for key in ["application", "environment", "stack_trace", "NDC", "class", "file"] {
            assert!(!object.contains_key(key), "unexpected key {}", key);
        }
        Ok(())
    }

    #[test]
    fn test_json_sink_optional_fields_and_context() -> Result<()> {
        let mut event = LogEvent::new("app", LogLevel::Error, "boom")
            .with_context(
                LogContext::new()
                    .with_field("user_id", 42)
                    .with_field("priority", "shadowed"),
            )
            .with_error(ErrorInfo {
                message: "outer".to_string(),
                causes: vec!["inner".to_string()],
            })
            .with_location("src/pay.rs", 12, Some("app::pay"));
        event.ndc = Some("req-1 step-2".to_string());

        let sink = JsonSink::new(Vec::new());
        sink.append(&event)?;

        let lines = parse_lines(sink.into_inner());
        let value = &lines[0];
        assert_eq!(value["user_id"], 42);
        assert_eq!(value["priority"], "ERROR");
        assert_eq!(value["stack_trace"], "outer\ncaused by: inner");
        assert_eq!(value["NDC"], "req-1 step-2");
        assert_eq!(value["class"], "app::pay");
        assert_eq!(value["file"], "src/pay.rs");
        assert_eq!(value["line"], 12);
        Ok(())
    }

    #[test]
    fn test_json_sink_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("events.jsonl");
        let sink = JsonSink::file(&path)?;

        for i in 0..3 {
            sink.append(&LogEvent::new("app", LogLevel::Debug, format!("event {}", i)))?;
        }
        sink.flush()?;

        let content = fs::read_to_string(&path)?;
        assert_eq!(content.lines().count(), 3);
        Ok(())
    }
}
