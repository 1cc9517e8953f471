//! Console sink implementation

use super::render_text;
use crate::core::{LogEvent, Result, Sink};
use colored::Colorize;
use std::io::Write;

/// Writes events to stdout, or stderr for `Error` and `Fatal`
pub struct ConsoleSink {
    name: String,
    use_colors: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            name: "console".to_string(),
            use_colors: true,
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn format(&self, event: &LogEvent) -> String {
        let level = format!("{:5}", event.level.to_str());
        if self.use_colors {
            render_text(event, &level.color(event.level.color_code()).to_string())
        } else {
            render_text(event, &level)
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn append(&self, event: &LogEvent) -> Result<()> {
        let output = self.format(event);

        if event.level.is_error() {
            writeln!(std::io::stderr().lock(), "{}", output)?;
        } else {
            writeln!(std::io::stdout().lock(), "{}", output)?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        // Flush both stdout and stderr since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
