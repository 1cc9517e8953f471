//! Error types for the log relay

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A sink reported a failure while appending, flushing or closing
    #[error("Sink '{sink}' failed: {message}")]
    SinkFailure { sink: String, message: String },

    /// A sink panicked; the panic was contained
    #[error("Sink '{sink}' panicked: {message}")]
    SinkPanicked { sink: String, message: String },

    /// The dispatcher thread could not be started
    #[error("Failed to spawn dispatcher thread: {0}")]
    DispatcherSpawn(#[source] std::io::Error),

    /// Sink already closed
    #[error("Sink '{0}' is closed")]
    SinkClosed(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl RelayError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        RelayError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a sink failure error
    pub fn sink(sink: impl Into<String>, message: impl Into<String>) -> Self {
        RelayError::SinkFailure {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create a sink panic error
    pub fn sink_panicked(sink: impl Into<String>, message: impl Into<String>) -> Self {
        RelayError::SinkPanicked {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create a closed-sink error
    pub fn sink_closed(sink: impl Into<String>) -> Self {
        RelayError::SinkClosed(sink.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        RelayError::Other(msg.into())
    }

    /// True for errors caused by caller misuse of the configuration surface
    pub fn is_configuration(&self) -> bool {
        matches!(self, RelayError::InvalidConfiguration { .. })
    }
}
