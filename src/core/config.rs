//! Relay configuration surface

use super::error::{RelayError, Result};
use super::overflow_policy::OverflowPolicy;
use serde::{Deserialize, Serialize};

/// Default buffer size (128 events)
pub const DEFAULT_BUFFER_SIZE: usize = 128;

/// Settings consumed by [`Relay::configure`](crate::Relay::configure)
///
/// `buffer_size` is signed because configuration usually arrives from
/// outside the program; negative values are rejected by [`validate`](Self::validate)
/// and zero is treated as one.
///
/// # Example
///
/// ```
/// use rust_log_relay::RelayConfig;
///
/// let config: RelayConfig = serde_json::from_str(r#"{"buffer_size": 0, "blocking": true}"#).unwrap();
/// assert_eq!(config.effective_capacity().unwrap(), 1);
/// assert!(!config.location_info);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub buffer_size: i64,
    pub blocking: bool,
    pub location_info: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE as i64,
            blocking: false,
            location_info: false,
        }
    }
}

impl RelayConfig {
    pub fn new(buffer_size: i64, blocking: bool, location_info: bool) -> Self {
        Self {
            buffer_size,
            blocking,
            location_info,
        }
    }

    pub fn validate(&self) -> Result<()> {
        effective_capacity(self.buffer_size).map(|_| ())
    }

    /// Capacity the buffer will actually use
    pub fn effective_capacity(&self) -> Result<usize> {
        effective_capacity(self.buffer_size)
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        OverflowPolicy::from(self.blocking)
    }
}

/// Map a requested buffer size to a usable capacity: negative is an error,
/// zero becomes one.
pub(crate) fn effective_capacity(size: i64) -> Result<usize> {
    if size < 0 {
        return Err(RelayError::config(
            "Relay",
            format!("buffer size must not be negative, got {}", size),
        ));
    }
    let size = usize::try_from(size).map_err(|_| {
        RelayError::config("Relay", format!("buffer size {} is too large", size))
    })?;
    Ok(size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.buffer_size, 128);
        assert_eq!(config.overflow_policy(), OverflowPolicy::Discard);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_is_coerced_to_one() {
        assert_eq!(RelayConfig::new(0, false, false).effective_capacity().unwrap(), 1);
        assert_eq!(RelayConfig::new(1, false, false).effective_capacity().unwrap(), 1);
    }

    #[test]
    fn test_negative_is_rejected() {
        let err = RelayConfig::new(-1, false, false).validate().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("-1"));
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: RelayConfig = serde_json::from_str(r#"{"location_info": true}"#).unwrap();
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE as i64);
        assert!(config.location_info);
        assert!(!config.blocking);
    }
}
