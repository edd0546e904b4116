//! Session configuration.

use std::time::Duration;

use ember_ash::LinkConfig;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Largest correlation sequence space: the EZSP header carries one byte.
pub const MAX_SEQUENCE_MODULUS: u16 = 256;

/// Configuration for a [`crate::TransportSession`].
///
/// Link parameters sit at the top level alongside the session's own:
///
/// ```yaml
/// window_size: 2
/// max_retries: 3
/// request_timeout_ms: 500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Link layer tuning.
    #[serde(flatten)]
    pub link: LinkConfig,

    /// Correlation sequence numbers wrap at this value (1..=256).
    pub sequence_modulus: u16,

    /// Deadline used by [`crate::TransportSession::request`].
    pub request_timeout_ms: u64,

    /// Size of the channel read buffer in bytes.
    pub read_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            link: LinkConfig::default(),
            sequence_modulus: MAX_SEQUENCE_MODULUS,
            request_timeout_ms: 5000,
            read_buffer_size: 256,
        }
    }
}

impl SessionConfig {
    /// Parse a YAML document and validate it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SessionError> {
        let config: SessionConfig =
            serde_yaml::from_str(yaml).map_err(|e| SessionError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the link section.
    pub fn with_link(mut self, link: LinkConfig) -> Self {
        self.link = link;
        self
    }

    /// Set the correlation sequence modulus.
    pub fn with_sequence_modulus(mut self, modulus: u16) -> Self {
        self.sequence_modulus = modulus;
        self
    }

    /// Set the default request deadline.
    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Check that every value is in range.
    pub fn validate(&self) -> Result<(), SessionError> {
        self.link
            .validate()
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;
        if self.sequence_modulus == 0 || self.sequence_modulus > MAX_SEQUENCE_MODULUS {
            return Err(SessionError::InvalidConfig(format!(
                "sequence_modulus must be between 1 and {}, got {}",
                MAX_SEQUENCE_MODULUS, self.sequence_modulus
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(SessionError::InvalidConfig(
                "request_timeout_ms must be positive".to_string(),
            ));
        }
        if self.read_buffer_size == 0 {
            return Err(SessionError::InvalidConfig(
                "read_buffer_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
