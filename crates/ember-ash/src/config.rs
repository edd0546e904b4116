//! Link configuration.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::MAX_WINDOW;
use crate::error::LinkError;

/// Tuning parameters of the link state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConfig {
    /// Maximum unacknowledged DATA frames (1..=4).
    pub window_size: u8,

    /// Acknowledgement timeout before any round trip has been measured.
    pub ack_timeout_init_ms: u64,

    /// Lower bound of the adaptive acknowledgement timeout.
    pub ack_timeout_min_ms: u64,

    /// Upper bound of the adaptive acknowledgement timeout.
    pub ack_timeout_max_ms: u64,

    /// Retransmissions of one frame before the link is declared failed.
    pub max_retries: u32,

    /// Time to wait for a reset acknowledgement.
    pub reset_timeout_ms: u64,

    /// Reset requests sent before giving up.
    pub max_reset_attempts: u32,

    /// How long a not-ready signal from the peer holds back new DATA frames.
    /// After this the peer is assumed ready again, which recovers from a
    /// lost XON or ready ACK.
    pub not_ready_timeout_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            window_size: MAX_WINDOW,
            ack_timeout_init_ms: 1600,
            ack_timeout_min_ms: 400,
            ack_timeout_max_ms: 3200,
            max_retries: 4,
            reset_timeout_ms: 3200,
            max_reset_attempts: 5,
            not_ready_timeout_ms: 1000,
        }
    }
}

impl LinkConfig {
    /// Set the window size.
    pub fn with_window_size(mut self, window_size: u8) -> Self {
        self.window_size = window_size;
        self
    }

    /// Set the initial acknowledgement timeout.
    pub fn with_ack_timeout_ms(mut self, ack_timeout_ms: u64) -> Self {
        self.ack_timeout_init_ms = ack_timeout_ms;
        self
    }

    /// Set the retry limit.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the reset handshake timeout.
    pub fn with_reset_timeout_ms(mut self, reset_timeout_ms: u64) -> Self {
        self.reset_timeout_ms = reset_timeout_ms;
        self
    }

    pub fn ack_timeout_init(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_init_ms)
    }

    pub fn ack_timeout_min(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_min_ms)
    }

    pub fn ack_timeout_max(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_max_ms)
    }

    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }

    pub fn not_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.not_ready_timeout_ms)
    }

    /// Check that every value is in range.
    pub fn validate(&self) -> Result<(), LinkError> {
        if self.window_size == 0 || self.window_size > MAX_WINDOW {
            return Err(LinkError::InvalidConfig(format!(
                "window_size must be between 1 and {}, got {}",
                MAX_WINDOW, self.window_size
            )));
        }
        if self.ack_timeout_min_ms == 0 {
            return Err(LinkError::InvalidConfig(
                "ack_timeout_min_ms must be positive".to_string(),
            ));
        }
        if self.ack_timeout_min_ms > self.ack_timeout_max_ms {
            return Err(LinkError::InvalidConfig(format!(
                "ack_timeout_min_ms ({}) exceeds ack_timeout_max_ms ({})",
                self.ack_timeout_min_ms, self.ack_timeout_max_ms
            )));
        }
        if self.reset_timeout_ms == 0 || self.max_reset_attempts == 0 {
            return Err(LinkError::InvalidConfig(
                "reset_timeout_ms and max_reset_attempts must be positive".to_string(),
            ));
        }
        if self.not_ready_timeout_ms == 0 {
            return Err(LinkError::InvalidConfig(
                "not_ready_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
