//! Session error taxonomy.

use ember_ash::LinkError;
use ember_codec::EncodeError;
use thiserror::Error;

/// Errors surfaced to session callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The frame could not be serialized. Raised before anything is sent.
    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),

    /// The serialized frame does not fit in one link packet.
    #[error("frame of {length} bytes exceeds the {max} byte link limit")]
    FrameTooLarge {
        /// Header plus body length.
        length: usize,
        /// Largest link payload.
        max: usize,
    },

    /// No matching response arrived before the request deadline.
    #[error("no response within {timeout_ms} ms")]
    RequestTimeout {
        /// Deadline the request was sent with.
        timeout_ms: u64,
    },

    /// The request was cancelled, or the session closed while it was pending.
    #[error("request cancelled")]
    Cancelled,

    /// The link failed or the peer reset it.
    #[error("link failure: {0}")]
    LinkFailure(#[from] LinkError),

    /// Every correlation sequence number is held by a pending request.
    #[error("all {0} sequence numbers are in use")]
    TooManyPending(u16),

    /// The session is closed.
    #[error("session closed")]
    Closed,

    /// Reading or writing the byte channel failed.
    #[error("channel error: {0}")]
    Channel(String),

    /// A configuration value is out of range.
    #[error("invalid session configuration: {0}")]
    InvalidConfig(String),
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Channel(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_errors_convert() {
        let err: SessionError = LinkError::ResetFailed { attempts: 5 }.into();
        assert_eq!(
            err.to_string(),
            "link failure: link reset failed after 5 attempts"
        );
    }

    #[test]
    fn test_io_errors_convert() {
        let err: SessionError =
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed").into();
        assert_eq!(err, SessionError::Channel("pipe closed".to_string()));
    }
}
