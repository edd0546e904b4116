//! Error types for the link layer.

use thiserror::Error;

/// A received frame that could not be recovered.
///
/// Framing errors drop the frame and are answered with a NAK; they never
/// close the link.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// An escape marker was followed by a byte that is not an escaped
    /// reserved byte.
    #[error("invalid escaped byte 0x{0:02X}")]
    InvalidEscape(u8),

    /// The frame ended right after an escape marker.
    #[error("frame ends inside an escape sequence")]
    TruncatedEscape,

    /// CRC mismatch.
    #[error("CRC mismatch: expected 0x{expected:04X}, got 0x{actual:04X}")]
    BadCrc {
        /// CRC computed over the received bytes.
        expected: u16,
        /// CRC carried by the frame.
        actual: u16,
    },

    /// Fewer bytes than control plus CRC.
    #[error("frame too short: {0} bytes")]
    TooShort(usize),

    /// More bytes than the longest legal frame.
    #[error("frame too long: {0} bytes")]
    TooLong(usize),

    /// Control byte outside the defined frame types.
    #[error("unknown control byte 0x{0:02X}")]
    UnknownControl(u8),

    /// The data length does not match the frame type.
    #[error("invalid data length {length} for {frame} frame")]
    InvalidLength {
        /// Frame type name.
        frame: &'static str,
        /// Received data length.
        length: usize,
    },

    /// A substitute byte marked the frame as corrupt.
    #[error("frame aborted by substitute byte")]
    Aborted,
}

/// Fatal link conditions and caller errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// A DATA frame went unacknowledged through every retry.
    #[error("frame {seq} unacknowledged after {retries} retries")]
    RetryLimitExceeded {
        /// Link sequence number of the frame.
        seq: u8,
        /// Retries attempted.
        retries: u32,
    },

    /// The reset handshake was not acknowledged.
    #[error("link reset failed after {attempts} attempts")]
    ResetFailed {
        /// Reset requests sent.
        attempts: u32,
    },

    /// The peer reported a fatal error.
    #[error("peer reported error 0x{code:02X}")]
    PeerError {
        /// Error code from the ERROR frame.
        code: u8,
    },

    /// The peer reset the link while it was connected.
    #[error("peer reset the link (reset code 0x{code:02X})")]
    PeerReset {
        /// Reset code from the RSTACK frame.
        code: u8,
    },

    /// The peer speaks another protocol version.
    #[error("unsupported link protocol version 0x{0:02X}")]
    UnsupportedVersion(u8),

    /// No connection has been established, or it has failed.
    #[error("link not connected")]
    NotConnected,

    /// The payload does not fit in one DATA frame.
    #[error("payload of {length} bytes exceeds the {max} byte limit")]
    PayloadTooLarge {
        /// Payload length.
        length: usize,
        /// Largest allowed payload.
        max: usize,
    },

    /// DATA frames must carry at least one byte.
    #[error("empty payload")]
    EmptyPayload,

    /// A configuration value is out of range.
    #[error("invalid link configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FramingError::BadCrc {
            expected: 0x38BC,
            actual: 0x0000,
        };
        assert_eq!(err.to_string(), "CRC mismatch: expected 0x38BC, got 0x0000");

        let err = LinkError::RetryLimitExceeded { seq: 3, retries: 4 };
        assert_eq!(err.to_string(), "frame 3 unacknowledged after 4 retries");
    }
}
