//! Error types for ember-codec.

use thiserror::Error;

use crate::{FrameId, WireType};

/// Errors raised while encoding a value against a [`WireType`].
///
/// These are caller contract violations and are never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The value variant cannot be represented by the wire type.
    #[error("{found} value cannot be encoded as {wire}")]
    TypeMismatch {
        /// Declared wire type.
        wire: WireType,
        /// Variant name of the supplied value.
        found: &'static str,
    },

    /// The value is outside the numeric domain of the wire type.
    #[error("value {value} out of range for {wire}")]
    OutOfRange {
        /// Declared wire type.
        wire: WireType,
        /// Offending value, formatted.
        value: String,
    },

    /// A fixed-length byte field was given the wrong number of bytes.
    #[error("{wire} requires exactly {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Declared wire type.
        wire: WireType,
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// A length-prefixed field holds more elements than its prefix can count.
    #[error("{wire} holds at most {max} elements, got {actual}")]
    TooLong {
        /// Declared wire type.
        wire: WireType,
        /// Maximum count the prefix can express.
        max: usize,
        /// Supplied count.
        actual: usize,
    },
}

impl EncodeError {
    /// Create a type mismatch error.
    pub fn mismatch(wire: WireType, found: &'static str) -> Self {
        EncodeError::TypeMismatch { wire, found }
    }

    /// Create an out-of-range error.
    pub fn out_of_range(wire: WireType, value: impl ToString) -> Self {
        EncodeError::OutOfRange {
            wire,
            value: value.to_string(),
        }
    }
}

/// Errors raised while decoding a byte sequence.
///
/// A decode failure drops the affected frame; the link keeps running.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Not enough bytes remain to decode the next primitive.
    #[error("truncated at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        /// Byte offset where the read started.
        offset: usize,
        /// Bytes required.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },

    /// The bytes are present but do not form a legal value.
    #[error("invalid value at offset {offset}: {message}")]
    InvalidValue {
        /// Byte offset of the value.
        offset: usize,
        /// Description of the problem.
        message: String,
    },

    /// A decoded value could not be converted to the requested Rust type.
    #[error("expected {expected}, decoded {found}")]
    TypeMismatch {
        /// Requested type.
        expected: &'static str,
        /// What was decoded.
        found: String,
    },

    /// Bytes were left over after the frame consumed its fields.
    #[error("{count} trailing bytes after frame fields")]
    TrailingBytes {
        /// Unconsumed byte count.
        count: usize,
    },
}

impl DecodeError {
    /// Create a truncation error.
    pub fn truncated(offset: usize, needed: usize, available: usize) -> Self {
        DecodeError::Truncated {
            offset,
            needed,
            available,
        }
    }

    /// Create an invalid value error at a specific offset.
    pub fn invalid_at(offset: usize, message: impl Into<String>) -> Self {
        DecodeError::InvalidValue {
            offset,
            message: message.into(),
        }
    }

    /// Create a conversion error.
    pub fn mismatch(expected: &'static str, found: impl std::fmt::Debug) -> Self {
        DecodeError::TypeMismatch {
            expected,
            found: format!("{:?}", found),
        }
    }
}

/// Lookup failure in a [`crate::FrameRegistry`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no frame registered for {0}")]
pub struct UnknownFrame(pub FrameId);

/// Any failure while turning a whole frame into or out of bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Encoding a field failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Decoding a header or field failed.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The header named a frame the registry does not know.
    #[error(transparent)]
    UnknownFrame(#[from] UnknownFrame),
}

/// Result type alias for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Direction;

    #[test]
    fn test_error_display() {
        let err = DecodeError::truncated(4, 2, 1);
        assert!(err.to_string().contains("offset 4"));

        let err = EncodeError::out_of_range(WireType::Uint8, 300);
        assert_eq!(err.to_string(), "value 300 out of range for UNSIGNED_8_BIT_INTEGER");

        let err = UnknownFrame(FrameId::new(0x0009, 0x7F, Direction::ToClient));
        assert!(err.to_string().contains("0x0009"));
    }
}
