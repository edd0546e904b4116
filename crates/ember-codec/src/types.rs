//! Identifier and composite types carried in frames.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Size of the 8-byte device and network identifiers.
pub const IDENTIFIER_SIZE: usize = 8;

/// Error returned when parsing an identifier from its hex form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseIdentifierError {
    /// The string is not 16 hex digits long.
    #[error("expected {expected} hex digits, got {actual}")]
    Length {
        /// Required digit count.
        expected: usize,
        /// Supplied digit count.
        actual: usize,
    },

    /// The string contains a non-hex character.
    #[error("invalid hex digit in identifier")]
    InvalidHex,
}

macro_rules! identifier_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        ///
        /// Stored in canonical (big-endian) order; the wire form is the same
        /// eight bytes reversed.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; IDENTIFIER_SIZE]);

        impl $name {
            /// Create an identifier from canonical big-endian bytes.
            pub fn new(bytes: [u8; IDENTIFIER_SIZE]) -> Self {
                $name(bytes)
            }

            /// Create from the little-endian wire representation.
            pub fn from_wire(wire: [u8; IDENTIFIER_SIZE]) -> Self {
                let mut bytes = wire;
                bytes.reverse();
                $name(bytes)
            }

            /// Get the little-endian wire representation.
            pub fn to_wire(&self) -> [u8; IDENTIFIER_SIZE] {
                let mut wire = self.0;
                wire.reverse();
                wire
            }

            /// Get the canonical bytes.
            pub fn as_bytes(&self) -> &[u8; IDENTIFIER_SIZE] {
                &self.0
            }

            /// Get the identifier as a 64-bit integer.
            pub fn to_u64(&self) -> u64 {
                u64::from_be_bytes(self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                $name(value.to_be_bytes())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex::encode_upper(self.0))
            }
        }

        impl FromStr for $name {
            type Err = ParseIdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.len() != IDENTIFIER_SIZE * 2 {
                    return Err(ParseIdentifierError::Length {
                        expected: IDENTIFIER_SIZE * 2,
                        actual: s.len(),
                    });
                }
                let mut bytes = [0u8; IDENTIFIER_SIZE];
                hex::decode_to_slice(s, &mut bytes)
                    .map_err(|_| ParseIdentifierError::InvalidHex)?;
                Ok($name(bytes))
            }
        }
    };
}

identifier_type!(
    /// 64-bit IEEE (EUI-64) device address.
    IeeeAddress
);

identifier_type!(
    /// 64-bit extended PAN identifier of a network.
    ExtendedPanId
);

/// One entry of a Discover Attributes Extended response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExtendedAttributeInformation {
    /// Attribute identifier.
    pub attribute_id: u16,
    /// ZCL data type code of the attribute.
    pub data_type: u8,
    /// Access control bitmap (bit 0 readable, bit 1 writable, bit 2 reportable).
    pub access_control: u8,
}

impl ExtendedAttributeInformation {
    /// Encoded size in bytes.
    pub const SIZE: usize = 4;

    /// Check if the attribute is readable.
    pub fn is_readable(&self) -> bool {
        self.access_control & 0x01 != 0
    }

    /// Check if the attribute is writable.
    pub fn is_writable(&self) -> bool {
        self.access_control & 0x02 != 0
    }

    /// Check if the attribute is reportable.
    pub fn is_reportable(&self) -> bool {
        self.access_control & 0x04 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ieee_address_wire_order() {
        let addr: IeeeAddress = "1234567890123456".parse().unwrap();
        assert_eq!(
            addr.to_wire(),
            [0x56, 0x34, 0x12, 0x90, 0x78, 0x56, 0x34, 0x12]
        );
        assert_eq!(IeeeAddress::from_wire(addr.to_wire()), addr);
        assert_eq!(addr.to_string(), "1234567890123456");
        assert_eq!(addr.to_u64(), 0x1234_5678_9012_3456);
    }

    #[test]
    fn test_identifier_parse_errors() {
        assert_eq!(
            "1234".parse::<ExtendedPanId>(),
            Err(ParseIdentifierError::Length {
                expected: 16,
                actual: 4
            })
        );
        assert_eq!(
            "12345678901234ZZ".parse::<ExtendedPanId>(),
            Err(ParseIdentifierError::InvalidHex)
        );
    }

    #[test]
    fn test_access_control_bits() {
        let info = ExtendedAttributeInformation {
            attribute_id: 0x0000,
            data_type: 0x21,
            access_control: 0x05,
        };
        assert!(info.is_readable());
        assert!(!info.is_writable());
        assert!(info.is_reportable());
    }
}
