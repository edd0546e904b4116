//! Wire types and the values they carry.

use std::fmt;

use crate::error::DecodeError;
use crate::types::{ExtendedAttributeInformation, ExtendedPanId, IeeeAddress};

/// Width of the element count that precedes a list on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthPrefix {
    /// No count; elements run to the end of the buffer.
    None,
    /// One-byte count.
    U8,
    /// Two-byte little-endian count.
    U16,
}

impl LengthPrefix {
    /// Bytes taken by the prefix itself.
    pub const fn width(self) -> usize {
        match self {
            LengthPrefix::None => 0,
            LengthPrefix::U8 => 1,
            LengthPrefix::U16 => 2,
        }
    }

    /// Largest element count the prefix can express.
    pub const fn max_count(self) -> usize {
        match self {
            LengthPrefix::None => usize::MAX,
            LengthPrefix::U8 => u8::MAX as usize,
            LengthPrefix::U16 => u16::MAX as usize,
        }
    }
}

/// Wire representation of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Bool,
    Data8,
    Data16,
    Bitmap8,
    Bitmap16,
    Enum8,
    Enum16,
    Uint8,
    Uint16,
    Uint24,
    Uint32,
    Uint48,
    Uint64,
    Int8,
    Int16,
    Int24,
    Int32,
    Int48,
    Int64,
    /// 8-byte device address, reversed on the wire.
    IeeeAddress,
    /// 8-byte network identifier, reversed on the wire.
    ExtendedPanId,
    /// Fixed number of raw bytes.
    Octets(usize),
    /// Byte string with a one-byte length prefix.
    OctetString,
    /// UTF-8 string with a one-byte length prefix.
    CharString,
    /// Attribute id, data type and access control (4 bytes).
    ExtendedAttributeInformation,
    /// "N of X": a counted sequence of a nested type.
    List(LengthPrefix, &'static WireType),
}

/// List of 16-bit cluster identifiers with a one-byte count.
pub const N_X_CLUSTER_ID: WireType = WireType::List(LengthPrefix::U8, &WireType::Uint16);

/// Attribute identifiers running to the end of the frame.
pub const N_X_ATTRIBUTE_IDENTIFIER: WireType =
    WireType::List(LengthPrefix::None, &WireType::Uint16);

/// Extended attribute records running to the end of the frame.
pub const N_X_EXTENDED_ATTRIBUTE_INFORMATION: WireType =
    WireType::List(LengthPrefix::None, &WireType::ExtendedAttributeInformation);

impl WireType {
    /// Encoded width for types whose size does not depend on the value.
    pub fn fixed_width(&self) -> Option<usize> {
        use WireType::*;
        match self {
            Bool | Data8 | Bitmap8 | Enum8 | Uint8 | Int8 => Some(1),
            Data16 | Bitmap16 | Enum16 | Uint16 | Int16 => Some(2),
            Uint24 | Int24 => Some(3),
            Uint32 | Int32 => Some(4),
            Uint48 | Int48 => Some(6),
            Uint64 | Int64 => Some(8),
            IeeeAddress | ExtendedPanId => Some(8),
            Octets(len) => Some(*len),
            ExtendedAttributeInformation => {
                Some(crate::types::ExtendedAttributeInformation::SIZE)
            }
            OctetString | CharString | List(..) => None,
        }
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> &'static str {
        use WireType::*;
        match self {
            Bool => "BOOLEAN",
            Data8 => "DATA_8_BIT",
            Data16 => "DATA_16_BIT",
            Bitmap8 => "BITMAP_8_BIT",
            Bitmap16 => "BITMAP_16_BIT",
            Enum8 => "ENUMERATION_8_BIT",
            Enum16 => "ENUMERATION_16_BIT",
            Uint8 => "UNSIGNED_8_BIT_INTEGER",
            Uint16 => "UNSIGNED_16_BIT_INTEGER",
            Uint24 => "UNSIGNED_24_BIT_INTEGER",
            Uint32 => "UNSIGNED_32_BIT_INTEGER",
            Uint48 => "UNSIGNED_48_BIT_INTEGER",
            Uint64 => "UNSIGNED_64_BIT_INTEGER",
            Int8 => "SIGNED_8_BIT_INTEGER",
            Int16 => "SIGNED_16_BIT_INTEGER",
            Int24 => "SIGNED_24_BIT_INTEGER",
            Int32 => "SIGNED_32_BIT_INTEGER",
            Int48 => "SIGNED_48_BIT_INTEGER",
            Int64 => "SIGNED_64_BIT_INTEGER",
            IeeeAddress => "IEEE_ADDRESS",
            ExtendedPanId => "EXTENDED_PANID",
            Octets(_) => "OCTETS",
            OctetString => "OCTET_STRING",
            CharString => "CHARACTER_STRING",
            ExtendedAttributeInformation => "EXTENDED_ATTRIBUTE_INFORMATION",
            List(..) => "N_X",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireType::Octets(len) => write!(f, "OCTETS[{}]", len),
            WireType::List(_, element) => write!(f, "N_X_{}", element),
            other => f.write_str(other.name()),
        }
    }
}

/// A decoded or to-be-encoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Unsigned(u64),
    Signed(i64),
    Bytes(Vec<u8>),
    String(String),
    IeeeAddress(IeeeAddress),
    ExtendedPanId(ExtendedPanId),
    ExtendedAttributeInformation(ExtendedAttributeInformation),
    List(Vec<Value>),
}

impl Value {
    /// Variant name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Unsigned(_) => "unsigned",
            Value::Signed(_) => "signed",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::IeeeAddress(_) => "ieee address",
            Value::ExtendedPanId(_) => "extended pan id",
            Value::ExtendedAttributeInformation(_) => "extended attribute information",
            Value::List(_) => "list",
        }
    }

    /// Take the raw bytes of an octet value.
    pub fn into_bytes(self) -> Result<Vec<u8>, DecodeError> {
        match self {
            Value::Bytes(bytes) => Ok(bytes),
            other => Err(DecodeError::mismatch("bytes", other)),
        }
    }
}

macro_rules! unsigned_conversions {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::Unsigned(value as u64)
            }
        }

        impl TryFrom<Value> for $ty {
            type Error = DecodeError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    Value::Unsigned(v) => {
                        <$ty>::try_from(v).map_err(|_| DecodeError::mismatch(stringify!($ty), v))
                    }
                    other => Err(DecodeError::mismatch(stringify!($ty), other)),
                }
            }
        }
    )*};
}

macro_rules! signed_conversions {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::Signed(value as i64)
            }
        }

        impl TryFrom<Value> for $ty {
            type Error = DecodeError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    Value::Signed(v) => {
                        <$ty>::try_from(v).map_err(|_| DecodeError::mismatch(stringify!($ty), v))
                    }
                    other => Err(DecodeError::mismatch(stringify!($ty), other)),
                }
            }
        }
    )*};
}

macro_rules! wrapped_conversions {
    ($($variant:ident($ty:ty)),*) => {$(
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::$variant(value)
            }
        }

        impl TryFrom<Value> for $ty {
            type Error = DecodeError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(DecodeError::mismatch(stringify!($ty), other)),
                }
            }
        }
    )*};
}

unsigned_conversions!(u8, u16, u32, u64);
signed_conversions!(i8, i16, i32, i64);
wrapped_conversions!(
    Bool(bool),
    String(String),
    IeeeAddress(IeeeAddress),
    ExtendedPanId(ExtendedPanId),
    ExtendedAttributeInformation(ExtendedAttributeInformation)
);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: TryFrom<Value, Error = DecodeError>> TryFrom<Value> for Vec<T> {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::List(items) => items.into_iter().map(T::try_from).collect(),
            other => Err(DecodeError::mismatch("list", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_widths() {
        assert_eq!(WireType::Uint24.fixed_width(), Some(3));
        assert_eq!(WireType::Int48.fixed_width(), Some(6));
        assert_eq!(WireType::IeeeAddress.fixed_width(), Some(8));
        assert_eq!(WireType::Octets(16).fixed_width(), Some(16));
        assert_eq!(WireType::ExtendedAttributeInformation.fixed_width(), Some(4));
        assert_eq!(N_X_CLUSTER_ID.fixed_width(), None);
    }

    #[test]
    fn test_display_nested_list() {
        assert_eq!(N_X_CLUSTER_ID.to_string(), "N_X_UNSIGNED_16_BIT_INTEGER");
    }

    #[test]
    fn test_value_conversions() {
        let value: Value = 0x0104u16.into();
        assert_eq!(value, Value::Unsigned(0x0104));
        assert_eq!(u16::try_from(value.clone()), Ok(0x0104));
        assert!(u8::try_from(value).is_err());

        let list: Value = vec![0u16, 1, 6].into();
        let back: Vec<u16> = list.try_into().unwrap();
        assert_eq!(back, vec![0, 1, 6]);

        assert!(i8::try_from(Value::Unsigned(1)).is_err());
    }
}
