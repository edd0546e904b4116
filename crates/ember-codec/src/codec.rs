//! Value encoding and decoding against a [`WireType`].
//!
//! All multi-byte integers are little-endian. The 8-byte identifier types are
//! written as their canonical bytes reversed, so the address
//! `1234567890123456` travels as `56 34 12 90 78 56 34 12`.
//!
//! | Wire type                 | Encoding                                        |
//! |---------------------------|-------------------------------------------------|
//! | `Bool`                    | 1 byte, `0x00` or `0x01`                        |
//! | `UintN` / `IntN`          | N/8 bytes, little-endian, two's complement      |
//! | `IeeeAddress`/`ExtendedPanId` | 8 bytes, reversed                           |
//! | `OctetString`/`CharString`| length byte + bytes                             |
//! | `List(prefix, X)`         | count (0, 1 or 2 bytes) + each X in order       |

use bytes::BufMut;

use crate::error::{DecodeError, DecodeResult, EncodeError};
use crate::types::{ExtendedAttributeInformation, ExtendedPanId, IeeeAddress, IDENTIFIER_SIZE};
use crate::wire::{LengthPrefix, Value, WireType};

// ============================================================================
// Encoding
// ============================================================================

/// Encode a value into a fresh byte vector.
pub fn encode(value: &Value, wire: WireType) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::with_capacity(wire.fixed_width().unwrap_or(16));
    encode_into(value, wire, &mut buf)?;
    Ok(buf)
}

/// Encode a value, appending to `out`.
///
/// On error `out` may hold a partially written value; callers discard the
/// buffer.
pub fn encode_into(value: &Value, wire: WireType, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    match wire {
        WireType::Bool => match value {
            Value::Bool(b) => out.put_u8(u8::from(*b)),
            other => return Err(EncodeError::mismatch(wire, other.kind())),
        },

        WireType::Data8
        | WireType::Data16
        | WireType::Bitmap8
        | WireType::Bitmap16
        | WireType::Enum8
        | WireType::Enum16
        | WireType::Uint8
        | WireType::Uint16
        | WireType::Uint24
        | WireType::Uint32
        | WireType::Uint48
        | WireType::Uint64 => {
            let width = wire.fixed_width().unwrap_or(8);
            let v = match value {
                Value::Unsigned(v) => *v,
                Value::Bool(b) if width == 1 => u64::from(*b),
                other => return Err(EncodeError::mismatch(wire, other.kind())),
            };
            if width < 8 && v >> (width * 8) != 0 {
                return Err(EncodeError::out_of_range(wire, v));
            }
            out.put_uint_le(v, width);
        }

        WireType::Int8
        | WireType::Int16
        | WireType::Int24
        | WireType::Int32
        | WireType::Int48
        | WireType::Int64 => {
            let width = wire.fixed_width().unwrap_or(8);
            let v = match value {
                Value::Signed(v) => *v,
                other => return Err(EncodeError::mismatch(wire, other.kind())),
            };
            if width < 8 {
                let bits = width * 8;
                let min = -(1i64 << (bits - 1));
                let max = (1i64 << (bits - 1)) - 1;
                if v < min || v > max {
                    return Err(EncodeError::out_of_range(wire, v));
                }
            }
            out.put_int_le(v, width);
        }

        WireType::IeeeAddress => match value {
            Value::IeeeAddress(addr) => out.put_slice(&addr.to_wire()),
            other => return Err(EncodeError::mismatch(wire, other.kind())),
        },

        WireType::ExtendedPanId => match value {
            Value::ExtendedPanId(id) => out.put_slice(&id.to_wire()),
            other => return Err(EncodeError::mismatch(wire, other.kind())),
        },

        WireType::Octets(len) => match value {
            Value::Bytes(bytes) if bytes.len() == len => out.put_slice(bytes),
            Value::Bytes(bytes) => {
                return Err(EncodeError::LengthMismatch {
                    wire,
                    expected: len,
                    actual: bytes.len(),
                })
            }
            other => return Err(EncodeError::mismatch(wire, other.kind())),
        },

        WireType::OctetString | WireType::CharString => {
            let bytes = match (wire, value) {
                (WireType::OctetString, Value::Bytes(bytes)) => bytes.as_slice(),
                (WireType::CharString, Value::String(s)) => s.as_bytes(),
                (_, other) => return Err(EncodeError::mismatch(wire, other.kind())),
            };
            if bytes.len() > u8::MAX as usize {
                return Err(EncodeError::TooLong {
                    wire,
                    max: u8::MAX as usize,
                    actual: bytes.len(),
                });
            }
            out.put_u8(bytes.len() as u8);
            out.put_slice(bytes);
        }

        WireType::ExtendedAttributeInformation => match value {
            Value::ExtendedAttributeInformation(info) => {
                out.put_u16_le(info.attribute_id);
                out.put_u8(info.data_type);
                out.put_u8(info.access_control);
            }
            other => return Err(EncodeError::mismatch(wire, other.kind())),
        },

        WireType::List(prefix, element) => {
            let items = match value {
                Value::List(items) => items,
                other => return Err(EncodeError::mismatch(wire, other.kind())),
            };
            if items.len() > prefix.max_count() {
                return Err(EncodeError::TooLong {
                    wire,
                    max: prefix.max_count(),
                    actual: items.len(),
                });
            }
            match prefix {
                LengthPrefix::None => {}
                LengthPrefix::U8 => out.put_u8(items.len() as u8),
                LengthPrefix::U16 => out.put_u16_le(items.len() as u16),
            }
            for item in items {
                encode_into(item, *element, out)?;
            }
        }
    }

    Ok(())
}

/// Compute the encoded size of a value without encoding it.
pub fn encoded_len(value: &Value, wire: WireType) -> Result<usize, EncodeError> {
    if let Some(width) = wire.fixed_width() {
        return Ok(width);
    }
    match (wire, value) {
        (WireType::OctetString, Value::Bytes(bytes)) => Ok(1 + bytes.len()),
        (WireType::CharString, Value::String(s)) => Ok(1 + s.len()),
        (WireType::List(prefix, element), Value::List(items)) => items
            .iter()
            .try_fold(prefix.width(), |acc, item| {
                Ok(acc + encoded_len(item, *element)?)
            }),
        (_, other) => Err(EncodeError::mismatch(wire, other.kind())),
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode one value starting at `cursor`.
///
/// Returns the value and the number of bytes consumed. Fails without
/// consuming anything if the buffer ends before the value does.
pub fn decode(bytes: &[u8], cursor: usize, wire: WireType) -> DecodeResult<(Value, usize)> {
    let available = bytes.len().saturating_sub(cursor);

    if let Some(width) = wire.fixed_width() {
        if available < width {
            return Err(DecodeError::truncated(cursor, width, available));
        }
    }

    let value = match wire {
        WireType::Bool => match bytes[cursor] {
            0x00 => Value::Bool(false),
            0x01 => Value::Bool(true),
            other => {
                return Err(DecodeError::invalid_at(
                    cursor,
                    format!("boolean byte 0x{:02X}", other),
                ))
            }
        },

        WireType::Data8
        | WireType::Data16
        | WireType::Bitmap8
        | WireType::Bitmap16
        | WireType::Enum8
        | WireType::Enum16
        | WireType::Uint8
        | WireType::Uint16
        | WireType::Uint24
        | WireType::Uint32
        | WireType::Uint48
        | WireType::Uint64 => {
            let width = wire.fixed_width().unwrap_or(8);
            Value::Unsigned(read_uint_le(&bytes[cursor..cursor + width]))
        }

        WireType::Int8
        | WireType::Int16
        | WireType::Int24
        | WireType::Int32
        | WireType::Int48
        | WireType::Int64 => {
            let width = wire.fixed_width().unwrap_or(8);
            let raw = read_uint_le(&bytes[cursor..cursor + width]);
            let shift = 64 - width * 8;
            Value::Signed(((raw << shift) as i64) >> shift)
        }

        WireType::IeeeAddress => Value::IeeeAddress(IeeeAddress::from_wire(read_identifier(
            bytes, cursor,
        ))),

        WireType::ExtendedPanId => Value::ExtendedPanId(ExtendedPanId::from_wire(
            read_identifier(bytes, cursor),
        )),

        WireType::Octets(len) => Value::Bytes(bytes[cursor..cursor + len].to_vec()),

        WireType::OctetString | WireType::CharString => {
            if available < 1 {
                return Err(DecodeError::truncated(cursor, 1, available));
            }
            let len = bytes[cursor] as usize;
            if available < 1 + len {
                return Err(DecodeError::truncated(cursor, 1 + len, available));
            }
            let data = bytes[cursor + 1..cursor + 1 + len].to_vec();
            let value = if wire == WireType::CharString {
                let text = String::from_utf8(data)
                    .map_err(|_| DecodeError::invalid_at(cursor + 1, "invalid UTF-8 in string"))?;
                Value::String(text)
            } else {
                Value::Bytes(data)
            };
            return Ok((value, 1 + len));
        }

        WireType::ExtendedAttributeInformation => {
            Value::ExtendedAttributeInformation(ExtendedAttributeInformation {
                attribute_id: u16::from_le_bytes([bytes[cursor], bytes[cursor + 1]]),
                data_type: bytes[cursor + 2],
                access_control: bytes[cursor + 3],
            })
        }

        WireType::List(prefix, element) => return decode_list(bytes, cursor, prefix, *element),
    };

    // Fixed-width arms fall through to here.
    Ok((value, wire.fixed_width().unwrap_or(0)))
}

fn decode_list(
    bytes: &[u8],
    cursor: usize,
    prefix: LengthPrefix,
    element: WireType,
) -> DecodeResult<(Value, usize)> {
    let available = bytes.len().saturating_sub(cursor);
    let width = prefix.width();
    if available < width {
        return Err(DecodeError::truncated(cursor, width, available));
    }

    let count = match prefix {
        LengthPrefix::None => None,
        LengthPrefix::U8 => Some(bytes[cursor] as usize),
        LengthPrefix::U16 => Some(u16::from_le_bytes([bytes[cursor], bytes[cursor + 1]]) as usize),
    };

    let mut pos = cursor + width;
    let mut items = Vec::with_capacity(count.unwrap_or(0).min(256));
    match count {
        Some(count) => {
            for _ in 0..count {
                let (item, used) = decode(bytes, pos, element)?;
                items.push(item);
                pos += used;
            }
        }
        None => {
            while pos < bytes.len() {
                let (item, used) = decode(bytes, pos, element)?;
                if used == 0 {
                    return Err(DecodeError::invalid_at(pos, "zero-width list element"));
                }
                items.push(item);
                pos += used;
            }
        }
    }

    Ok((Value::List(items), pos - cursor))
}

fn read_uint_le(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

fn read_identifier(bytes: &[u8], cursor: usize) -> [u8; IDENTIFIER_SIZE] {
    let mut wire = [0u8; IDENTIFIER_SIZE];
    wire.copy_from_slice(&bytes[cursor..cursor + IDENTIFIER_SIZE]);
    wire
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::N_X_CLUSTER_ID;

    #[test]
    fn test_uint16_little_endian() {
        let bytes = encode(&Value::Unsigned(0x0397), WireType::Uint16).unwrap();
        assert_eq!(bytes, vec![0x97, 0x03]);

        let (value, used) = decode(&[0x97, 0x03], 0, WireType::Uint16).unwrap();
        assert_eq!(value, Value::Unsigned(0x0397));
        assert_eq!(used, 2);
    }

    #[test]
    fn test_signed_16_bit_fixture() {
        let (value, _) = decode(&[0x97, 0x03], 0, WireType::Int16).unwrap();
        assert_eq!(value, Value::Signed(0x397));
    }

    #[test]
    fn test_data_8_bit_fixture() {
        let (value, used) = decode(&[0x09], 0, WireType::Data8).unwrap();
        assert_eq!(value, Value::Unsigned(0x09));
        assert_eq!(used, 1);
    }

    #[test]
    fn test_signed_sign_extension() {
        let bytes = encode(&Value::Signed(-2), WireType::Int24).unwrap();
        assert_eq!(bytes, vec![0xFE, 0xFF, 0xFF]);
        let (value, _) = decode(&bytes, 0, WireType::Int24).unwrap();
        assert_eq!(value, Value::Signed(-2));

        let (value, _) = decode(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x80], 0, WireType::Int48).unwrap();
        assert_eq!(value, Value::Signed(-(1i64 << 47)));
    }

    #[test]
    fn test_identifier_fixture() {
        let wire = [0x56, 0x34, 0x12, 0x90, 0x78, 0x56, 0x34, 0x12];
        let (value, used) = decode(&wire, 0, WireType::IeeeAddress).unwrap();
        assert_eq!(used, 8);
        assert_eq!(
            value,
            Value::IeeeAddress("1234567890123456".parse().unwrap())
        );
        assert_eq!(encode(&value, WireType::IeeeAddress).unwrap(), wire.to_vec());

        let (value, _) = decode(&wire, 0, WireType::ExtendedPanId).unwrap();
        assert_eq!(
            value,
            Value::ExtendedPanId("1234567890123456".parse().unwrap())
        );
    }

    #[test]
    fn test_cluster_list_fixture() {
        let value = Value::from(vec![0u16, 1, 6]);
        let bytes = encode(&value, N_X_CLUSTER_ID).unwrap();
        assert_eq!(bytes, vec![0x03, 0x00, 0x00, 0x01, 0x00, 0x06, 0x00]);
        assert_eq!(encoded_len(&value, N_X_CLUSTER_ID).unwrap(), 7);

        let (decoded, used) = decode(&bytes, 0, N_X_CLUSTER_ID).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(used, 7);
    }

    #[test]
    fn test_list_truncated() {
        // Count says three, only two elements follow.
        let bytes = [0x03, 0x00, 0x00, 0x01, 0x00];
        let err = decode(&bytes, 0, N_X_CLUSTER_ID).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { offset: 5, .. }));
    }

    #[test]
    fn test_partial_element_rejected() {
        let list = WireType::List(LengthPrefix::None, &WireType::Uint16);
        let err = decode(&[0x01, 0x00, 0x02], 0, list).unwrap_err();
        assert_eq!(err, DecodeError::truncated(2, 2, 1));
    }

    #[test]
    fn test_encode_errors() {
        assert_eq!(
            encode(&Value::Unsigned(256), WireType::Uint8),
            Err(EncodeError::out_of_range(WireType::Uint8, 256))
        );
        assert_eq!(
            encode(&Value::Signed(128), WireType::Int8),
            Err(EncodeError::out_of_range(WireType::Int8, 128))
        );
        assert!(matches!(
            encode(&Value::String("x".into()), WireType::Uint16),
            Err(EncodeError::TypeMismatch { .. })
        ));
        assert!(matches!(
            encode(&Value::Bytes(vec![1, 2]), WireType::Octets(3)),
            Err(EncodeError::LengthMismatch { expected: 3, actual: 2, .. })
        ));
        let too_many = Value::List(vec![Value::Unsigned(0); 256]);
        assert!(matches!(
            encode(&too_many, N_X_CLUSTER_ID),
            Err(EncodeError::TooLong { max: 255, actual: 256, .. })
        ));
    }

    #[test]
    fn test_strings() {
        let bytes = encode(&Value::String("hi".into()), WireType::CharString).unwrap();
        assert_eq!(bytes, vec![0x02, b'h', b'i']);
        let (value, used) = decode(&bytes, 0, WireType::CharString).unwrap();
        assert_eq!(value, Value::String("hi".into()));
        assert_eq!(used, 3);

        assert!(decode(&[0x02, 0xFF, 0xFE], 0, WireType::CharString).is_err());
    }

    #[test]
    fn test_bool_rejects_other_bytes() {
        assert!(decode(&[0x02], 0, WireType::Bool).is_err());
    }
}
