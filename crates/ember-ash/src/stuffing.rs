//! Byte stuffing.
//!
//! Reserved bytes inside a frame are sent as [`ESCAPE`] followed by the byte
//! XOR'd with [`ESCAPE_XOR`], so the only raw [`FLAG`] on the wire is the one
//! ending each frame.

use crate::constants::*;
use crate::error::FramingError;

/// Check if `byte` must be escaped inside a frame.
#[inline]
pub fn is_reserved(byte: u8) -> bool {
    RESERVED_BYTES.contains(&byte)
}

/// Escape `data`, appending to `out`.
pub fn stuff(data: &[u8], out: &mut Vec<u8>) {
    for &byte in data {
        if is_reserved(byte) {
            out.push(ESCAPE);
            out.push(byte ^ ESCAPE_XOR);
        } else {
            out.push(byte);
        }
    }
}

/// Reverse [`stuff`] over the bytes of one frame (terminating flag removed).
pub fn unstuff(data: &[u8]) -> Result<Vec<u8>, FramingError> {
    let mut out = Vec::with_capacity(data.len());
    let mut bytes = data.iter();
    while let Some(&byte) = bytes.next() {
        if byte != ESCAPE {
            out.push(byte);
            continue;
        }
        let escaped = *bytes.next().ok_or(FramingError::TruncatedEscape)?;
        let original = escaped ^ ESCAPE_XOR;
        if !is_reserved(original) {
            return Err(FramingError::InvalidEscape(escaped));
        }
        out.push(original);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stuff_reserved_bytes() {
        let mut out = Vec::new();
        stuff(&[0x01, FLAG, ESCAPE, XON, XOFF, SUBSTITUTE, CANCEL, 0x02], &mut out);
        assert_eq!(
            out,
            vec![0x01, 0x7D, 0x5E, 0x7D, 0x5D, 0x7D, 0x31, 0x7D, 0x33, 0x7D, 0x38, 0x7D, 0x3A, 0x02]
        );
        assert_eq!(
            unstuff(&out).unwrap(),
            vec![0x01, FLAG, ESCAPE, XON, XOFF, SUBSTITUTE, CANCEL, 0x02]
        );
    }

    #[test]
    fn test_unstuff_errors() {
        assert_eq!(unstuff(&[0x01, ESCAPE]), Err(FramingError::TruncatedEscape));
        assert_eq!(
            unstuff(&[ESCAPE, 0x41]),
            Err(FramingError::InvalidEscape(0x41))
        );
    }
}
