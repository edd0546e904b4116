//! Sequential field cursors used by frame serializers.

use crate::codec;
use crate::error::{DecodeError, DecodeResult, EncodeError};
use crate::wire::{Value, WireType};

/// Append-only writer; each call encodes one logical field.
#[derive(Debug, Default)]
pub struct FieldWriter {
    buf: Vec<u8>,
}

impl FieldWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        FieldWriter {
            buf: Vec::with_capacity(64),
        }
    }

    /// Create a writer that continues after an already written header.
    pub fn with_prefix(prefix: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(prefix.len() + 64);
        buf.extend_from_slice(prefix);
        FieldWriter { buf }
    }

    /// Encode `value` as `wire` and append it.
    pub fn write(&mut self, value: impl Into<Value>, wire: WireType) -> Result<(), EncodeError> {
        self.write_value(&value.into(), wire)
    }

    /// Encode a borrowed value.
    pub fn write_value(&mut self, value: &Value, wire: WireType) -> Result<(), EncodeError> {
        codec::encode_into(value, wire, &mut self.buf)
    }

    /// Append each element of `values` without a count prefix.
    ///
    /// Used by layouts that carry element counts in separate fields.
    pub fn write_elements<T>(&mut self, values: &[T], element: WireType) -> Result<(), EncodeError>
    where
        T: Clone + Into<Value>,
    {
        for value in values {
            self.write(value.clone(), element)?;
        }
        Ok(())
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrow the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Take the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Forward-only reader over a received payload.
#[derive(Debug, Clone)]
pub struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        FieldReader { data, pos: 0 }
    }

    /// Decode the next field.
    pub fn read(&mut self, wire: WireType) -> DecodeResult<Value> {
        let (value, used) = codec::decode(self.data, self.pos, wire)?;
        self.pos += used;
        Ok(value)
    }

    /// Decode the next field and convert it to a Rust type.
    pub fn read_as<T>(&mut self, wire: WireType) -> DecodeResult<T>
    where
        T: TryFrom<Value, Error = DecodeError>,
    {
        T::try_from(self.read(wire)?)
    }

    /// Decode exactly `count` elements that carry no count prefix.
    pub fn read_elements<T>(&mut self, count: usize, element: WireType) -> DecodeResult<Vec<T>>
    where
        T: TryFrom<Value, Error = DecodeError>,
    {
        if let Some(width) = element.fixed_width() {
            let needed = width.saturating_mul(count);
            if self.remaining() < needed {
                return Err(DecodeError::truncated(self.pos, needed, self.remaining()));
            }
        }
        (0..count).map(|_| self.read_as(element)).collect()
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Check if every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Current offset from the start of the payload.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Fail if unread bytes remain.
    pub fn finish(&self) -> DecodeResult<()> {
        match self.remaining() {
            0 => Ok(()),
            count => Err(DecodeError::TrailingBytes { count }),
        }
    }
}
