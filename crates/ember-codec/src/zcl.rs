//! ZCL frame header codec.
//!
//! ```text
//! +---------------+-------------------------+----------+------------+--------+
//! | frame control | manufacturer code (opt) | sequence | command id | fields |
//! +---------------+-------------------------+----------+------------+--------+
//! ```
//!
//! The cluster id travels in the enclosing envelope, so decoding needs it
//! passed in.

use crate::error::{CodecError, DecodeError, DecodeResult, EncodeError, UnknownFrame};
use crate::field::{FieldReader, FieldWriter};
use crate::frame::{Direction, Frame, FrameHeader, FrameId, Framed};
use crate::registry::FrameRegistry;
use crate::wire::WireType;

const FRAME_TYPE_MASK: u8 = 0x03;
const MANUFACTURER_SPECIFIC: u8 = 0x04;
const DIRECTION_SERVER_TO_CLIENT: u8 = 0x08;
const DISABLE_DEFAULT_RESPONSE: u8 = 0x10;

/// ZCL frame type (frame control bits 0-1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZclFrameType {
    /// Profile-wide command, valid on every cluster.
    Generic,
    /// Command specific to one cluster.
    ClusterSpecific,
}

/// Decoded ZCL header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZclHeader {
    pub frame_type: ZclFrameType,
    pub manufacturer_code: Option<u16>,
    pub direction: Direction,
    pub disable_default_response: bool,
    pub sequence: u8,
    pub command_id: u8,
}

impl ZclHeader {
    /// Header a frame is sent with by default.
    pub fn for_frame(sequence: u8, frame: &dyn Frame) -> Result<Self, EncodeError> {
        let id = frame.frame_id();
        let command_id = u8::try_from(id.command_id)
            .map_err(|_| EncodeError::out_of_range(WireType::Uint8, id.command_id))?;
        Ok(ZclHeader {
            frame_type: if frame.is_generic() {
                ZclFrameType::Generic
            } else {
                ZclFrameType::ClusterSpecific
            },
            manufacturer_code: None,
            direction: id.direction,
            disable_default_response: false,
            sequence,
            command_id,
        })
    }

    /// Encoded frame control byte.
    pub fn frame_control(&self) -> u8 {
        let mut control = match self.frame_type {
            ZclFrameType::Generic => 0x00,
            ZclFrameType::ClusterSpecific => 0x01,
        };
        if self.manufacturer_code.is_some() {
            control |= MANUFACTURER_SPECIFIC;
        }
        if self.direction == Direction::ToClient {
            control |= DIRECTION_SERVER_TO_CLIENT;
        }
        if self.disable_default_response {
            control |= DISABLE_DEFAULT_RESPONSE;
        }
        control
    }

    /// Header size in bytes.
    pub fn size(&self) -> usize {
        if self.manufacturer_code.is_some() {
            5
        } else {
            3
        }
    }

    /// Append the header bytes.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.frame_control());
        if let Some(code) = self.manufacturer_code {
            out.extend_from_slice(&code.to_le_bytes());
        }
        out.push(self.sequence);
        out.push(self.command_id);
    }

    /// Parse a header from the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        let mut reader = FieldReader::new(bytes);
        let control: u8 = reader.read_as(WireType::Bitmap8)?;
        let frame_type = match control & FRAME_TYPE_MASK {
            0x00 => ZclFrameType::Generic,
            0x01 => ZclFrameType::ClusterSpecific,
            other => {
                return Err(DecodeError::invalid_at(
                    0,
                    format!("reserved ZCL frame type {}", other),
                ))
            }
        };
        let manufacturer_code = if control & MANUFACTURER_SPECIFIC != 0 {
            Some(reader.read_as(WireType::Uint16)?)
        } else {
            None
        };
        Ok(ZclHeader {
            frame_type,
            manufacturer_code,
            direction: if control & DIRECTION_SERVER_TO_CLIENT != 0 {
                Direction::ToClient
            } else {
                Direction::ToServer
            },
            disable_default_response: control & DISABLE_DEFAULT_RESPONSE != 0,
            sequence: reader.read_as(WireType::Uint8)?,
            command_id: reader.read_as(WireType::Uint8)?,
        })
    }
}

impl FrameHeader for ZclHeader {
    fn sequence(&self) -> u8 {
        self.sequence
    }
}

/// A decoded ZCL frame.
pub type ZclFramed = Framed<ZclHeader>;

/// Serialize a frame with an explicit header.
pub fn encode_zcl_with_header(header: &ZclHeader, frame: &dyn Frame) -> Result<Vec<u8>, EncodeError> {
    let mut prefix = Vec::with_capacity(header.size());
    header.encode(&mut prefix);
    let mut writer = FieldWriter::with_prefix(&prefix);
    frame.serialize(&mut writer)?;
    Ok(writer.into_bytes())
}

/// Serialize a frame with the default header for its identity.
pub fn encode_zcl(sequence: u8, frame: &dyn Frame) -> Result<Vec<u8>, EncodeError> {
    encode_zcl_with_header(&ZclHeader::for_frame(sequence, frame)?, frame)
}

/// Decode a ZCL frame received on `cluster_id`.
///
/// Profile-wide commands resolve through the generic table only; cluster
/// commands resolve through the cluster table with generic fallback.
pub fn decode_zcl(
    cluster_id: u16,
    bytes: &[u8],
    registry: &FrameRegistry,
) -> Result<ZclFramed, CodecError> {
    let header = ZclHeader::decode(bytes)?;
    let id = FrameId::new(cluster_id, u16::from(header.command_id), header.direction);

    let mut frame = match header.frame_type {
        ZclFrameType::Generic => {
            let constructor = registry
                .lookup_generic(id.command_id, id.direction)
                .ok_or(UnknownFrame(id))?;
            let mut frame = constructor();
            frame.set_group_id(cluster_id);
            frame
        }
        ZclFrameType::ClusterSpecific => registry.instantiate(id)?,
    };

    let mut reader = FieldReader::new(&bytes[header.size()..]);
    frame.deserialize(&mut reader)?;
    if reader.remaining() > 0 {
        log::debug!(
            "ignoring {} trailing bytes in ZCL frame {}",
            reader.remaining(),
            id
        );
    }

    Ok(Framed { header, frame })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_control_bits() {
        let header = ZclHeader {
            frame_type: ZclFrameType::ClusterSpecific,
            manufacturer_code: Some(0x1234),
            direction: Direction::ToClient,
            disable_default_response: true,
            sequence: 0x42,
            command_id: 0x01,
        };
        let mut bytes = Vec::new();
        header.encode(&mut bytes);
        assert_eq!(bytes, vec![0x1D, 0x34, 0x12, 0x42, 0x01]);
        assert_eq!(ZclHeader::decode(&bytes).unwrap(), header);
    }

    #[test]
    fn test_plain_header() {
        let header = ZclHeader::decode(&[0x00, 0x07, 0x00]).unwrap();
        assert_eq!(header.frame_type, ZclFrameType::Generic);
        assert_eq!(header.direction, Direction::ToServer);
        assert_eq!(header.manufacturer_code, None);
        assert_eq!(header.sequence, 7);
        assert_eq!(header.size(), 3);
    }

    #[test]
    fn test_reserved_frame_type_rejected() {
        assert!(ZclHeader::decode(&[0x02, 0x00, 0x00]).is_err());
    }

    #[test]
    fn test_truncated_header() {
        assert!(matches!(
            ZclHeader::decode(&[0x04, 0x34]),
            Err(DecodeError::Truncated { offset: 1, .. })
        ));
    }
}
