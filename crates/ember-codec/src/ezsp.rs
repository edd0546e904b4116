//! EZSP frame header codec.
//!
//! Every EZSP frame exchanged with the dongle starts with a three byte header:
//!
//! ```text
//! +----------+---------------+----------+------------------+
//! | sequence | frame control | frame id | fields...        |
//! +----------+---------------+----------+------------------+
//! ```
//!
//! Frame control bit 7 distinguishes commands (host to dongle) from
//! responses and callbacks (dongle to host). In responses, bits 3-4 carry the
//! callback type and bits 0-2 the overflow, truncated and callback-pending
//! flags.

use crate::error::{CodecError, DecodeError, DecodeResult, EncodeError};
use crate::field::{FieldReader, FieldWriter};
use crate::frame::{Direction, Frame, FrameHeader, FrameId, Framed};
use crate::registry::FrameRegistry;
use crate::wire::WireType;

/// Group id shared by every EZSP frame.
pub const EZSP_GROUP_ID: u16 = 0x0000;

/// Size of the EZSP header in bytes.
pub const EZSP_HEADER_SIZE: usize = 3;

/// Frame control bit marking a response or callback.
pub const FRAME_CONTROL_RESPONSE: u8 = 0x80;
/// The dongle dropped callbacks because its queue overflowed.
pub const FRAME_CONTROL_OVERFLOW: u8 = 0x01;
/// The response was truncated.
pub const FRAME_CONTROL_TRUNCATED: u8 = 0x02;
/// More callbacks are waiting on the dongle.
pub const FRAME_CONTROL_CALLBACK_PENDING: u8 = 0x04;

const CALLBACK_TYPE_SHIFT: u8 = 3;
const CALLBACK_TYPE_MASK: u8 = 0x18;

/// How a response frame relates to the request stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackType {
    /// A direct response to a command.
    None,
    /// A callback returned in reply to a `callback` command.
    Synchronous,
    /// A callback the dongle sent on its own.
    Asynchronous,
    /// Reserved encoding.
    Reserved,
}

impl From<u8> for CallbackType {
    fn from(bits: u8) -> Self {
        match bits & 0x03 {
            0 => CallbackType::None,
            1 => CallbackType::Synchronous,
            2 => CallbackType::Asynchronous,
            _ => CallbackType::Reserved,
        }
    }
}

impl From<CallbackType> for u8 {
    fn from(value: CallbackType) -> Self {
        match value {
            CallbackType::None => 0,
            CallbackType::Synchronous => 1,
            CallbackType::Asynchronous => 2,
            CallbackType::Reserved => 3,
        }
    }
}

/// Decoded EZSP header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EzspHeader {
    /// Correlation sequence number.
    pub sequence: u8,
    /// Raw frame control byte.
    pub control: u8,
    /// Frame (command) id.
    pub frame_id: u8,
}

impl EzspHeader {
    /// Header for a host-to-dongle command.
    pub fn command(sequence: u8, frame_id: u8) -> Self {
        EzspHeader {
            sequence,
            control: 0x00,
            frame_id,
        }
    }

    /// Header for a dongle-to-host response or callback.
    pub fn response(sequence: u8, frame_id: u8, callback: CallbackType) -> Self {
        EzspHeader {
            sequence,
            control: FRAME_CONTROL_RESPONSE | (u8::from(callback) << CALLBACK_TYPE_SHIFT),
            frame_id,
        }
    }

    /// Direction implied by the frame control byte.
    pub fn direction(&self) -> Direction {
        if self.is_response() {
            Direction::ToClient
        } else {
            Direction::ToServer
        }
    }

    /// Check if this is a response or callback.
    pub fn is_response(&self) -> bool {
        self.control & FRAME_CONTROL_RESPONSE != 0
    }

    /// Callback type of a response.
    pub fn callback_type(&self) -> CallbackType {
        CallbackType::from((self.control & CALLBACK_TYPE_MASK) >> CALLBACK_TYPE_SHIFT)
    }

    /// Check if the dongle reported a callback queue overflow.
    pub fn overflow(&self) -> bool {
        self.is_response() && self.control & FRAME_CONTROL_OVERFLOW != 0
    }

    /// Check if the dongle truncated the response.
    pub fn truncated(&self) -> bool {
        self.is_response() && self.control & FRAME_CONTROL_TRUNCATED != 0
    }

    /// Check if more callbacks are waiting.
    pub fn callback_pending(&self) -> bool {
        self.is_response() && self.control & FRAME_CONTROL_CALLBACK_PENDING != 0
    }

    /// Registry key for the frame this header introduces.
    pub fn frame_key(&self) -> FrameId {
        FrameId::new(EZSP_GROUP_ID, u16::from(self.frame_id), self.direction())
    }

    /// Append the header bytes.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[self.sequence, self.control, self.frame_id]);
    }

    /// Parse a header from the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        if bytes.len() < EZSP_HEADER_SIZE {
            return Err(DecodeError::truncated(0, EZSP_HEADER_SIZE, bytes.len()));
        }
        Ok(EzspHeader {
            sequence: bytes[0],
            control: bytes[1],
            frame_id: bytes[2],
        })
    }
}

impl FrameHeader for EzspHeader {
    fn sequence(&self) -> u8 {
        self.sequence
    }
}

/// A decoded EZSP frame.
pub type EzspFramed = Framed<EzspHeader>;

fn frame_id_byte(frame: &dyn Frame) -> Result<u8, EncodeError> {
    let id = frame.frame_id().command_id;
    u8::try_from(id).map_err(|_| EncodeError::out_of_range(WireType::Uint8, id))
}

/// Build the header a frame would be sent with.
pub fn header_for(sequence: u8, frame: &dyn Frame) -> Result<EzspHeader, EncodeError> {
    let frame_id = frame_id_byte(frame)?;
    Ok(match frame.frame_id().direction {
        Direction::ToServer => EzspHeader::command(sequence, frame_id),
        Direction::ToClient => EzspHeader::response(sequence, frame_id, CallbackType::None),
    })
}

/// Serialize a frame with an explicit header.
pub fn encode_with_header(header: &EzspHeader, frame: &dyn Frame) -> Result<Vec<u8>, EncodeError> {
    let mut prefix = Vec::with_capacity(EZSP_HEADER_SIZE);
    header.encode(&mut prefix);
    let mut writer = FieldWriter::with_prefix(&prefix);
    frame.serialize(&mut writer)?;
    Ok(writer.into_bytes())
}

/// Serialize a frame with a default header for its direction.
pub fn encode_ezsp(sequence: u8, frame: &dyn Frame) -> Result<Vec<u8>, EncodeError> {
    encode_with_header(&header_for(sequence, frame)?, frame)
}

/// Decode an EZSP frame, instantiating the concrete type from `registry`.
///
/// Trailing bytes after the known fields are tolerated: newer dongle
/// firmware appends fields to existing responses.
pub fn decode_ezsp(bytes: &[u8], registry: &FrameRegistry) -> Result<EzspFramed, CodecError> {
    let header = EzspHeader::decode(bytes)?;
    let mut frame = registry.instantiate(header.frame_key())?;

    let mut reader = FieldReader::new(&bytes[EZSP_HEADER_SIZE..]);
    frame.deserialize(&mut reader)?;
    if reader.remaining() > 0 {
        log::debug!(
            "ignoring {} trailing bytes in EZSP frame 0x{:02X}",
            reader.remaining(),
            header.frame_id
        );
    }

    Ok(Framed { header, frame })
}
