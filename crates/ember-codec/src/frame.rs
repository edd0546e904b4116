//! The polymorphic frame abstraction.
//!
//! A frame is one typed command or response. Concrete frames are plain
//! structs implementing [`Frame`]; the header codecs in [`crate::ezsp`] and
//! [`crate::zcl`] wrap their fields with the protocol header on the way out
//! and use a [`crate::FrameRegistry`] to pick the right struct on the way in.

use std::any::Any;
use std::fmt;

use crate::error::{DecodeResult, EncodeError};
use crate::field::{FieldReader, FieldWriter};

/// Which way a frame travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Client to server, or host to dongle.
    ToServer,
    /// Server to client, or dongle to host.
    ToClient,
}

impl Direction {
    /// The opposite direction.
    pub fn reverse(self) -> Self {
        match self {
            Direction::ToServer => Direction::ToClient,
            Direction::ToClient => Direction::ToServer,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ToServer => f.write_str("to-server"),
            Direction::ToClient => f.write_str("to-client"),
        }
    }
}

/// Identity of a frame type: group (cluster) id, command id and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId {
    /// Object-group identifier (cluster id for ZCL frames).
    pub group_id: u16,
    /// Command identifier within the group.
    pub command_id: u16,
    /// Direction of travel.
    pub direction: Direction,
}

impl FrameId {
    /// Create a frame id.
    pub const fn new(group_id: u16, command_id: u16, direction: Direction) -> Self {
        FrameId {
            group_id,
            command_id,
            direction,
        }
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "group 0x{:04X} command 0x{:02X} {}",
            self.group_id, self.command_id, self.direction
        )
    }
}

/// Object-safe access to `Any`, implemented for every sized frame type.
pub trait AsAny {
    /// Borrow as `Any`.
    fn as_any(&self) -> &dyn Any;
    /// Convert an owned box into `Any`.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T: Any + Send> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// One typed command or response.
///
/// Implementations write and read only their own fields; protocol headers
/// (sequence number, control bits, command id) are handled by the header
/// codecs.
pub trait Frame: AsAny + fmt::Debug + Send + 'static {
    /// Identity used for registry lookups.
    fn frame_id(&self) -> FrameId;

    /// Whether one wire command is shared across groups, with the group id
    /// supplied at runtime.
    fn is_generic(&self) -> bool {
        false
    }

    /// Set the runtime group id of a generic frame. Fixed frames ignore it.
    fn set_group_id(&mut self, _group_id: u16) {}

    /// Write the frame's fields.
    fn serialize(&self, writer: &mut FieldWriter) -> Result<(), EncodeError>;

    /// Read the frame's fields.
    fn deserialize(&mut self, reader: &mut FieldReader<'_>) -> DecodeResult<()>;
}

impl dyn Frame {
    /// Check the concrete type of a frame.
    pub fn is<T: Frame>(&self) -> bool {
        AsAny::as_any(self).is::<T>()
    }

    /// Borrow the frame as its concrete type.
    pub fn downcast_ref<T: Frame>(&self) -> Option<&T> {
        AsAny::as_any(self).downcast_ref::<T>()
    }

    /// Take the frame as its concrete type, or `None` if it is another type.
    pub fn downcast<T: Frame>(self: Box<Self>) -> Option<Box<T>> {
        AsAny::into_any(self).downcast::<T>().ok()
    }
}

/// Serialize only the fields of a frame.
pub fn serialize_fields(frame: &dyn Frame) -> Result<Vec<u8>, EncodeError> {
    let mut writer = FieldWriter::new();
    frame.serialize(&mut writer)?;
    Ok(writer.into_bytes())
}

/// Header of a decoded frame.
pub trait FrameHeader: fmt::Debug + Clone + Send {
    /// Correlation sequence number.
    fn sequence(&self) -> u8;
}

/// A decoded frame together with the header it arrived with.
#[derive(Debug)]
pub struct Framed<H: FrameHeader> {
    /// Protocol header.
    pub header: H,
    /// The concrete frame.
    pub frame: Box<dyn Frame>,
}

impl<H: FrameHeader> Framed<H> {
    /// Correlation sequence number from the header.
    pub fn sequence(&self) -> u8 {
        self.header.sequence()
    }

    /// Identity of the contained frame.
    pub fn frame_id(&self) -> FrameId {
        self.frame.frame_id()
    }

    /// Borrow the frame as its concrete type.
    pub fn frame_as<T: Frame>(&self) -> Option<&T> {
        self.frame.downcast_ref::<T>()
    }
}
