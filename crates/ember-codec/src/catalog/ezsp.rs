//! EZSP commands, responses and callbacks.

use crate::error::{DecodeResult, EncodeError};
use crate::ezsp::EZSP_GROUP_ID;
use crate::field::{FieldReader, FieldWriter};
use crate::frame::{Direction, Frame, FrameId};
use crate::wire::{WireType, N_X_CLUSTER_ID};

pub const EZSP_VERSION: u16 = 0x00;
pub const EZSP_ADD_ENDPOINT: u16 = 0x02;
pub const EZSP_NOP: u16 = 0x05;
pub const EZSP_STACK_STATUS_HANDLER: u16 = 0x19;

const fn command(frame_id: u16) -> FrameId {
    FrameId::new(EZSP_GROUP_ID, frame_id, Direction::ToServer)
}

const fn response(frame_id: u16) -> FrameId {
    FrameId::new(EZSP_GROUP_ID, frame_id, Direction::ToClient)
}

/// Negotiate the protocol version. Must be the first command after reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionRequest {
    pub desired_protocol_version: u8,
}

impl Frame for VersionRequest {
    fn frame_id(&self) -> FrameId {
        command(EZSP_VERSION)
    }

    fn serialize(&self, writer: &mut FieldWriter) -> Result<(), EncodeError> {
        writer.write(self.desired_protocol_version, WireType::Uint8)
    }

    fn deserialize(&mut self, reader: &mut FieldReader<'_>) -> DecodeResult<()> {
        self.desired_protocol_version = reader.read_as(WireType::Uint8)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionResponse {
    pub protocol_version: u8,
    pub stack_type: u8,
    pub stack_version: u16,
}

impl Frame for VersionResponse {
    fn frame_id(&self) -> FrameId {
        response(EZSP_VERSION)
    }

    fn serialize(&self, writer: &mut FieldWriter) -> Result<(), EncodeError> {
        writer.write(self.protocol_version, WireType::Uint8)?;
        writer.write(self.stack_type, WireType::Uint8)?;
        writer.write(self.stack_version, WireType::Uint16)
    }

    fn deserialize(&mut self, reader: &mut FieldReader<'_>) -> DecodeResult<()> {
        self.protocol_version = reader.read_as(WireType::Uint8)?;
        self.stack_type = reader.read_as(WireType::Uint8)?;
        self.stack_version = reader.read_as(WireType::Uint16)?;
        Ok(())
    }
}

/// Configure a local endpoint.
///
/// Both cluster counts precede both cluster lists on the wire, so the lists
/// are written without their own prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddEndpointRequest {
    pub endpoint: u8,
    pub profile_id: u16,
    pub device_id: u16,
    pub app_flags: u8,
    pub input_cluster_list: Vec<u16>,
    pub output_cluster_list: Vec<u16>,
}

impl Frame for AddEndpointRequest {
    fn frame_id(&self) -> FrameId {
        command(EZSP_ADD_ENDPOINT)
    }

    fn serialize(&self, writer: &mut FieldWriter) -> Result<(), EncodeError> {
        let input_count = cluster_count(self.input_cluster_list.len())?;
        let output_count = cluster_count(self.output_cluster_list.len())?;

        writer.write(self.endpoint, WireType::Uint8)?;
        writer.write(self.profile_id, WireType::Uint16)?;
        writer.write(self.device_id, WireType::Uint16)?;
        writer.write(self.app_flags, WireType::Uint8)?;
        writer.write(input_count, WireType::Uint8)?;
        writer.write(output_count, WireType::Uint8)?;
        writer.write_elements(&self.input_cluster_list, WireType::Uint16)?;
        writer.write_elements(&self.output_cluster_list, WireType::Uint16)
    }

    fn deserialize(&mut self, reader: &mut FieldReader<'_>) -> DecodeResult<()> {
        self.endpoint = reader.read_as(WireType::Uint8)?;
        self.profile_id = reader.read_as(WireType::Uint16)?;
        self.device_id = reader.read_as(WireType::Uint16)?;
        self.app_flags = reader.read_as(WireType::Uint8)?;
        let input_count: u8 = reader.read_as(WireType::Uint8)?;
        let output_count: u8 = reader.read_as(WireType::Uint8)?;
        self.input_cluster_list = reader.read_elements(input_count as usize, WireType::Uint16)?;
        self.output_cluster_list = reader.read_elements(output_count as usize, WireType::Uint16)?;
        Ok(())
    }
}

fn cluster_count(len: usize) -> Result<u8, EncodeError> {
    u8::try_from(len).map_err(|_| EncodeError::TooLong {
        wire: N_X_CLUSTER_ID,
        max: u8::MAX as usize,
        actual: len,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddEndpointResponse {
    pub status: u8,
}

impl Frame for AddEndpointResponse {
    fn frame_id(&self) -> FrameId {
        response(EZSP_ADD_ENDPOINT)
    }

    fn serialize(&self, writer: &mut FieldWriter) -> Result<(), EncodeError> {
        writer.write(self.status, WireType::Enum8)
    }

    fn deserialize(&mut self, reader: &mut FieldReader<'_>) -> DecodeResult<()> {
        self.status = reader.read_as(WireType::Enum8)?;
        Ok(())
    }
}

/// No-op command used as a keep-alive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NopRequest;

impl Frame for NopRequest {
    fn frame_id(&self) -> FrameId {
        command(EZSP_NOP)
    }

    fn serialize(&self, _writer: &mut FieldWriter) -> Result<(), EncodeError> {
        Ok(())
    }

    fn deserialize(&mut self, _reader: &mut FieldReader<'_>) -> DecodeResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NopResponse;

impl Frame for NopResponse {
    fn frame_id(&self) -> FrameId {
        response(EZSP_NOP)
    }

    fn serialize(&self, _writer: &mut FieldWriter) -> Result<(), EncodeError> {
        Ok(())
    }

    fn deserialize(&mut self, _reader: &mut FieldReader<'_>) -> DecodeResult<()> {
        Ok(())
    }
}

/// Callback reporting a change in network state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackStatusHandler {
    pub status: u8,
}

impl Frame for StackStatusHandler {
    fn frame_id(&self) -> FrameId {
        response(EZSP_STACK_STATUS_HANDLER)
    }

    fn serialize(&self, writer: &mut FieldWriter) -> Result<(), EncodeError> {
        writer.write(self.status, WireType::Enum8)
    }

    fn deserialize(&mut self, reader: &mut FieldReader<'_>) -> DecodeResult<()> {
        self.status = reader.read_as(WireType::Enum8)?;
        Ok(())
    }
}
