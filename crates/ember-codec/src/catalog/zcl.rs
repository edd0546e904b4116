//! A handful of ZCL cluster and profile-wide commands.

use crate::error::{DecodeResult, EncodeError};
use crate::field::{FieldReader, FieldWriter};
use crate::frame::{Direction, Frame, FrameId};
use crate::types::ExtendedAttributeInformation;
use crate::wire::{WireType, N_X_ATTRIBUTE_IDENTIFIER, N_X_EXTENDED_ATTRIBUTE_INFORMATION};

pub const ALARMS_CLUSTER_ID: u16 = 0x0009;
pub const IAS_ACE_CLUSTER_ID: u16 = 0x0501;

pub const READ_ATTRIBUTES_COMMAND_ID: u16 = 0x00;
pub const DISCOVER_ATTRIBUTES_EXTENDED_RESPONSE_ID: u16 = 0x16;

// ============================================================================
// Alarms cluster
// ============================================================================

/// Reset one alarm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetAlarmCommand {
    pub alarm_code: u8,
    pub cluster_identifier: u16,
}

impl Frame for ResetAlarmCommand {
    fn frame_id(&self) -> FrameId {
        FrameId::new(ALARMS_CLUSTER_ID, 0x00, Direction::ToServer)
    }

    fn serialize(&self, writer: &mut FieldWriter) -> Result<(), EncodeError> {
        writer.write(self.alarm_code, WireType::Enum8)?;
        writer.write(self.cluster_identifier, WireType::Uint16)
    }

    fn deserialize(&mut self, reader: &mut FieldReader<'_>) -> DecodeResult<()> {
        self.alarm_code = reader.read_as(WireType::Enum8)?;
        self.cluster_identifier = reader.read_as(WireType::Uint16)?;
        Ok(())
    }
}

// Field-less client-to-server alarms commands.
macro_rules! empty_command {
    ($(#[$meta:meta])* $name:ident, $command_id:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name;

        impl Frame for $name {
            fn frame_id(&self) -> FrameId {
                FrameId::new(ALARMS_CLUSTER_ID, $command_id, Direction::ToServer)
            }

            fn serialize(&self, _writer: &mut FieldWriter) -> Result<(), EncodeError> {
                Ok(())
            }

            fn deserialize(&mut self, _reader: &mut FieldReader<'_>) -> DecodeResult<()> {
                Ok(())
            }
        }
    };
}

empty_command!(
    /// Reset every alarm on the device.
    ResetAllAlarmsCommand,
    0x01
);
empty_command!(
    /// Fetch and remove the earliest alarm from the log.
    GetAlarmCommand,
    0x02
);
empty_command!(
    /// Clear the alarm log.
    ResetAlarmLogCommand,
    0x03
);

/// An alarm raised by a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmCommand {
    pub alarm_code: u8,
    pub cluster_identifier: u16,
}

impl Frame for AlarmCommand {
    fn frame_id(&self) -> FrameId {
        FrameId::new(ALARMS_CLUSTER_ID, 0x00, Direction::ToClient)
    }

    fn serialize(&self, writer: &mut FieldWriter) -> Result<(), EncodeError> {
        writer.write(self.alarm_code, WireType::Enum8)?;
        writer.write(self.cluster_identifier, WireType::Uint16)
    }

    fn deserialize(&mut self, reader: &mut FieldReader<'_>) -> DecodeResult<()> {
        self.alarm_code = reader.read_as(WireType::Enum8)?;
        self.cluster_identifier = reader.read_as(WireType::Uint16)?;
        Ok(())
    }
}

/// Reply to [`GetAlarmCommand`]. The alarm fields are omitted when the log
/// is empty (non-zero status).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetAlarmResponse {
    pub status: u8,
    pub alarm: Option<AlarmEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmEntry {
    pub alarm_code: u8,
    pub cluster_identifier: u16,
    pub timestamp: u32,
}

impl Frame for GetAlarmResponse {
    fn frame_id(&self) -> FrameId {
        FrameId::new(ALARMS_CLUSTER_ID, 0x01, Direction::ToClient)
    }

    fn serialize(&self, writer: &mut FieldWriter) -> Result<(), EncodeError> {
        writer.write(self.status, WireType::Enum8)?;
        if let Some(alarm) = &self.alarm {
            writer.write(alarm.alarm_code, WireType::Enum8)?;
            writer.write(alarm.cluster_identifier, WireType::Uint16)?;
            writer.write(alarm.timestamp, WireType::Uint32)?;
        }
        Ok(())
    }

    fn deserialize(&mut self, reader: &mut FieldReader<'_>) -> DecodeResult<()> {
        self.status = reader.read_as(WireType::Enum8)?;
        self.alarm = if reader.remaining() > 0 {
            Some(AlarmEntry {
                alarm_code: reader.read_as(WireType::Enum8)?,
                cluster_identifier: reader.read_as(WireType::Uint16)?,
                timestamp: reader.read_as(WireType::Uint32)?,
            })
        } else {
            None
        };
        Ok(())
    }
}

// ============================================================================
// IAS ACE cluster
// ============================================================================

/// Fire panic button pressed on an alarm keypad.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FireCommand;

impl Frame for FireCommand {
    fn frame_id(&self) -> FrameId {
        FrameId::new(IAS_ACE_CLUSTER_ID, 0x03, Direction::ToServer)
    }

    fn serialize(&self, _writer: &mut FieldWriter) -> Result<(), EncodeError> {
        Ok(())
    }

    fn deserialize(&mut self, _reader: &mut FieldReader<'_>) -> DecodeResult<()> {
        Ok(())
    }
}

// ============================================================================
// Profile-wide commands
// ============================================================================

/// Read a set of attributes from any cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadAttributesCommand {
    pub cluster_id: u16,
    pub identifiers: Vec<u16>,
}

impl Frame for ReadAttributesCommand {
    fn frame_id(&self) -> FrameId {
        FrameId::new(self.cluster_id, READ_ATTRIBUTES_COMMAND_ID, Direction::ToServer)
    }

    fn is_generic(&self) -> bool {
        true
    }

    fn set_group_id(&mut self, group_id: u16) {
        self.cluster_id = group_id;
    }

    fn serialize(&self, writer: &mut FieldWriter) -> Result<(), EncodeError> {
        writer.write(self.identifiers.clone(), N_X_ATTRIBUTE_IDENTIFIER)
    }

    fn deserialize(&mut self, reader: &mut FieldReader<'_>) -> DecodeResult<()> {
        self.identifiers = reader.read_as(N_X_ATTRIBUTE_IDENTIFIER)?;
        Ok(())
    }
}

/// Attributes a cluster supports, with their types and access rights.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoverAttributesExtendedResponse {
    pub cluster_id: u16,
    pub discovery_complete: u8,
    pub attributes: Vec<ExtendedAttributeInformation>,
}

impl Frame for DiscoverAttributesExtendedResponse {
    fn frame_id(&self) -> FrameId {
        FrameId::new(
            self.cluster_id,
            DISCOVER_ATTRIBUTES_EXTENDED_RESPONSE_ID,
            Direction::ToClient,
        )
    }

    fn is_generic(&self) -> bool {
        true
    }

    fn set_group_id(&mut self, group_id: u16) {
        self.cluster_id = group_id;
    }

    fn serialize(&self, writer: &mut FieldWriter) -> Result<(), EncodeError> {
        writer.write(self.discovery_complete, WireType::Uint8)?;
        writer.write(self.attributes.clone(), N_X_EXTENDED_ATTRIBUTE_INFORMATION)
    }

    fn deserialize(&mut self, reader: &mut FieldReader<'_>) -> DecodeResult<()> {
        self.discovery_complete = reader.read_as(WireType::Uint8)?;
        self.attributes = reader.read_as(N_X_EXTENDED_ATTRIBUTE_INFORMATION)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zcl::encode_zcl;

    #[test]
    fn test_get_alarm_response_optional_tail() {
        let mut empty = GetAlarmResponse::default();
        let mut reader = FieldReader::new(&[0x8B]);
        empty.deserialize(&mut reader).unwrap();
        assert_eq!(empty.status, 0x8B);
        assert_eq!(empty.alarm, None);

        let mut full = GetAlarmResponse::default();
        let data = [0x00, 0x09, 0x06, 0x00, 0x78, 0x56, 0x34, 0x12];
        full.deserialize(&mut FieldReader::new(&data)).unwrap();
        assert_eq!(
            full.alarm,
            Some(AlarmEntry {
                alarm_code: 0x09,
                cluster_identifier: 0x0006,
                timestamp: 0x12345678,
            })
        );
    }

    #[test]
    fn test_read_attributes_encoding() {
        let command = ReadAttributesCommand {
            cluster_id: 0x0006,
            identifiers: vec![0x0000, 0x4003],
        };
        let bytes = encode_zcl(0x21, &command).unwrap();
        assert_eq!(bytes, vec![0x00, 0x21, 0x00, 0x00, 0x00, 0x03, 0x40]);
    }

    #[test]
    fn test_fire_command_header() {
        let bytes = encode_zcl(5, &FireCommand).unwrap();
        assert_eq!(bytes, vec![0x01, 0x05, 0x03]);
    }
}
