//! Link frames and the inbound byte decoder.
//!
//! ```text
//! +---------+------------------+--------+--------+------+
//! | control | data (0..128)    | crc_hi | crc_lo | FLAG |
//! +---------+------------------+--------+--------+------+
//!  \______________ stuffed ______________________/
//! ```
//!
//! The CRC is CRC-16/CCITT-FALSE over control and (randomized) data. Only
//! DATA frames randomize their data field.

use bytes::{Buf, BufMut, BytesMut};
use crc::{Crc, CRC_16_IBM_3740};

use crate::constants::*;
use crate::control::Control;
use crate::error::FramingError;
use crate::random::randomize;
use crate::stuffing::{stuff, unstuff};

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Largest stuffed frame body the decoder buffers before giving up.
const MAX_STUFFED_LEN: usize = 2 * MAX_FRAME_LEN;

/// Compute the frame CRC.
pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// One link frame with its data field in the clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AshFrame {
    pub control: Control,
    pub data: Vec<u8>,
}

impl AshFrame {
    pub fn data(frame_number: u8, ack_number: u8, retransmit: bool, data: Vec<u8>) -> Self {
        AshFrame {
            control: Control::Data {
                frame_number,
                retransmit,
                ack_number,
            },
            data,
        }
    }

    pub fn ack(ack_number: u8, not_ready: bool) -> Self {
        AshFrame {
            control: Control::Ack {
                ack_number,
                not_ready,
            },
            data: Vec::new(),
        }
    }

    pub fn nak(ack_number: u8, not_ready: bool) -> Self {
        AshFrame {
            control: Control::Nak {
                ack_number,
                not_ready,
            },
            data: Vec::new(),
        }
    }

    pub fn rst() -> Self {
        AshFrame {
            control: Control::Rst,
            data: Vec::new(),
        }
    }

    pub fn rst_ack(reset_code: u8) -> Self {
        AshFrame {
            control: Control::RstAck,
            data: vec![ASH_VERSION, reset_code],
        }
    }

    pub fn error(code: u8) -> Self {
        AshFrame {
            control: Control::Error,
            data: vec![ASH_VERSION, code],
        }
    }

    /// Wire bytes: stuffed control, data and CRC, then FLAG. RST frames are
    /// preceded by CANCEL to flush any partial frame at the receiver.
    pub fn encode(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(1 + self.data.len() + 2);
        raw.put_u8(self.control.to_byte());
        let data_start = raw.len();
        raw.put_slice(&self.data);
        if matches!(self.control, Control::Data { .. }) {
            randomize(&mut raw[data_start..]);
        }
        let crc = crc16(&raw);
        raw.put_u16(crc);

        let mut out = Vec::with_capacity(raw.len() * 2 + 2);
        if self.control == Control::Rst {
            out.put_u8(CANCEL);
        }
        stuff(&raw, &mut out);
        out.put_u8(FLAG);
        out
    }

    /// Parse an unstuffed frame (flag removed).
    pub fn decode(raw: &[u8]) -> Result<Self, FramingError> {
        if raw.len() < MIN_FRAME_LEN {
            return Err(FramingError::TooShort(raw.len()));
        }
        if raw.len() > MAX_FRAME_LEN {
            return Err(FramingError::TooLong(raw.len()));
        }

        let (body, crc_bytes) = raw.split_at(raw.len() - 2);
        let actual = u16::from_be_bytes([crc_bytes[0], crc_bytes[1]]);
        let expected = crc16(body);
        if expected != actual {
            return Err(FramingError::BadCrc { expected, actual });
        }

        let control = Control::from_byte(body[0])?;
        let mut data = body[1..].to_vec();
        let length_ok = match control {
            Control::Data { .. } => !data.is_empty(),
            Control::Ack { .. } | Control::Nak { .. } | Control::Rst => data.is_empty(),
            Control::RstAck | Control::Error => data.len() == 2,
        };
        if !length_ok {
            return Err(FramingError::InvalidLength {
                frame: control.name(),
                length: data.len(),
            });
        }
        if matches!(control, Control::Data { .. }) {
            randomize(&mut data);
        }

        Ok(AshFrame { control, data })
    }
}

/// Item produced by [`FrameDecoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A well-formed frame.
    Frame(AshFrame),
    /// A frame was received but could not be decoded.
    Malformed(FramingError),
    /// The peer asked to resume transmission.
    Xon,
    /// The peer asked to pause transmission.
    Xoff,
}

/// Splits a raw byte stream into frames.
///
/// Bytes are pushed as they arrive from the channel; [`FrameDecoder::next`]
/// yields one item per terminating flag or flow-control byte.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Received bytes not yet examined.
    input: BytesMut,
    /// Stuffed bytes of the frame in progress.
    frame: Vec<u8>,
    /// A substitute byte was seen in the frame in progress.
    aborted: bool,
    /// The frame in progress outgrew [`MAX_STUFFED_LEN`].
    overflow: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        FrameDecoder {
            input: BytesMut::with_capacity(256),
            frame: Vec::with_capacity(MAX_STUFFED_LEN),
            aborted: false,
            overflow: false,
        }
    }

    /// Add received bytes.
    pub fn push(&mut self, data: &[u8]) {
        self.input.extend_from_slice(data);
    }

    /// Decode the next item, or `None` if more bytes are needed.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Inbound> {
        while self.input.has_remaining() {
            let byte = self.input.get_u8();
            match byte {
                XON => return Some(Inbound::Xon),
                XOFF => return Some(Inbound::Xoff),
                CANCEL => {
                    if !self.frame.is_empty() {
                        log::trace!("cancel discarded {} buffered bytes", self.frame.len());
                    }
                    self.clear_frame();
                }
                SUBSTITUTE => self.aborted = true,
                FLAG => {
                    if self.frame.is_empty() && !self.aborted && !self.overflow {
                        continue;
                    }
                    return Some(self.finish_frame());
                }
                _ => {
                    if self.frame.len() < MAX_STUFFED_LEN {
                        self.frame.push(byte);
                    } else {
                        self.overflow = true;
                    }
                }
            }
        }
        None
    }

    /// Drop any partial frame and unread input.
    pub fn clear(&mut self) {
        self.input.clear();
        self.clear_frame();
    }

    fn finish_frame(&mut self) -> Inbound {
        let result = if self.aborted {
            Err(FramingError::Aborted)
        } else if self.overflow {
            Err(FramingError::TooLong(self.frame.len()))
        } else {
            unstuff(&self.frame).and_then(|raw| AshFrame::decode(&raw))
        };
        self.clear_frame();
        match result {
            Ok(frame) => Inbound::Frame(frame),
            Err(err) => Inbound::Malformed(err),
        }
    }

    fn clear_frame(&mut self) {
        self.frame.clear();
        self.aborted = false;
        self.overflow = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc_check_value() {
        assert_eq!(crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_rst_wire_bytes() {
        assert_eq!(AshFrame::rst().encode(), vec![0x1A, 0xC0, 0x38, 0xBC, 0x7E]);
    }

    #[test]
    fn test_rstack_wire_bytes() {
        let bytes = AshFrame::rst_ack(RESET_POWER_ON).encode();
        assert_eq!(bytes, vec![0xC1, 0x02, 0x02, 0x9B, 0x7B, 0x7E]);
    }

    #[test]
    fn test_data_roundtrip_through_decoder() {
        let frame = AshFrame::data(2, 5, false, vec![0x00, 0x7E, 0x11, 0x13, 0x18, 0x1A, 0x7D]);
        let mut decoder = FrameDecoder::new();
        decoder.push(&frame.encode());
        assert_eq!(decoder.next(), Some(Inbound::Frame(frame)));
        assert_eq!(decoder.next(), None);
    }

    #[test]
    fn test_split_input() {
        let bytes = AshFrame::ack(3, false).encode();
        let mut decoder = FrameDecoder::new();
        decoder.push(&bytes[..2]);
        assert_eq!(decoder.next(), None);
        decoder.push(&bytes[2..]);
        assert_eq!(decoder.next(), Some(Inbound::Frame(AshFrame::ack(3, false))));
    }

    #[test]
    fn test_bad_crc() {
        let mut bytes = AshFrame::ack(1, false).encode();
        bytes[1] ^= 0x01;
        let mut decoder = FrameDecoder::new();
        decoder.push(&bytes);
        assert!(matches!(
            decoder.next(),
            Some(Inbound::Malformed(FramingError::BadCrc { .. }))
        ));
    }

    #[test]
    fn test_cancel_and_substitute() {
        let mut decoder = FrameDecoder::new();
        let ack = AshFrame::ack(4, false).encode();

        // Garbage, cancel, then a good frame.
        decoder.push(&[0x55, 0x66, CANCEL]);
        decoder.push(&ack);
        assert_eq!(decoder.next(), Some(Inbound::Frame(AshFrame::ack(4, false))));

        // A substitute byte poisons the frame it lands in.
        decoder.push(&[0x81, SUBSTITUTE, 0x00, FLAG]);
        assert_eq!(decoder.next(), Some(Inbound::Malformed(FramingError::Aborted)));

        decoder.push(&[XOFF, FLAG, FLAG, XON]);
        assert_eq!(decoder.next(), Some(Inbound::Xoff));
        assert_eq!(decoder.next(), Some(Inbound::Xon));
        assert_eq!(decoder.next(), None);
    }

    #[test]
    fn test_invalid_lengths() {
        let mut raw = vec![CONTROL_RSTACK, ASH_VERSION];
        let crc = crc16(&raw);
        raw.extend_from_slice(&crc.to_be_bytes());
        assert_eq!(
            AshFrame::decode(&raw),
            Err(FramingError::InvalidLength {
                frame: "RSTACK",
                length: 1
            })
        );
        assert_eq!(AshFrame::decode(&[0x80, 0x00]), Err(FramingError::TooShort(2)));
    }
}
