//! Frame control byte.
//!
//! ```text
//! DATA    0 fff r aaa    f = frame number, r = retransmit, a = ack number
//! ACK     1 000 n aaa    n = not ready
//! NAK     1 010 n aaa
//! RST     1 100 0000
//! RSTACK  1 100 0001
//! ERROR   1 100 0010
//! ```

use std::fmt;

use crate::constants::*;
use crate::error::FramingError;

/// Decoded control byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Data {
        frame_number: u8,
        retransmit: bool,
        ack_number: u8,
    },
    Ack {
        ack_number: u8,
        not_ready: bool,
    },
    Nak {
        ack_number: u8,
        not_ready: bool,
    },
    Rst,
    RstAck,
    Error,
}

impl Control {
    /// Encode as a control byte. Sequence numbers are taken modulo 8.
    pub fn to_byte(self) -> u8 {
        match self {
            Control::Data {
                frame_number,
                retransmit,
                ack_number,
            } => {
                let mut byte = ((frame_number & 0x07) << 4) | (ack_number & 0x07);
                if retransmit {
                    byte |= DATA_RETRANSMIT;
                }
                byte
            }
            Control::Ack {
                ack_number,
                not_ready,
            } => CONTROL_ACK | ready_bit(not_ready) | (ack_number & 0x07),
            Control::Nak {
                ack_number,
                not_ready,
            } => CONTROL_NAK | ready_bit(not_ready) | (ack_number & 0x07),
            Control::Rst => CONTROL_RST,
            Control::RstAck => CONTROL_RSTACK,
            Control::Error => CONTROL_ERROR,
        }
    }

    /// Parse a control byte.
    pub fn from_byte(byte: u8) -> Result<Self, FramingError> {
        if byte & 0x80 == 0 {
            return Ok(Control::Data {
                frame_number: (byte >> 4) & 0x07,
                retransmit: byte & DATA_RETRANSMIT != 0,
                ack_number: byte & 0x07,
            });
        }
        match byte {
            CONTROL_RST => return Ok(Control::Rst),
            CONTROL_RSTACK => return Ok(Control::RstAck),
            CONTROL_ERROR => return Ok(Control::Error),
            _ => {}
        }
        // Bit 4 of ACK and NAK is reserved.
        let ack_number = byte & 0x07;
        let not_ready = byte & NOT_READY != 0;
        match byte & 0xE0 {
            CONTROL_ACK => Ok(Control::Ack {
                ack_number,
                not_ready,
            }),
            CONTROL_NAK => Ok(Control::Nak {
                ack_number,
                not_ready,
            }),
            _ => Err(FramingError::UnknownControl(byte)),
        }
    }

    /// Frame type name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Control::Data { .. } => "DATA",
            Control::Ack { .. } => "ACK",
            Control::Nak { .. } => "NAK",
            Control::Rst => "RST",
            Control::RstAck => "RSTACK",
            Control::Error => "ERROR",
        }
    }
}

fn ready_bit(not_ready: bool) -> u8 {
    if not_ready {
        NOT_READY
    } else {
        0
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Control::Data {
                frame_number,
                retransmit,
                ack_number,
            } => write!(
                f,
                "DATA(frm={}, ack={}{})",
                frame_number,
                ack_number,
                if retransmit { ", retx" } else { "" }
            ),
            Control::Ack {
                ack_number,
                not_ready,
            } => write!(
                f,
                "ACK(ack={}{})",
                ack_number,
                if not_ready { ", nrdy" } else { "" }
            ),
            Control::Nak {
                ack_number,
                not_ready,
            } => write!(
                f,
                "NAK(ack={}{})",
                ack_number,
                if not_ready { ", nrdy" } else { "" }
            ),
            other => f.write_str(other.name()),
        }
    }
}
