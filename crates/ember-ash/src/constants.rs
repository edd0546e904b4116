//! Link protocol constants.

// ============================================================================
// Reserved bytes
// ============================================================================

/// Marks the end of a frame.
pub const FLAG: u8 = 0x7E;
/// Introduces an escaped byte; the next byte is XOR'd with [`ESCAPE_XOR`].
pub const ESCAPE: u8 = 0x7D;
/// Resume transmission (software flow control).
pub const XON: u8 = 0x11;
/// Pause transmission (software flow control).
pub const XOFF: u8 = 0x13;
/// Replaces a byte that had a low-level reception error.
pub const SUBSTITUTE: u8 = 0x18;
/// Discards the frame in progress.
pub const CANCEL: u8 = 0x1A;

/// Applied to a reserved byte after [`ESCAPE`].
pub const ESCAPE_XOR: u8 = 0x20;

/// Bytes that never appear unescaped inside a frame.
pub const RESERVED_BYTES: [u8; 6] = [FLAG, ESCAPE, XON, XOFF, SUBSTITUTE, CANCEL];

// ============================================================================
// Control bytes
// ============================================================================

/// Control byte of a reset request.
pub const CONTROL_RST: u8 = 0xC0;
/// Control byte of a reset acknowledgement.
pub const CONTROL_RSTACK: u8 = 0xC1;
/// Control byte of a fatal error report.
pub const CONTROL_ERROR: u8 = 0xC2;

/// ACK frames: `1000 n aaa`.
pub const CONTROL_ACK: u8 = 0x80;
/// NAK frames: `1010 n aaa`.
pub const CONTROL_NAK: u8 = 0xA0;

/// Retransmit flag of a DATA control byte.
pub const DATA_RETRANSMIT: u8 = 0x08;
/// Not-ready flag of an ACK or NAK control byte.
pub const NOT_READY: u8 = 0x08;

// ============================================================================
// Protocol parameters
// ============================================================================

/// Link protocol version carried by RSTACK and ERROR frames.
pub const ASH_VERSION: u8 = 0x02;

/// Sequence numbers are three bits wide.
pub const SEQUENCE_MODULUS: u8 = 8;

/// Largest unacknowledged window that keeps selective buffering unambiguous.
pub const MAX_WINDOW: u8 = 4;

/// Longest DATA field accepted.
pub const MAX_DATA_LEN: usize = 128;

/// Longest unstuffed frame: control, data and CRC.
pub const MAX_FRAME_LEN: usize = 1 + MAX_DATA_LEN + 2;

/// Shortest unstuffed frame: control and CRC.
pub const MIN_FRAME_LEN: usize = 3;

/// Seed of the data randomization sequence.
pub const RANDOM_SEED: u8 = 0x42;
/// Feedback taps of the randomization LFSR.
pub const RANDOM_TAPS: u8 = 0xB8;

// ============================================================================
// Reset and error codes
// ============================================================================

/// Reset code: unknown reason.
pub const RESET_UNKNOWN: u8 = 0x00;
/// Reset code: external pin.
pub const RESET_EXTERNAL: u8 = 0x01;
/// Reset code: power on.
pub const RESET_POWER_ON: u8 = 0x02;
/// Reset code: watchdog.
pub const RESET_WATCHDOG: u8 = 0x03;
/// Reset code: assertion.
pub const RESET_ASSERT: u8 = 0x06;
/// Reset code: boot loader.
pub const RESET_BOOTLOADER: u8 = 0x09;
/// Reset code: software requested (sent in reply to an RST).
pub const RESET_SOFTWARE: u8 = 0x0B;

/// Error code: exceeded the maximum number of acknowledgement timeouts.
pub const ERROR_EXCEEDED_MAX_ACK_TIMEOUTS: u8 = 0x51;
