//! Serial frame format of Nonin-style pulse oximeters.
//!
//! Each sample travels as a fixed 5-byte frame:
//!
//! ```text
//! [status, low, value, flags, checksum]
//! ```
//!
//! - `status` is always `0x01`
//! - `value` carries the plethysmographic sample that gets recorded
//! - `flags` is a 7-bit field, the top bit must be clear
//! - `checksum` is the modulo-256 sum of the first four bytes
//!
//! There is no start-of-frame marker, so alignment is recovered by scanning
//! for a window that passes [`validate`].

use crate::error::{OxiError, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Length of one frame on the wire.
pub const FRAME_LEN: usize = 5;

/// Value of the leading status byte in every frame.
pub const STATUS_BYTE: u8 = 0x01;

/// Highest legal value of the flags byte.
pub const MAX_FLAGS: u8 = 0x7f;

/// Checksum over the first four bytes of a frame.
#[inline]
pub fn checksum(head: &[u8]) -> u8 {
    head.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Returns `true` iff `bytes` is exactly one well-formed frame.
pub fn validate(bytes: &[u8]) -> bool {
    let [status, _low, _value, flags, sum] = bytes else {
        return false;
    };
    *status == STATUS_BYTE && *flags <= MAX_FLAGS && *sum == checksum(&bytes[..4])
}

/// One 5-byte frame (wire layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Packet {
    pub status: u8,
    pub low: u8,
    /// Recorded sample value
    pub value: u8,
    pub flags: u8,
    pub checksum: u8,
}

impl Packet {
    /// Build a valid frame, filling in status and checksum.
    pub fn encode(low: u8, value: u8, flags: u8) -> Self {
        let flags = flags & MAX_FLAGS;
        Self {
            status: STATUS_BYTE,
            low,
            value,
            flags,
            checksum: checksum(&[STATUS_BYTE, low, value, flags]),
        }
    }

    /// Parse and validate a frame.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut frame = [0u8; FRAME_LEN];
        let n = bytes.len().min(FRAME_LEN);
        frame[..n].copy_from_slice(&bytes[..n]);
        if !validate(bytes) {
            return Err(OxiError::FrameValidation { frame });
        }
        Packet::read_from_bytes(&frame[..]).map_err(|_| OxiError::FrameValidation { frame })
    }

    /// The sample carried by this frame.
    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn to_array(&self) -> [u8; FRAME_LEN] {
        [self.status, self.low, self.value, self.flags, self.checksum]
    }
}

/// A decoded sample together with its position in the recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub index: usize,
    pub value: i32,
}

impl Sample {
    pub fn new(index: usize, value: i32) -> Self {
        Self { index, value }
    }

    /// Elapsed time of this sample in seconds.
    pub fn time_secs(&self, sampling_rate: f64) -> f64 {
        self.index as f64 / sampling_rate
    }
}
