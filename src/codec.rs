//! DBC-style bit field access on an 8-byte CAN payload.
//!
//! The payload is read as one little-endian `u64`: bit 0 is the least
//! significant bit of byte 0 and bit 63 is the most significant bit of
//! byte 7. A field is addressed by the index of its most significant bit and
//! its width, so it occupies bits `msb - width + 1 ..= msb`.

use serde::{Deserialize, Serialize};

pub const PAYLOAD_LEN: usize = 8;
pub const PAYLOAD_BITS: u8 = 64;

pub type Payload = [u8; PAYLOAD_LEN];

/// Position of a named signal inside a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalField {
    pub msb: u8,
    pub width: u8,
}

impl SignalField {
    pub const fn new(msb: u8, width: u8) -> Self {
        Self { msb, width }
    }

    pub fn extract(&self, payload: &Payload) -> u64 {
        extract(payload, self.msb, self.width)
    }

    pub fn set(&self, payload: &mut Payload, value: u64) {
        set(payload, self.msb, self.width, value);
    }

    pub const fn is_in_range(&self) -> bool {
        low_bit(self.msb, self.width).is_some()
    }
}

/// Low bit position of a field, or `None` when it does not fit in 64 bits.
const fn low_bit(msb: u8, width: u8) -> Option<u8> {
    if width == 0 || width > PAYLOAD_BITS || msb >= PAYLOAD_BITS || width > msb + 1 {
        return None;
    }
    Some(msb + 1 - width)
}

const fn field_mask(width: u8) -> u64 {
    if width >= PAYLOAD_BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Reads a field. Out-of-range requests read as zero.
pub fn extract(payload: &Payload, msb: u8, width: u8) -> u64 {
    let Some(low) = low_bit(msb, width) else {
        return 0;
    };

    let raw = u64::from_le_bytes(*payload);
    (raw >> low) & field_mask(width)
}

/// Writes a field in place, leaving every other bit untouched.
///
/// `value` is truncated to `width` bits. Out-of-range requests leave the
/// payload unchanged.
pub fn set(payload: &mut Payload, msb: u8, width: u8, value: u64) {
    let Some(low) = low_bit(msb, width) else {
        return;
    };

    let mask = field_mask(width) << low;
    let raw = u64::from_le_bytes(*payload);
    let updated = (raw & !mask) | ((value << low) & mask);
    *payload = updated.to_le_bytes();
}
