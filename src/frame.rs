use crate::codec::{Payload, PAYLOAD_LEN};
use crate::hal::Timestamp;
use serde::{Deserialize, Serialize};

/// Highest identifier representable in an 11-bit standard CAN frame.
pub const MAX_STANDARD_ID: u16 = 0x7FF;

/// One received CAN frame. Built by the bus driver and consumed once by a parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub id: u16,
    pub length: u8,
    pub payload: Payload,
    pub received_at: Timestamp,
}

impl Frame {
    pub fn new(id: u16, payload: Payload, received_at: Timestamp) -> Self {
        Self {
            id,
            length: PAYLOAD_LEN as u8,
            payload,
            received_at,
        }
    }

    /// Builds a frame from a driver buffer. Bytes past the eighth are dropped
    /// and missing bytes read as zero; `length` keeps the reported size
    /// (saturating at 255) so parsers can reject anything but 8.
    pub fn from_slice(id: u16, data: &[u8], received_at: Timestamp) -> Self {
        let mut payload = [0u8; PAYLOAD_LEN];
        let copied = data.len().min(PAYLOAD_LEN);
        payload[..copied].copy_from_slice(&data[..copied]);

        Self {
            id,
            length: u8::try_from(data.len()).unwrap_or(u8::MAX),
            payload,
            received_at,
        }
    }

    pub fn is_standard_id(&self) -> bool {
        self.id <= MAX_STANDARD_ID
    }

    pub fn data(&self) -> &[u8] {
        let len = usize::from(self.length).min(PAYLOAD_LEN);
        &self.payload[..len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_short_frame() {
        let frame = Frame::from_slice(0x331, &[0x01, 0x02, 0x03], 42);
        assert_eq!(frame.length, 3);
        assert_eq!(frame.payload, [0x01, 0x02, 0x03, 0, 0, 0, 0, 0]);
        assert_eq!(frame.data(), &[0x01, 0x02, 0x03]);
        assert_eq!(frame.received_at, 42);
    }

    #[test]
    fn test_from_slice_long_buffer_keeps_reported_length() {
        let frame = Frame::from_slice(0x176, &[0xAA; 12], 0);
        assert_eq!(frame.length, 12);
        assert_eq!(frame.payload, [0xAA; 8]);
        assert_eq!(frame.data(), &[0xAA; 8]);
    }

    #[test]
    fn test_from_slice_length_saturates() {
        let frame = Frame::from_slice(0x176, &[0x11; 300], 0);
        assert_eq!(frame.length, u8::MAX);
        assert_eq!(frame.data().len(), 8);
    }

    #[test]
    fn test_standard_id_range() {
        assert!(Frame::new(0x7FF, [0; 8], 0).is_standard_id());
        assert!(!Frame::new(0x800, [0; 8], 0).is_standard_id());
    }
}
