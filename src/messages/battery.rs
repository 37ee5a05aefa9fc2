use super::{VehicleMessage, BATTERY_MGMT_3_ID};
use crate::codec::SignalField;
use crate::frame::Frame;
use crate::hal::Timestamp;
use serde::{Deserialize, Serialize};

/// `BSBattSOC`: starter battery state of charge, raw percent.
pub const BATTERY_SOC: SignalField = SignalField::new(22, 7);

/// `Battery_Mgmt_3_FD1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryStatus {
    pub battery_soc: u8,
    pub received_at: Timestamp,
    pub valid: bool,
}

impl VehicleMessage for BatteryStatus {
    const ID: u16 = BATTERY_MGMT_3_ID;
    const NAME: &'static str = "Battery_Mgmt_3_FD1";

    fn decode(frame: &Frame) -> Self {
        Self {
            battery_soc: BATTERY_SOC.extract(&frame.payload) as u8,
            received_at: frame.received_at,
            valid: true,
        }
    }

    fn invalid() -> Self {
        Self {
            battery_soc: 0,
            received_at: 0,
            valid: false,
        }
    }

    fn is_valid(&self) -> bool {
        self.valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_payload_soc() {
        let payload = [0x32, 0x00, 0x41, 0x57, 0x40, 0xD9, 0x88, 0xC8];
        let frame = Frame::new(BATTERY_MGMT_3_ID, payload, 0);
        let status = BatteryStatus::parse(&frame);
        assert!(status.valid);
        assert_eq!(status.battery_soc, 65);
    }

    #[test]
    fn test_top_bit_of_byte_two_is_outside_field() {
        let frame = Frame::new(BATTERY_MGMT_3_ID, [0, 0, 0xFF, 0, 0, 0, 0, 0], 0);
        assert_eq!(BatteryStatus::parse(&frame).battery_soc, 127);
    }

    #[test]
    fn test_out_of_range_percent_passes_through() {
        let mut payload = [0u8; 8];
        BATTERY_SOC.set(&mut payload, 120);
        let status = BatteryStatus::parse(&Frame::new(BATTERY_MGMT_3_ID, payload, 0));
        assert_eq!(status.battery_soc, 120);
    }
}
