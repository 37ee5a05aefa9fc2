use super::{VehicleMessage, BCM_LAMP_STAT_ID};
use crate::codec::SignalField;
use crate::frame::Frame;
use crate::hal::Timestamp;
use serde::{Deserialize, Serialize};

/// `PudLamp_D_Rq`: puddle lamp request from the body control module.
pub const PUD_LAMP_REQUEST: SignalField = SignalField::new(11, 2);

pub const PUDLAMP_OFF: u8 = 0;
pub const PUDLAMP_ON: u8 = 1;
pub const PUDLAMP_RAMP_UP: u8 = 2;
pub const PUDLAMP_RAMP_DOWN: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LampRequest {
    Off,
    On,
    RampUp,
    RampDown,
    Unknown(u8),
}

impl LampRequest {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            PUDLAMP_OFF => Self::Off,
            PUDLAMP_ON => Self::On,
            PUDLAMP_RAMP_UP => Self::RampUp,
            PUDLAMP_RAMP_DOWN => Self::RampDown,
            other => Self::Unknown(other),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::On => "ON",
            Self::RampUp => "RAMP_UP",
            Self::RampDown => "RAMP_DOWN",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

/// `BCM_Lamp_Stat_FD1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LampStatus {
    pub pud_lamp_request: u8,
    pub received_at: Timestamp,
    pub valid: bool,
}

impl LampStatus {
    pub fn request(&self) -> LampRequest {
        LampRequest::from_raw(self.pud_lamp_request)
    }
}

impl VehicleMessage for LampStatus {
    const ID: u16 = BCM_LAMP_STAT_ID;
    const NAME: &'static str = "BCM_Lamp_Stat_FD1";

    fn decode(frame: &Frame) -> Self {
        Self {
            pud_lamp_request: PUD_LAMP_REQUEST.extract(&frame.payload) as u8,
            received_at: frame.received_at,
            valid: true,
        }
    }

    fn invalid() -> Self {
        Self {
            pud_lamp_request: PUDLAMP_OFF,
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
    fn test_reference_payload_lamp_on() {
        let payload = [0x40, 0xC4, 0x00, 0x00, 0x00, 0x00, 0x81, 0x00];
        let frame = Frame::new(BCM_LAMP_STAT_ID, payload, 10);
        let status = LampStatus::parse(&frame);

        assert!(status.valid);
        assert_eq!(status.pud_lamp_request, PUDLAMP_ON);
        assert_eq!(status.request(), LampRequest::On);
        assert_eq!(status.received_at, 10);
    }

    #[test]
    fn test_every_request_code_decodes() {
        for raw in 0u8..4 {
            let mut payload = [0u8; 8];
            PUD_LAMP_REQUEST.set(&mut payload, u64::from(raw));
            let status = LampStatus::parse(&Frame::new(BCM_LAMP_STAT_ID, payload, 0));
            assert_eq!(status.pud_lamp_request, raw);
        }
    }

    #[test]
    fn test_wrong_id_rejected() {
        let status = LampStatus::parse(&Frame::new(0x3C4, [0xFF; 8], 0));
        assert!(!status.valid);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let status = LampStatus::parse(&Frame::from_slice(BCM_LAMP_STAT_ID, &[0x40, 0xC4], 0));
        assert!(!status.valid);
    }

    #[test]
    fn test_unknown_label() {
        assert_eq!(LampRequest::from_raw(7).label(), "UNKNOWN");
        assert_eq!(LampRequest::from_raw(3).label(), "RAMP_DOWN");
    }
}
