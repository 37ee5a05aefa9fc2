use super::{VehicleMessage, POWERTRAIN_DATA_10_ID};
use crate::codec::SignalField;
use crate::frame::Frame;
use crate::hal::Timestamp;
use serde::{Deserialize, Serialize};

/// `TrnPrkSys_D_Actl`: transmission park system state.
pub const TRN_PRK_SYS_STATUS: SignalField = SignalField::new(31, 4);

pub const TRNPRKSTS_UNKNOWN: u8 = 0;
pub const TRNPRKSTS_PARK: u8 = 1;
pub const TRNPRKSTS_TRANSITION_CLOSE_TO_PARK: u8 = 2;
pub const TRNPRKSTS_AT_NO_SPRING: u8 = 3;
pub const TRNPRKSTS_TRANSITION_CLOSE_TO_OUT_OF_PARK: u8 = 4;
pub const TRNPRKSTS_OUT_OF_PARK: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParkStatus {
    Unknown,
    Park,
    TransitionCloseToPark,
    AtNoSpring,
    TransitionCloseToOutOfPark,
    OutOfPark,
    /// Codes 6 and up: faults and overrides.
    Fault(u8),
}

impl ParkStatus {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            TRNPRKSTS_UNKNOWN => Self::Unknown,
            TRNPRKSTS_PARK => Self::Park,
            TRNPRKSTS_TRANSITION_CLOSE_TO_PARK => Self::TransitionCloseToPark,
            TRNPRKSTS_AT_NO_SPRING => Self::AtNoSpring,
            TRNPRKSTS_TRANSITION_CLOSE_TO_OUT_OF_PARK => Self::TransitionCloseToOutOfPark,
            TRNPRKSTS_OUT_OF_PARK => Self::OutOfPark,
            other => Self::Fault(other),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Park => "PARK",
            Self::TransitionCloseToPark => "TRANSITION_CLOSE_TO_PARK",
            Self::AtNoSpring => "AT_NO_SPRING",
            Self::TransitionCloseToOutOfPark => "TRANSITION_CLOSE_TO_OUT_OF_PARK",
            Self::OutOfPark => "OUT_OF_PARK",
            Self::Fault(_) => "FAULT",
        }
    }
}

/// `PowertrainData_10`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowertrainStatus {
    pub transmission_park_status: u8,
    pub received_at: Timestamp,
    pub valid: bool,
}

impl PowertrainStatus {
    pub fn status(&self) -> ParkStatus {
        ParkStatus::from_raw(self.transmission_park_status)
    }
}

impl VehicleMessage for PowertrainStatus {
    const ID: u16 = POWERTRAIN_DATA_10_ID;
    const NAME: &'static str = "PowertrainData_10";

    fn decode(frame: &Frame) -> Self {
        Self {
            transmission_park_status: TRN_PRK_SYS_STATUS.extract(&frame.payload) as u8,
            received_at: frame.received_at,
            valid: true,
        }
    }

    fn invalid() -> Self {
        Self {
            transmission_park_status: TRNPRKSTS_UNKNOWN,
            received_at: 0,
            valid: false,
        }
    }

    fn is_valid(&self) -> bool {
        self.valid
    }
}
