use super::{VehicleMessage, LOCKING_SYSTEMS_2_ID};
use crate::codec::SignalField;
use crate::frame::Frame;
use crate::hal::Timestamp;
use serde::{Deserialize, Serialize};

/// `Veh_Lock_Status`
pub const VEH_LOCK_STATUS: SignalField = SignalField::new(34, 2);

pub const VEH_LOCK_DBL: u8 = 0;
pub const VEH_LOCK_ALL: u8 = 1;
pub const VEH_UNLOCK_ALL: u8 = 2;
pub const VEH_UNLOCK_DRV: u8 = 3;
/// Placeholder held until the first locking frame arrives.
pub const VEH_LOCK_UNKNOWN: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockStatus {
    DoubleLocked,
    Locked,
    UnlockedAll,
    UnlockedDriver,
    Unknown(u8),
}

impl LockStatus {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            VEH_LOCK_DBL => Self::DoubleLocked,
            VEH_LOCK_ALL => Self::Locked,
            VEH_UNLOCK_ALL => Self::UnlockedAll,
            VEH_UNLOCK_DRV => Self::UnlockedDriver,
            other => Self::Unknown(other),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::DoubleLocked => "LOCK_DBL",
            Self::Locked => "LOCK_ALL",
            Self::UnlockedAll => "UNLOCK_ALL",
            Self::UnlockedDriver => "UNLOCK_DRV",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

/// `Locking_Systems_2_FD1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockingStatus {
    pub vehicle_lock_status: u8,
    pub received_at: Timestamp,
    pub valid: bool,
}

impl LockingStatus {
    pub fn status(&self) -> LockStatus {
        LockStatus::from_raw(self.vehicle_lock_status)
    }
}

impl VehicleMessage for LockingStatus {
    const ID: u16 = LOCKING_SYSTEMS_2_ID;
    const NAME: &'static str = "Locking_Systems_2_FD1";

    fn decode(frame: &Frame) -> Self {
        Self {
            vehicle_lock_status: VEH_LOCK_STATUS.extract(&frame.payload) as u8,
            received_at: frame.received_at,
            valid: true,
        }
    }

    fn invalid() -> Self {
        Self {
            vehicle_lock_status: VEH_LOCK_UNKNOWN,
            received_at: 0,
            valid: false,
        }
    }

    fn is_valid(&self) -> bool {
        self.valid
    }
}
