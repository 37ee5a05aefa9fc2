pub mod battery;
pub mod lamp;
pub mod locking;
pub mod powertrain;

pub use battery::BatteryStatus;
pub use lamp::{LampRequest, LampStatus};
pub use locking::{LockStatus, LockingStatus};
pub use powertrain::{ParkStatus, PowertrainStatus};

use crate::codec::PAYLOAD_LEN;
use crate::frame::Frame;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const BCM_LAMP_STAT_ID: u16 = 0x3C3;
pub const LOCKING_SYSTEMS_2_ID: u16 = 0x331;
pub const POWERTRAIN_DATA_10_ID: u16 = 0x176;
pub const BATTERY_MGMT_3_ID: u16 = 0x43C;

/// Every message this controller listens to carries a full 8-byte payload.
pub const EXPECTED_LENGTH: u8 = PAYLOAD_LEN as u8;

/// Parsed view of one fixed-layout message.
pub trait VehicleMessage: Sized {
    const ID: u16;
    const NAME: &'static str;

    /// Pulls the message's fields out of a frame already checked for ID and length.
    fn decode(frame: &Frame) -> Self;

    /// Result carrying no meaningful fields.
    fn invalid() -> Self;

    fn is_valid(&self) -> bool;

    /// Checks the frame contract, then decodes. Never fails hard: a frame
    /// with the wrong ID or length yields a result with `valid == false`.
    fn parse(frame: &Frame) -> Self {
        if frame.id != Self::ID || frame.length != EXPECTED_LENGTH {
            warn!(
                "Invalid {} frame: ID=0x{:03X}, length={}",
                Self::NAME, frame.id, frame.length
            );
            return Self::invalid();
        }

        Self::decode(frame)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    LampStatus,
    LockingStatus,
    PowertrainStatus,
    BatteryStatus,
}

impl MessageKind {
    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            BCM_LAMP_STAT_ID => Some(Self::LampStatus),
            LOCKING_SYSTEMS_2_ID => Some(Self::LockingStatus),
            POWERTRAIN_DATA_10_ID => Some(Self::PowertrainStatus),
            BATTERY_MGMT_3_ID => Some(Self::BatteryStatus),
            _ => None,
        }
    }

    pub fn id(self) -> u16 {
        match self {
            Self::LampStatus => LampStatus::ID,
            Self::LockingStatus => LockingStatus::ID,
            Self::PowertrainStatus => PowertrainStatus::ID,
            Self::BatteryStatus => BatteryStatus::ID,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LampStatus => LampStatus::NAME,
            Self::LockingStatus => LockingStatus::NAME,
            Self::PowertrainStatus => PowertrainStatus::NAME,
            Self::BatteryStatus => BatteryStatus::NAME,
        }
    }
}

/// True for the four identifiers this controller consumes.
///
/// Runs on every frame seen on the bus, so it stays a plain comparison chain.
#[inline]
pub fn is_recognized(id: u16) -> bool {
    id == BCM_LAMP_STAT_ID
        || id == LOCKING_SYSTEMS_2_ID
        || id == POWERTRAIN_DATA_10_ID
        || id == BATTERY_MGMT_3_ID
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParsedMessage {
    Lamp(LampStatus),
    Locking(LockingStatus),
    Powertrain(PowertrainStatus),
    Battery(BatteryStatus),
}

impl ParsedMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Lamp(_) => MessageKind::LampStatus,
            Self::Locking(_) => MessageKind::LockingStatus,
            Self::Powertrain(_) => MessageKind::PowertrainStatus,
            Self::Battery(_) => MessageKind::BatteryStatus,
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Self::Lamp(m) => m.is_valid(),
            Self::Locking(m) => m.is_valid(),
            Self::Powertrain(m) => m.is_valid(),
            Self::Battery(m) => m.is_valid(),
        }
    }
}

/// Routes a frame to its parser. Returns `None` for identifiers outside the
/// recognized set, which is most of the bus traffic.
pub fn parse(frame: &Frame) -> Option<ParsedMessage> {
    let parsed = match MessageKind::from_id(frame.id)? {
        MessageKind::LampStatus => ParsedMessage::Lamp(LampStatus::parse(frame)),
        MessageKind::LockingStatus => ParsedMessage::Locking(LockingStatus::parse(frame)),
        MessageKind::PowertrainStatus => ParsedMessage::Powertrain(PowertrainStatus::parse(frame)),
        MessageKind::BatteryStatus => ParsedMessage::Battery(BatteryStatus::parse(frame)),
    };

    if parsed.is_valid() {
        debug!("Parsed {}: {:?}", parsed.kind().name(), parsed);
    }

    Some(parsed)
}
