//! Vehicle state aggregation: latest and previous value of every tracked
//! signal, per-signal freshness, derived conditions and system readiness.

use crate::config::{MAX_WINDOW_MS, READINESS_TIMEOUT_MS};
use crate::hal::{elapsed_ms, Timestamp};
use crate::messages::lamp::{LampRequest, PUDLAMP_OFF, PUDLAMP_ON, PUDLAMP_RAMP_UP};
use crate::messages::locking::{LockStatus, VEH_LOCK_UNKNOWN, VEH_UNLOCK_ALL, VEH_UNLOCK_DRV};
use crate::messages::powertrain::{ParkStatus, TRNPRKSTS_PARK, TRNPRKSTS_UNKNOWN};
use crate::messages::{
    BatteryStatus, LampStatus, LockingStatus, ParsedMessage, PowertrainStatus, VehicleMessage,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Battery changes smaller than this are not worth a log line.
const BATTERY_LOG_DELTA: u8 = 5;

/// Lamp request codes that mean the puddle lamps are lit or lighting.
pub fn lamp_requests_light(raw: u8) -> bool {
    raw == PUDLAMP_ON || raw == PUDLAMP_RAMP_UP
}

pub fn lock_status_is_unlocked(raw: u8) -> bool {
    raw == VEH_UNLOCK_ALL || raw == VEH_UNLOCK_DRV
}

/// Only the exact Park code counts; transitions and faults do not.
pub fn park_status_is_parked(raw: u8) -> bool {
    raw == TRNPRKSTS_PARK
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedSignal {
    pub current: u8,
    pub previous: u8,
    /// `None` until the first accepted update.
    pub last_update: Option<Timestamp>,
}

impl TrackedSignal {
    pub const fn new(initial: u8) -> Self {
        Self {
            current: initial,
            previous: initial,
            last_update: None,
        }
    }

    fn accept(&mut self, value: u8, now: Timestamp) {
        self.previous = self.current;
        self.current = value;
        self.last_update = Some(now);
    }

    pub fn changed(&self) -> bool {
        self.current != self.previous
    }

    pub fn is_fresh(&self, now: Timestamp, timeout_ms: u32) -> bool {
        self.last_update
            .is_some_and(|updated| elapsed_ms(now, updated) < timeout_ms)
    }

    pub fn age_ms(&self, now: Timestamp) -> Option<u32> {
        self.last_update.map(|updated| elapsed_ms(now, updated))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalFreshness {
    pub lamp: bool,
    pub locking: bool,
    pub powertrain: bool,
    pub battery: bool,
}

impl SignalFreshness {
    pub fn any(&self) -> bool {
        self.lamp || self.locking || self.powertrain || self.battery
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleState {
    pub pud_lamp_request: TrackedSignal,
    pub vehicle_lock_status: TrackedSignal,
    pub transmission_park_status: TrackedSignal,
    pub battery_soc: TrackedSignal,

    pub bedlight_on: bool,
    pub is_unlocked: bool,
    pub is_parked: bool,
    pub system_ready: bool,
}

impl VehicleState {
    pub fn lamp_request(&self) -> LampRequest {
        LampRequest::from_raw(self.pud_lamp_request.current)
    }

    pub fn lock_status(&self) -> LockStatus {
        LockStatus::from_raw(self.vehicle_lock_status.current)
    }

    pub fn park_status(&self) -> ParkStatus {
        ParkStatus::from_raw(self.transmission_park_status.current)
    }
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            pud_lamp_request: TrackedSignal::new(PUDLAMP_OFF),
            vehicle_lock_status: TrackedSignal::new(VEH_LOCK_UNKNOWN),
            transmission_park_status: TrackedSignal::new(TRNPRKSTS_UNKNOWN),
            battery_soc: TrackedSignal::new(0),
            bedlight_on: false,
            is_unlocked: false,
            is_parked: false,
            system_ready: false,
        }
    }
}

/// Sole writer of [`VehicleState`].
#[derive(Debug)]
pub struct VehicleStateManager {
    state: VehicleState,
    readiness_timeout_ms: u32,
}

impl VehicleStateManager {
    pub fn new() -> Self {
        Self::with_readiness_timeout(READINESS_TIMEOUT_MS)
    }

    /// A window of zero, or one too close to the counter wrap period to
    /// ever expire, is replaced by the default.
    pub fn with_readiness_timeout(readiness_timeout_ms: u32) -> Self {
        let out_of_range = readiness_timeout_ms == 0 || readiness_timeout_ms >= MAX_WINDOW_MS;
        let readiness_timeout_ms = if out_of_range {
            warn!(
                "Readiness timeout {} ms out of range, using {} ms",
                readiness_timeout_ms, READINESS_TIMEOUT_MS
            );
            READINESS_TIMEOUT_MS
        } else {
            readiness_timeout_ms
        };

        Self {
            state: VehicleState::default(),
            readiness_timeout_ms,
        }
    }

    pub fn update_lamp(&mut self, status: &LampStatus, now: Timestamp) {
        if !status.is_valid() {
            return;
        }

        let signal = &mut self.state.pud_lamp_request;
        signal.accept(status.pud_lamp_request, now);
        self.state.bedlight_on = lamp_requests_light(signal.current);

        if signal.changed() {
            info!(
                "PudLamp state changed: {} -> {} (bedlight should be {})",
                LampRequest::from_raw(signal.previous).label(),
                LampRequest::from_raw(signal.current).label(),
                on_off(self.state.bedlight_on)
            );
        }
    }

    pub fn update_locking(&mut self, status: &LockingStatus, now: Timestamp) {
        if !status.is_valid() {
            return;
        }

        let signal = &mut self.state.vehicle_lock_status;
        signal.accept(status.vehicle_lock_status, now);
        self.state.is_unlocked = lock_status_is_unlocked(signal.current);

        if signal.changed() {
            info!(
                "Vehicle lock state changed: {} -> {} (unlocked: {})",
                LockStatus::from_raw(signal.previous).label(),
                LockStatus::from_raw(signal.current).label(),
                yes_no(self.state.is_unlocked)
            );
        }
    }

    pub fn update_powertrain(&mut self, status: &PowertrainStatus, now: Timestamp) {
        if !status.is_valid() {
            return;
        }

        let signal = &mut self.state.transmission_park_status;
        signal.accept(status.transmission_park_status, now);
        self.state.is_parked = park_status_is_parked(signal.current);

        if signal.changed() {
            info!(
                "Transmission park state changed: {} -> {} (parked: {})",
                ParkStatus::from_raw(signal.previous).label(),
                ParkStatus::from_raw(signal.current).label(),
                yes_no(self.state.is_parked)
            );
        }
    }

    pub fn update_battery(&mut self, status: &BatteryStatus, now: Timestamp) {
        if !status.is_valid() {
            return;
        }

        let signal = &mut self.state.battery_soc;
        signal.accept(status.battery_soc, now);

        if signal.current.abs_diff(signal.previous) >= BATTERY_LOG_DELTA {
            info!(
                "Battery SOC changed significantly: {}% -> {}%",
                signal.previous, signal.current
            );
        }
    }

    /// Feeds a routed message to its update entry point. Returns whether the
    /// message was accepted.
    pub fn apply(&mut self, message: &ParsedMessage, now: Timestamp) -> bool {
        match message {
            ParsedMessage::Lamp(m) => self.update_lamp(m, now),
            ParsedMessage::Locking(m) => self.update_locking(m, now),
            ParsedMessage::Powertrain(m) => self.update_powertrain(m, now),
            ParsedMessage::Battery(m) => self.update_battery(m, now),
        }
        message.is_valid()
    }

    pub fn freshness(&self, now: Timestamp) -> SignalFreshness {
        let timeout = self.readiness_timeout_ms;
        SignalFreshness {
            lamp: self.state.pud_lamp_request.is_fresh(now, timeout),
            locking: self.state.vehicle_lock_status.is_fresh(now, timeout),
            powertrain: self.state.transmission_park_status.is_fresh(now, timeout),
            battery: self.state.battery_soc.is_fresh(now, timeout),
        }
    }

    /// Ready while any one signal is fresh. Run once per cycle.
    pub fn recompute_readiness(&mut self, now: Timestamp) -> bool {
        let was_ready = self.state.system_ready;
        let freshness = self.freshness(now);
        self.state.system_ready = freshness.any();

        if was_ready != self.state.system_ready {
            info!(
                "System readiness changed: {} (BCM:{}, Lock:{}, PT:{}, Batt:{})",
                if self.state.system_ready { "READY" } else { "NOT_READY" },
                ok_timeout(freshness.lamp),
                ok_timeout(freshness.locking),
                ok_timeout(freshness.powertrain),
                ok_timeout(freshness.battery)
            );
        }

        self.state.system_ready
    }

    /// Marks every signal as just refreshed without touching its value.
    pub fn reset_timeouts(&mut self, now: Timestamp) {
        for signal in [
            &mut self.state.pud_lamp_request,
            &mut self.state.vehicle_lock_status,
            &mut self.state.transmission_park_status,
            &mut self.state.battery_soc,
        ] {
            signal.last_update = Some(now);
        }
        debug!("State timeouts reset at {}", now);
    }

    pub fn get_state(&self) -> &VehicleState {
        &self.state
    }

    pub fn readiness_timeout_ms(&self) -> u32 {
        self.readiness_timeout_ms
    }
}

impl Default for VehicleStateManager {
    fn default() -> Self {
        Self::new()
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "ON" } else { "OFF" }
}

fn yes_no(value: bool) -> &'static str {
    if value { "YES" } else { "NO" }
}

fn ok_timeout(value: bool) -> &'static str {
    if value { "OK" } else { "TIMEOUT" }
}
