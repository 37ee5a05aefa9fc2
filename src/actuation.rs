//! Output decisions: bed light, toolbox release and indicator outputs.
//!
//! Every physical write is edge-triggered. The release output is bounded two
//! ways: it drops as soon as its condition goes false, and it drops once its
//! fixed on-time has elapsed even if the condition holds.

use crate::button::{ButtonState, ButtonTracker};
use crate::config::{ControllerConfig, RELEASE_DURATION_MS};
use crate::hal::{elapsed_ms, ButtonInput, OutputPins, Timestamp};
use crate::state::VehicleState;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShutoffReason {
    ConditionLost,
    Timeout,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActuatorState {
    pub bedlight: bool,
    pub release_output: bool,
    pub release_output_started_at: Timestamp,
    /// Logical button level, `true` while pressed.
    pub button_input: bool,

    pub parked_indicator: bool,
    pub unlocked_indicator: bool,
    pub ready_indicator: bool,

    pub release_activations: u32,
    pub last_release_shutoff: Option<ShutoffReason>,
}

/// Toolbox release rule: fresh data, transmission in Park, doors unlocked.
pub fn release_conditions_met(vehicle: &VehicleState) -> bool {
    vehicle.system_ready && vehicle.is_parked && vehicle.is_unlocked
}

#[derive(Debug)]
pub struct ActuationController {
    state: ActuatorState,
    button: ButtonTracker,
    release_duration_ms: u32,
    /// Rule value seen on the previous step, for rising-edge detection.
    release_rule_was_met: bool,
}

impl ActuationController {
    pub fn new() -> Self {
        Self::with_release_duration(RELEASE_DURATION_MS)
    }

    pub fn with_release_duration(release_duration_ms: u32) -> Self {
        Self {
            state: ActuatorState::default(),
            button: ButtonTracker::new(),
            release_duration_ms,
            release_rule_was_met: false,
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            state: ActuatorState::default(),
            button: ButtonTracker::with_timing(
                config.button_debounce_ms,
                config.button_hold_threshold_ms,
                config.button_double_click_ms,
            ),
            release_duration_ms: config.release_duration_ms,
            release_rule_was_met: false,
        }
    }

    /// One actuation cycle against the freshly aggregated vehicle state.
    pub fn step<P>(&mut self, now: Timestamp, vehicle: &VehicleState, io: &mut P)
    where
        P: OutputPins + ButtonInput,
    {
        // Pull-up wiring: electrical low means pressed
        let pressed = !io.read_button_level();
        self.state.button_input = pressed;
        self.button.update(pressed, now);

        self.set_bedlight(vehicle.bedlight_on, io);
        self.set_indicators(vehicle, io);

        let rule = release_conditions_met(vehicle);
        if rule && !self.release_rule_was_met {
            self.activate_release(now, io);
        } else if !rule && self.state.release_output {
            self.deactivate_release(ShutoffReason::ConditionLost, now, io);
        }
        self.release_rule_was_met = rule;

        if self.state.release_output
            && elapsed_ms(now, self.state.release_output_started_at) >= self.release_duration_ms
        {
            self.deactivate_release(ShutoffReason::Timeout, now, io);
        }
    }

    fn set_bedlight<P: OutputPins>(&mut self, on: bool, io: &mut P) {
        if self.state.bedlight != on {
            self.state.bedlight = on;
            io.write_bedlight(on);
            info!("Bedlight changed to: {}", if on { "ON" } else { "OFF" });
        }
    }

    fn set_indicators<P: OutputPins>(&mut self, vehicle: &VehicleState, io: &mut P) {
        let parked = vehicle.system_ready && vehicle.is_parked;
        if self.state.parked_indicator != parked {
            self.state.parked_indicator = parked;
            io.write_parked_indicator(parked);
            debug!("Parked indicator: {}", parked);
        }

        let unlocked = vehicle.system_ready && vehicle.is_unlocked;
        if self.state.unlocked_indicator != unlocked {
            self.state.unlocked_indicator = unlocked;
            io.write_unlocked_indicator(unlocked);
            debug!("Unlocked indicator: {}", unlocked);
        }

        if self.state.ready_indicator != vehicle.system_ready {
            self.state.ready_indicator = vehicle.system_ready;
            io.write_ready_indicator(vehicle.system_ready);
            debug!("Ready indicator: {}", vehicle.system_ready);
        }
    }

    fn activate_release<P: OutputPins>(&mut self, now: Timestamp, io: &mut P) {
        if self.state.release_output {
            return;
        }

        self.state.release_output = true;
        self.state.release_output_started_at = now;
        self.state.release_activations = self.state.release_activations.wrapping_add(1);
        io.write_release_output(true);
        info!("Toolbox opener activated for {} ms", self.release_duration_ms);
    }

    fn deactivate_release<P: OutputPins>(
        &mut self,
        reason: ShutoffReason,
        now: Timestamp,
        io: &mut P,
    ) {
        if !self.state.release_output {
            return;
        }

        self.state.release_output = false;
        self.state.last_release_shutoff = Some(reason);
        io.write_release_output(false);
        info!(
            "Toolbox opener deactivated ({:?}) after {} ms",
            reason,
            elapsed_ms(now, self.state.release_output_started_at)
        );
    }

    /// Drives every output low, e.g. before the host powers down.
    pub fn shutdown<P: OutputPins>(&mut self, now: Timestamp, io: &mut P) {
        self.deactivate_release(ShutoffReason::Shutdown, now, io);
        self.set_bedlight(false, io);

        let idle = VehicleState::default();
        self.set_indicators(&idle, io);
        self.release_rule_was_met = false;
    }

    pub fn release_remaining_ms(&self, now: Timestamp) -> u32 {
        if !self.state.release_output {
            return 0;
        }
        self.release_duration_ms
            .saturating_sub(elapsed_ms(now, self.state.release_output_started_at))
    }

    pub fn get_state(&self) -> &ActuatorState {
        &self.state
    }

    pub fn button_state(&self) -> &ButtonState {
        self.button.get_state()
    }

    pub fn button_mut(&mut self) -> &mut ButtonTracker {
        &mut self.button
    }
}

impl Default for ActuationController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{OutputChannel, SimulatedIo};

    fn ready_parked_unlocked() -> VehicleState {
        VehicleState {
            system_ready: true,
            is_parked: true,
            is_unlocked: true,
            ..VehicleState::default()
        }
    }

    #[test]
    fn test_rule_requires_all_three() {
        let mut vehicle = ready_parked_unlocked();
        assert!(release_conditions_met(&vehicle));

        vehicle.system_ready = false;
        assert!(!release_conditions_met(&vehicle));

        vehicle = ready_parked_unlocked();
        vehicle.is_parked = false;
        assert!(!release_conditions_met(&vehicle));

        vehicle = ready_parked_unlocked();
        vehicle.is_unlocked = false;
        assert!(!release_conditions_met(&vehicle));
    }

    #[test]
    fn test_release_times_out_and_stays_off() {
        let mut controller = ActuationController::new();
        let mut io = SimulatedIo::new();
        let vehicle = ready_parked_unlocked();

        controller.step(1000, &vehicle, &mut io);
        assert!(controller.get_state().release_output);
        assert_eq!(controller.get_state().release_output_started_at, 1000);

        controller.step(1499, &vehicle, &mut io);
        assert!(controller.get_state().release_output);
        assert_eq!(controller.release_remaining_ms(1499), 1);

        controller.step(1500, &vehicle, &mut io);
        assert!(!controller.get_state().release_output);
        assert_eq!(controller.get_state().last_release_shutoff, Some(ShutoffReason::Timeout));

        // Rule still true: no retrigger without a new rising edge
        controller.step(5000, &vehicle, &mut io);
        assert!(!controller.get_state().release_output);
        assert_eq!(io.write_count(OutputChannel::ReleaseOutput), 2);
        assert_eq!(controller.get_state().release_activations, 1);
    }

    #[test]
    fn test_condition_loss_beats_timer() {
        let mut controller = ActuationController::new();
        let mut io = SimulatedIo::new();
        let mut vehicle = ready_parked_unlocked();

        controller.step(0, &vehicle, &mut io);
        vehicle.is_parked = false;
        controller.step(10, &vehicle, &mut io);

        assert!(!controller.get_state().release_output);
        assert_eq!(
            controller.get_state().last_release_shutoff,
            Some(ShutoffReason::ConditionLost)
        );
    }

    #[test]
    fn test_bedlight_written_only_on_change() {
        let mut controller = ActuationController::new();
        let mut io = SimulatedIo::new();
        let mut vehicle = VehicleState::default();
        vehicle.bedlight_on = true;

        for t in 0..5 {
            controller.step(t, &vehicle, &mut io);
        }
        vehicle.bedlight_on = false;
        controller.step(5, &vehicle, &mut io);

        assert_eq!(io.write_count(OutputChannel::Bedlight), 2);
        assert!(!io.level(OutputChannel::Bedlight));
    }

    #[test]
    fn test_button_sampled_active_low() {
        let mut controller = ActuationController::new();
        let mut io = SimulatedIo::new();
        let vehicle = VehicleState::default();

        controller.step(0, &vehicle, &mut io);
        assert!(!controller.get_state().button_input);

        io.press_button();
        controller.step(10, &vehicle, &mut io);
        assert!(controller.get_state().button_input);
    }

    #[test]
    fn test_shutdown_drops_everything() {
        let mut controller = ActuationController::new();
        let mut io = SimulatedIo::new();
        let mut vehicle = ready_parked_unlocked();
        vehicle.bedlight_on = true;

        controller.step(0, &vehicle, &mut io);
        controller.shutdown(100, &mut io);

        let state = controller.get_state();
        assert!(!state.release_output);
        assert!(!state.bedlight);
        assert!(!state.ready_indicator);
        assert_eq!(state.last_release_shutoff, Some(ShutoffReason::Shutdown));
        assert!(!io.level(OutputChannel::ReleaseOutput));
        assert!(!io.level(OutputChannel::ParkedIndicator));
    }
}
