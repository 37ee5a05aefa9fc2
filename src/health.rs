//! System watchdog: flags a silent bus or a controller that has not been
//! ready for too long. It only reports; the pipeline keeps running.

use crate::config::{
    ControllerConfig, BUS_SILENCE_TIMEOUT_MS, NOT_READY_TIMEOUT_MS, WATCHDOG_INTERVAL_MS,
};
use crate::hal::{elapsed_ms, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealthState {
    pub watchdog_triggered: bool,
    pub bus_silent: bool,
    pub not_ready_too_long: bool,
    /// Last cycle that ended with the system ready.
    pub last_ready_at: Option<Timestamp>,
    pub last_check: Option<Timestamp>,
    pub trigger_count: u32,
}

#[derive(Debug)]
pub struct HealthMonitor {
    state: HealthState,
    /// Baseline for both checks until the first frame or ready cycle.
    started_at: Timestamp,
    bus_silence_timeout_ms: u32,
    not_ready_timeout_ms: u32,
    check_interval_ms: u32,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::with_timing(BUS_SILENCE_TIMEOUT_MS, NOT_READY_TIMEOUT_MS, WATCHDOG_INTERVAL_MS)
    }

    pub fn with_timing(
        bus_silence_timeout_ms: u32,
        not_ready_timeout_ms: u32,
        check_interval_ms: u32,
    ) -> Self {
        Self {
            state: HealthState::default(),
            started_at: 0,
            bus_silence_timeout_ms,
            not_ready_timeout_ms,
            check_interval_ms,
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::with_timing(
            config.bus_silence_timeout_ms,
            config.not_ready_timeout_ms,
            config.watchdog_interval_ms,
        )
    }

    /// Restarts both timeouts from `now` and clears any pending trigger.
    pub fn start(&mut self, now: Timestamp) {
        self.started_at = now;
        self.state = HealthState {
            trigger_count: self.state.trigger_count,
            ..HealthState::default()
        };
    }

    /// Runs once per cycle. Readiness is tracked every call; the timeout
    /// checks run at most once per check interval. Returns whether the
    /// watchdog is currently triggered.
    pub fn check(
        &mut self,
        now: Timestamp,
        last_bus_activity: Option<Timestamp>,
        system_ready: bool,
    ) -> bool {
        if system_ready {
            self.state.last_ready_at = Some(now);
        }

        let due = match self.state.last_check {
            Some(last) => elapsed_ms(now, last) >= self.check_interval_ms,
            None => true,
        };
        if !due {
            return self.state.watchdog_triggered;
        }
        self.state.last_check = Some(now);

        let bus_quiet_ms = elapsed_ms(now, last_bus_activity.unwrap_or(self.started_at));
        let not_ready_ms = elapsed_ms(now, self.state.last_ready_at.unwrap_or(self.started_at));

        self.state.bus_silent = bus_quiet_ms > self.bus_silence_timeout_ms;
        self.state.not_ready_too_long = not_ready_ms > self.not_ready_timeout_ms;
        let healthy = !self.state.bus_silent && !self.state.not_ready_too_long;

        if !healthy && !self.state.watchdog_triggered {
            self.state.watchdog_triggered = true;
            self.state.trigger_count = self.state.trigger_count.wrapping_add(1);
            warn!(
                "Watchdog triggered: no CAN activity for {} ms, not ready for {} ms",
                bus_quiet_ms, not_ready_ms
            );
        } else if healthy && self.state.watchdog_triggered {
            self.state.watchdog_triggered = false;
            info!("Watchdog cleared, system healthy again");
        } else if healthy {
            debug!("Watchdog: system healthy");
        }

        self.state.watchdog_triggered
    }

    pub fn get_state(&self) -> &HealthState {
        &self.state
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_start_trips_after_bus_timeout() {
        let mut monitor = HealthMonitor::with_timing(30_000, 60_000, 1000);
        monitor.start(0);

        assert!(!monitor.check(0, None, false));
        assert!(!monitor.check(30_000, None, false));
        assert!(monitor.check(31_000, None, false));

        let state = monitor.get_state();
        assert!(state.bus_silent);
        assert!(!state.not_ready_too_long);
        assert_eq!(state.trigger_count, 1);
    }

    #[test]
    fn test_checks_are_rate_limited() {
        let mut monitor = HealthMonitor::with_timing(100, 100, 60_000);
        monitor.start(0);

        assert!(!monitor.check(0, None, false));
        // Well past both timeouts, but the next check is not due yet
        assert!(!monitor.check(59_999, None, false));
        assert!(monitor.check(60_000, None, false));
    }

    #[test]
    fn test_clears_once_traffic_and_readiness_return() {
        let mut monitor = HealthMonitor::with_timing(1000, 2000, 100);
        monitor.start(0);
        assert!(monitor.check(2500, None, false));

        assert!(!monitor.check(2600, Some(2550), true));
        let state = monitor.get_state();
        assert!(!state.bus_silent);
        assert!(!state.not_ready_too_long);
        assert_eq!(state.last_ready_at, Some(2600));
    }

    #[test]
    fn test_not_ready_with_live_bus_trips() {
        let mut monitor = HealthMonitor::with_timing(1000, 2000, 100);
        monitor.start(0);
        monitor.check(0, Some(0), true);

        assert!(!monitor.check(2000, Some(1990), false));
        assert!(monitor.check(2100, Some(2090), false));
        assert!(monitor.get_state().not_ready_too_long);
        assert!(!monitor.get_state().bus_silent);
    }

    #[test]
    fn test_timeouts_survive_counter_wrap() {
        let start = u32::MAX - 500;
        let mut monitor = HealthMonitor::with_timing(1000, 2000, 100);
        monitor.start(start);

        assert!(!monitor.check(start, Some(start), true));
        assert!(!monitor.check(400, Some(300), true));
        assert!(!monitor.get_state().watchdog_triggered);
    }
}
