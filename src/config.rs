use crate::hal::Timestamp;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;
use thiserror::Error;

/// Any signal refreshed within this window keeps the system ready.
pub const READINESS_TIMEOUT_MS: u32 = 600_000;
/// Maximum on-time of the toolbox release output.
pub const RELEASE_DURATION_MS: u32 = 500;
pub const BUTTON_DEBOUNCE_MS: u32 = 50;
pub const BUTTON_HOLD_THRESHOLD_MS: u32 = 1000;
pub const BUTTON_DOUBLE_CLICK_MS: u32 = 300;
pub const TELEMETRY_INTERVAL_MS: u32 = 1000;
/// No frame of any kind for longer than this trips the watchdog.
pub const BUS_SILENCE_TIMEOUT_MS: u32 = 30_000;
/// Not ready for longer than this trips the watchdog.
pub const NOT_READY_TIMEOUT_MS: u32 = 60_000;
pub const WATCHDOG_INTERVAL_MS: u32 = 60_000;

/// Windows must stay far below the counter wrap for wrapping subtraction to hold.
pub const MAX_WINDOW_MS: u32 = Timestamp::MAX / 4;

const_assert!(READINESS_TIMEOUT_MS < MAX_WINDOW_MS);
const_assert!(RELEASE_DURATION_MS > 0);
const_assert!(RELEASE_DURATION_MS < READINESS_TIMEOUT_MS);
const_assert!(BUTTON_DEBOUNCE_MS < BUTTON_DOUBLE_CLICK_MS);
const_assert!(NOT_READY_TIMEOUT_MS < MAX_WINDOW_MS);
const_assert!(BUS_SILENCE_TIMEOUT_MS < MAX_WINDOW_MS);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub readiness_timeout_ms: u32,
    pub release_duration_ms: u32,
    pub button_debounce_ms: u32,
    pub button_hold_threshold_ms: u32,
    pub button_double_click_ms: u32,
    pub telemetry_interval_ms: u32,
    pub bus_silence_timeout_ms: u32,
    pub not_ready_timeout_ms: u32,
    pub watchdog_interval_ms: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            readiness_timeout_ms: READINESS_TIMEOUT_MS,
            release_duration_ms: RELEASE_DURATION_MS,
            button_debounce_ms: BUTTON_DEBOUNCE_MS,
            button_hold_threshold_ms: BUTTON_HOLD_THRESHOLD_MS,
            button_double_click_ms: BUTTON_DOUBLE_CLICK_MS,
            telemetry_interval_ms: TELEMETRY_INTERVAL_MS,
            bus_silence_timeout_ms: BUS_SILENCE_TIMEOUT_MS,
            not_ready_timeout_ms: NOT_READY_TIMEOUT_MS,
            watchdog_interval_ms: WATCHDOG_INTERVAL_MS,
        }
    }
}

impl ControllerConfig {
    /// Parses a JSON document; omitted fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let windows = [
            ("readiness_timeout_ms", self.readiness_timeout_ms),
            ("release_duration_ms", self.release_duration_ms),
            ("button_hold_threshold_ms", self.button_hold_threshold_ms),
            ("button_double_click_ms", self.button_double_click_ms),
            ("bus_silence_timeout_ms", self.bus_silence_timeout_ms),
            ("not_ready_timeout_ms", self.not_ready_timeout_ms),
            ("watchdog_interval_ms", self.watchdog_interval_ms),
        ];

        for (field, value) in windows {
            if value == 0 {
                return Err(ConfigError::Invalid { field, reason: "must be non-zero" });
            }
            if value >= MAX_WINDOW_MS {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be far below the timestamp wrap period",
                });
            }
        }

        if self.button_debounce_ms >= self.button_double_click_ms {
            return Err(ConfigError::Invalid {
                field: "button_debounce_ms",
                reason: "must be shorter than button_double_click_ms",
            });
        }

        Ok(())
    }
}
