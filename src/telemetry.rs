use crate::actuation::ActuatorState;
use crate::button::ButtonState;
use crate::config::TELEMETRY_INTERVAL_MS;
use crate::hal::{elapsed_ms, Timestamp};
use crate::health::HealthState;
use crate::state::{SignalFreshness, VehicleState};
use arrayvec::ArrayString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_TELEMETRY_SIZE: usize = 2048;

pub type TelemetryBuffer = ArrayString<MAX_TELEMETRY_SIZE>;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Telemetry serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Telemetry snapshot of {0} bytes exceeds buffer")]
    MessageTooLarge(usize),
}

/// Bus traffic counters kept by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BusStats {
    pub frames_seen: u32,
    pub frames_recognized: u32,
    pub parse_rejections: u32,
    pub frames_dropped: u32,
    pub last_bus_activity: Option<Timestamp>,
    pub cycles: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub sequence_number: u32,
    pub timestamp: Timestamp,
    pub vehicle: VehicleState,
    pub freshness: SignalFreshness,
    pub actuators: ActuatorState,
    pub release_remaining_ms: u32,
    pub button: ButtonState,
    pub bus: BusStats,
    pub health: HealthState,
}

/// Rate-limited JSON snapshots for logging and telemetry sinks.
#[derive(Debug)]
pub struct TelemetryCollector {
    sequence_number: u32,
    last_emit: Option<Timestamp>,
    interval_ms: u32,
    buffer: TelemetryBuffer,
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self::with_interval(TELEMETRY_INTERVAL_MS)
    }

    pub fn with_interval(interval_ms: u32) -> Self {
        Self {
            sequence_number: 0,
            last_emit: None,
            interval_ms,
            buffer: ArrayString::new(),
        }
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        match self.last_emit {
            Some(last) => elapsed_ms(now, last) >= self.interval_ms,
            None => true,
        }
    }

    /// Serializes the snapshot if the interval has elapsed; `Ok(None)` otherwise.
    /// The snapshot is only built when due.
    pub fn collect<F>(&mut self, now: Timestamp, build: F) -> Result<Option<&str>, TelemetryError>
    where
        F: FnOnce(u32) -> TelemetrySnapshot,
    {
        if !self.is_due(now) {
            return Ok(None);
        }

        let sequence_number = self.sequence_number.wrapping_add(1);
        let snapshot = build(sequence_number);
        self.serialize(&snapshot)?;

        self.sequence_number = sequence_number;
        self.last_emit = Some(now);
        Ok(Some(self.buffer.as_str()))
    }

    pub fn serialize(&mut self, snapshot: &TelemetrySnapshot) -> Result<&str, TelemetryError> {
        self.buffer.clear();

        let json = serde_json::to_string(snapshot)?;
        if json.len() > MAX_TELEMETRY_SIZE {
            return Err(TelemetryError::MessageTooLarge(json.len()));
        }
        self.buffer.push_str(&json);

        Ok(self.buffer.as_str())
    }

    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(sequence_number: u32, timestamp: Timestamp) -> TelemetrySnapshot {
        TelemetrySnapshot {
            sequence_number,
            timestamp,
            vehicle: VehicleState::default(),
            freshness: SignalFreshness::default(),
            actuators: ActuatorState::default(),
            release_remaining_ms: 0,
            button: ButtonState::default(),
            bus: BusStats::default(),
            health: HealthState::default(),
        }
    }

    #[test]
    fn test_first_collect_emits() {
        let mut collector = TelemetryCollector::with_interval(1000);
        let json = collector.collect(5, |seq| snapshot(seq, 5)).unwrap();
        assert!(json.is_some());
        assert!(json.unwrap().contains("\"sequence_number\":1"));
    }

    #[test]
    fn test_interval_respected() {
        let mut collector = TelemetryCollector::with_interval(1000);
        collector.collect(0, |seq| snapshot(seq, 0)).unwrap();

        assert!(collector.collect(999, |seq| snapshot(seq, 999)).unwrap().is_none());
        assert!(collector.collect(1000, |seq| snapshot(seq, 1000)).unwrap().is_some());
        assert_eq!(collector.sequence_number(), 2);
    }

    #[test]
    fn test_snapshot_fits_buffer() {
        let mut collector = TelemetryCollector::new();
        let json = collector.serialize(&snapshot(1, 0)).unwrap();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["vehicle"]["system_ready"], false);
        assert_eq!(value["actuators"]["release_output"], false);
    }
}
