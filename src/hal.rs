//! Hardware boundary: clock, digital outputs and the toolbox button input.
//!
//! The decision core only talks to hardware through these traits so tests
//! and the simulator can substitute [`SimulatedIo`] and [`SimulatedClock`].

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::time::Instant;

/// Milliseconds from a wrapping monotonic counter.
pub type Timestamp = u32;

/// Elapsed time between two timestamps, correct across counter wraparound as
/// long as the real interval is shorter than the wrap period.
#[inline]
pub fn elapsed_ms(now: Timestamp, since: Timestamp) -> u32 {
    now.wrapping_sub(since)
}

pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Digital output setters. Callers only invoke these on a level change.
pub trait OutputPins {
    fn write_bedlight(&mut self, on: bool);
    fn write_release_output(&mut self, on: bool);

    fn write_parked_indicator(&mut self, _on: bool) {}
    fn write_unlocked_indicator(&mut self, _on: bool) {}
    fn write_ready_indicator(&mut self, _on: bool) {}
}

/// Momentary input wired with a pull-up: returns the electrical level, so
/// `false` means the button is pressed.
pub trait ButtonInput {
    fn read_button_level(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputChannel {
    Bedlight,
    ReleaseOutput,
    ParkedIndicator,
    UnlockedIndicator,
    ReadyIndicator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinWrite {
    pub channel: OutputChannel,
    pub level: bool,
}

/// In-memory pins that remember every write.
#[derive(Debug)]
pub struct SimulatedIo {
    levels: [bool; 5],
    writes: Vec<PinWrite>,
    button_level: bool,
}

impl SimulatedIo {
    pub fn new() -> Self {
        Self {
            levels: [false; 5],
            writes: Vec::new(),
            // Pull-up holds the line high while released
            button_level: true,
        }
    }

    pub fn level(&self, channel: OutputChannel) -> bool {
        self.levels[channel as usize]
    }

    pub fn writes(&self) -> &[PinWrite] {
        &self.writes
    }

    pub fn write_count(&self, channel: OutputChannel) -> usize {
        self.writes.iter().filter(|w| w.channel == channel).count()
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    pub fn press_button(&mut self) {
        self.button_level = false;
    }

    pub fn release_button(&mut self) {
        self.button_level = true;
    }

    fn record(&mut self, channel: OutputChannel, level: bool) {
        self.levels[channel as usize] = level;
        self.writes.push(PinWrite { channel, level });
    }
}

impl Default for SimulatedIo {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputPins for SimulatedIo {
    fn write_bedlight(&mut self, on: bool) {
        self.record(OutputChannel::Bedlight, on);
    }

    fn write_release_output(&mut self, on: bool) {
        self.record(OutputChannel::ReleaseOutput, on);
    }

    fn write_parked_indicator(&mut self, on: bool) {
        self.record(OutputChannel::ParkedIndicator, on);
    }

    fn write_unlocked_indicator(&mut self, on: bool) {
        self.record(OutputChannel::UnlockedIndicator, on);
    }

    fn write_ready_indicator(&mut self, on: bool) {
        self.record(OutputChannel::ReadyIndicator, on);
    }
}

impl ButtonInput for SimulatedIo {
    fn read_button_level(&mut self) -> bool {
        self.button_level
    }
}

/// Clock driven by hand, for deterministic tests.
#[derive(Debug, Default)]
pub struct SimulatedClock {
    now: Cell<Timestamp>,
}

impl SimulatedClock {
    pub fn new(start: Timestamp) -> Self {
        Self { now: Cell::new(start) }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

/// Wall-clock milliseconds since construction, truncated to the counter width.
#[derive(Debug)]
pub struct MonotonicClock {
    start: Instant,
    offset: Timestamp,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::with_offset(0)
    }

    /// Starts counting from `offset`; useful to exercise wraparound.
    pub fn with_offset(offset: Timestamp) -> Self {
        Self {
            start: Instant::now(),
            offset,
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        (self.start.elapsed().as_millis() as u32).wrapping_add(self.offset)
    }
}
