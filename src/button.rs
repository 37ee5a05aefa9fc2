use crate::config::{BUTTON_DEBOUNCE_MS, BUTTON_DOUBLE_CLICK_MS, BUTTON_HOLD_THRESHOLD_MS};
use crate::hal::{elapsed_ms, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ButtonState {
    /// Debounced level, `true` while pressed.
    pub pressed: bool,
    /// Last sampled level before debouncing.
    pub raw: bool,
    pub held: bool,
    pub hold_duration_ms: u32,
    pub press_count: u32,
    pub last_change: Timestamp,
    pub last_press: Timestamp,
    pub last_release: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct PendingEvents {
    pressed: bool,
    released: bool,
    double_clicked: bool,
}

/// Debounces the toolbox button and turns its level into press, release,
/// hold and double-click events.
#[derive(Debug)]
pub struct ButtonTracker {
    state: ButtonState,
    events: PendingEvents,
    debounce_ms: u32,
    hold_threshold_ms: u32,
    double_click_ms: u32,
}

impl ButtonTracker {
    pub fn new() -> Self {
        Self::with_timing(BUTTON_DEBOUNCE_MS, BUTTON_HOLD_THRESHOLD_MS, BUTTON_DOUBLE_CLICK_MS)
    }

    pub fn with_timing(debounce_ms: u32, hold_threshold_ms: u32, double_click_ms: u32) -> Self {
        Self {
            state: ButtonState::default(),
            events: PendingEvents::default(),
            debounce_ms,
            hold_threshold_ms,
            double_click_ms,
        }
    }

    /// Feeds one sample; `pressed` is the already-translated logical level.
    pub fn update(&mut self, pressed: bool, now: Timestamp) {
        self.state.raw = pressed;
        let was_pressed = self.state.pressed;

        if pressed == self.state.pressed {
            // Stable: restart the debounce window
            self.state.last_change = now;
        } else if elapsed_ms(now, self.state.last_change) >= self.debounce_ms {
            self.state.pressed = pressed;
            self.state.last_change = now;

            if pressed && !was_pressed {
                self.on_press(now);
            } else if !pressed && was_pressed {
                self.on_release(now);
            }
        }

        if self.state.pressed {
            self.state.hold_duration_ms = elapsed_ms(now, self.state.last_press);
            if self.state.hold_duration_ms >= self.hold_threshold_ms && !self.state.held {
                self.state.held = true;
                info!("Toolbox button is being held ({} ms)", self.state.hold_duration_ms);
            }
        } else {
            self.state.hold_duration_ms = 0;
            self.state.held = false;
        }
    }

    fn on_press(&mut self, now: Timestamp) {
        self.events.pressed = true;

        let since_last_press = elapsed_ms(now, self.state.last_press);
        if self.state.press_count > 0
            && since_last_press <= self.double_click_ms
            && since_last_press > self.debounce_ms
        {
            self.events.double_clicked = true;
            info!("Toolbox button double-clicked ({} ms between presses)", since_last_press);
        }

        self.state.last_press = now;
        self.state.press_count = self.state.press_count.wrapping_add(1);
        self.state.hold_duration_ms = 0;
        info!("Toolbox button pressed (count: {})", self.state.press_count);
    }

    fn on_release(&mut self, now: Timestamp) {
        self.events.released = true;
        self.state.last_release = now;
        self.state.held = false;
        info!(
            "Toolbox button released (held for {} ms)",
            elapsed_ms(now, self.state.last_press)
        );
    }

    /// Returns and clears the pending press event.
    pub fn take_pressed(&mut self) -> bool {
        core::mem::take(&mut self.events.pressed)
    }

    pub fn take_released(&mut self) -> bool {
        core::mem::take(&mut self.events.released)
    }

    pub fn take_double_clicked(&mut self) -> bool {
        core::mem::take(&mut self.events.double_clicked)
    }

    pub fn reset_press_count(&mut self) {
        info!("Button press count reset (was {})", self.state.press_count);
        self.state.press_count = 0;
    }

    pub fn get_state(&self) -> &ButtonState {
        &self.state
    }
}

impl Default for ButtonTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Holds `pressed` from `start` to `end` inclusive, sampling every 10 ms.
    fn hold(tracker: &mut ButtonTracker, pressed: bool, start: Timestamp, end: Timestamp) {
        let mut t = start;
        while t <= end {
            tracker.update(pressed, t);
            t += 10;
        }
    }

    #[test]
    fn test_bounce_shorter_than_debounce_ignored() {
        let mut tracker = ButtonTracker::new();
        hold(&mut tracker, false, 0, 100);
        hold(&mut tracker, true, 110, 140);
        hold(&mut tracker, false, 150, 300);

        assert!(!tracker.take_pressed());
        assert_eq!(tracker.get_state().press_count, 0);
    }

    #[test]
    fn test_press_and_release_events() {
        let mut tracker = ButtonTracker::new();
        hold(&mut tracker, false, 0, 100);
        hold(&mut tracker, true, 110, 300);

        assert!(tracker.get_state().pressed);
        assert!(tracker.take_pressed());
        assert!(!tracker.take_pressed());

        hold(&mut tracker, false, 310, 500);
        assert!(!tracker.get_state().pressed);
        assert!(tracker.take_released());
        assert_eq!(tracker.get_state().press_count, 1);
    }

    #[test]
    fn test_hold_detection() {
        let mut tracker = ButtonTracker::new();
        hold(&mut tracker, false, 0, 100);
        hold(&mut tracker, true, 110, 800);
        assert!(!tracker.get_state().held);

        hold(&mut tracker, true, 810, 1500);
        assert!(tracker.get_state().held);
        assert!(tracker.get_state().hold_duration_ms >= BUTTON_HOLD_THRESHOLD_MS);
    }

    #[test]
    fn test_double_click() {
        let mut tracker = ButtonTracker::new();
        hold(&mut tracker, false, 0, 100);
        hold(&mut tracker, true, 110, 200);
        hold(&mut tracker, false, 210, 300);
        hold(&mut tracker, true, 310, 400);

        assert_eq!(tracker.get_state().press_count, 2);
        assert!(tracker.take_double_clicked());
    }

    #[test]
    fn test_slow_presses_are_not_double_click() {
        let mut tracker = ButtonTracker::new();
        hold(&mut tracker, false, 0, 100);
        hold(&mut tracker, true, 110, 200);
        hold(&mut tracker, false, 210, 800);
        hold(&mut tracker, true, 810, 900);

        assert_eq!(tracker.get_state().press_count, 2);
        assert!(!tracker.take_double_clicked());
    }
}
