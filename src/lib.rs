//! # bedlink
//!
//! Decision core for a truck-bed controller that listens to the vehicle CAN
//! bus, decodes a handful of body and powertrain signals, and drives the bed
//! light and a self-timed toolbox release output.
//!
//! ## Quick Start
//!
//! ```rust
//! use bedlink::{Controller, Frame};
//! use bedlink::hal::{SimulatedClock, SimulatedIo};
//!
//! let mut controller = Controller::new(SimulatedIo::new(), SimulatedClock::new(0));
//! controller.start();
//!
//! // Locking_Systems_2_FD1 reporting UNLOCK_ALL
//! let frame = Frame::new(0x331, [0x00, 0x0F, 0x00, 0x00, 0x05, 0xC7, 0x44, 0x10], 0);
//! controller.queue_frame(frame).unwrap();
//!
//! controller.update().unwrap();
//! assert!(controller.get_vehicle_state().is_unlocked);
//! ```
//!
//! ## Architecture
//!
//! Data flows strictly downward, one cycle at a time:
//!
//! - [`codec`] - DBC-style bit field extraction on 8-byte payloads
//! - [`messages`] - one parser per recognized message identifier
//! - [`state`] - signal aggregation, freshness and readiness
//! - [`actuation`] - activation rule and edge-triggered outputs
//! - [`controller`] - the cycle orchestrator
//! - [`hal`] - clock and pin traits, plus simulated implementations
//!
//! Supporting modules: [`button`] debounces the toolbox input, [`config`]
//! holds the tunable windows, [`health`] watches for a silent bus or lost
//! readiness, [`telemetry`] builds JSON snapshots.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::new_without_default)]

pub mod actuation;
pub mod button;
pub mod codec;
pub mod config;
pub mod controller;
pub mod frame;
pub mod hal;
pub mod health;
pub mod messages;
pub mod state;
pub mod telemetry;

// Re-export main public types for convenience
pub use actuation::{ActuationController, ActuatorState};
pub use config::ControllerConfig;
pub use controller::{Controller, ControllerError};
pub use frame::Frame;
pub use state::{VehicleState, VehicleStateManager};
