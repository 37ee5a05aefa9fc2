use crate::actuation::{ActuationController, ActuatorState};
use crate::button::ButtonState;
use crate::config::ControllerConfig;
use crate::frame::Frame;
use crate::hal::{ButtonInput, Clock, OutputPins, Timestamp};
use crate::health::{HealthMonitor, HealthState};
use crate::messages::{self, is_recognized};
use crate::state::{VehicleState, VehicleStateManager};
use crate::telemetry::{BusStats, TelemetryCollector, TelemetryError, TelemetrySnapshot};
use heapless::spsc::{Consumer, Queue};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const MAX_FRAME_QUEUE_SIZE: usize = 64;

type FrameQueue = Queue<Frame, MAX_FRAME_QUEUE_SIZE>;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Frame queue full")]
    FrameQueueFull,
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Runs the frame-to-actuator pipeline one cycle at a time.
///
/// A cycle drains the pending frames through classification, parsing and
/// aggregation, recomputes readiness once, runs the watchdog, then steps the
/// actuators once.
pub struct Controller<P, C> {
    vehicle: VehicleStateManager,
    actuation: ActuationController,
    health: HealthMonitor,
    telemetry: TelemetryCollector,
    frame_queue: FrameQueue,
    stats: BusStats,
    config: ControllerConfig,
    running: bool,

    io: P,
    clock: C,
}

impl<P, C> Controller<P, C>
where
    P: OutputPins + ButtonInput,
    C: Clock,
{
    pub fn new(io: P, clock: C) -> Self {
        Self::with_config(ControllerConfig::default(), io, clock)
    }

    /// An invalid configuration is replaced by the defaults.
    pub fn with_config(config: ControllerConfig, io: P, clock: C) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!("{}, falling back to default configuration", e);
                ControllerConfig::default()
            }
        };

        Self {
            vehicle: VehicleStateManager::with_readiness_timeout(config.readiness_timeout_ms),
            actuation: ActuationController::from_config(&config),
            health: HealthMonitor::from_config(&config),
            telemetry: TelemetryCollector::with_interval(config.telemetry_interval_ms),
            frame_queue: Queue::new(),
            stats: BusStats::default(),
            config,
            running: false,
            io,
            clock,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
        self.health.start(self.clock.now());
        info!(
            "Controller starting (readiness timeout {} ms, release duration {} ms)",
            self.config.readiness_timeout_ms, self.config.release_duration_ms
        );
    }

    /// Stops cycling and drives every output low.
    pub fn stop(&mut self) {
        self.running = false;
        let now = self.clock.now();
        self.actuation.shutdown(now, &mut self.io);
        info!("Controller stopped, outputs released");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Hands a received frame to the next cycle.
    pub fn queue_frame(&mut self, frame: Frame) -> Result<(), ControllerError> {
        self.frame_queue.enqueue(frame).map_err(|_| {
            self.stats.frames_dropped = self.stats.frames_dropped.wrapping_add(1);
            ControllerError::FrameQueueFull
        })
    }

    /// Counts frames the host had to drop before they reached the controller,
    /// e.g. when the producer half of a split queue was full.
    pub fn record_dropped_frames(&mut self, count: u32) {
        self.stats.frames_dropped = self.stats.frames_dropped.wrapping_add(count);
    }

    /// One processing cycle over the internal queue. Returns a telemetry
    /// snapshot when one is due.
    pub fn update(&mut self) -> Result<Option<String>, ControllerError> {
        if !self.running {
            return Ok(None);
        }

        while let Some(frame) = self.frame_queue.dequeue() {
            self.process_frame(&frame);
        }

        self.finish_cycle()
    }

    /// Like [`update`](Self::update), for hosts that feed frames through the
    /// consumer half of a split queue (e.g. from a receive interrupt).
    pub fn update_from<const N: usize>(
        &mut self,
        frames: &mut Consumer<'_, Frame, N>,
    ) -> Result<Option<String>, ControllerError> {
        if !self.running {
            return Ok(None);
        }

        while let Some(frame) = frames.dequeue() {
            self.process_frame(&frame);
        }

        self.finish_cycle()
    }

    fn process_frame(&mut self, frame: &Frame) {
        self.stats.frames_seen = self.stats.frames_seen.wrapping_add(1);
        self.stats.last_bus_activity = Some(frame.received_at);

        if !is_recognized(frame.id) {
            return;
        }
        self.stats.frames_recognized = self.stats.frames_recognized.wrapping_add(1);

        let Some(message) = messages::parse(frame) else {
            return;
        };

        if !self.vehicle.apply(&message, frame.received_at) {
            self.stats.parse_rejections = self.stats.parse_rejections.wrapping_add(1);
            warn!("Failed to parse CAN message ID 0x{:03X}", frame.id);
        }
    }

    fn finish_cycle(&mut self) -> Result<Option<String>, ControllerError> {
        let now = self.clock.now();

        let ready = self.vehicle.recompute_readiness(now);
        self.health.check(now, self.stats.last_bus_activity, ready);
        self.actuation.step(now, self.vehicle.get_state(), &mut self.io);
        self.stats.cycles = self.stats.cycles.wrapping_add(1);

        let telemetry = self.telemetry.collect(now, |sequence_number| TelemetrySnapshot {
            sequence_number,
            timestamp: now,
            vehicle: self.vehicle.get_state().clone(),
            freshness: self.vehicle.freshness(now),
            actuators: self.actuation.get_state().clone(),
            release_remaining_ms: self.actuation.release_remaining_ms(now),
            button: *self.actuation.button_state(),
            bus: self.stats,
            health: *self.health.get_state(),
        })?
        .map(str::to_owned);

        if telemetry.is_some() {
            debug!("Telemetry snapshot {} at {}", self.telemetry.sequence_number(), now);
        }

        Ok(telemetry)
    }

    /// Diagnostic hook: treat every signal as freshly received.
    pub fn reset_timeouts(&mut self) {
        let now = self.clock.now();
        self.vehicle.reset_timeouts(now);
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn get_vehicle_state(&self) -> &VehicleState {
        self.vehicle.get_state()
    }

    pub fn get_actuator_state(&self) -> &ActuatorState {
        self.actuation.get_state()
    }

    pub fn get_button_state(&self) -> &ButtonState {
        self.actuation.button_state()
    }

    pub fn get_bus_stats(&self) -> &BusStats {
        &self.stats
    }

    pub fn get_health_state(&self) -> &HealthState {
        self.health.get_state()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn pending_frames(&self) -> usize {
        self.frame_queue.len()
    }

    pub fn io(&self) -> &P {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut P {
        &mut self.io
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
