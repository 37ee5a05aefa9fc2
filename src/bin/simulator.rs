use bedlink::codec::{Payload, SignalField};
use bedlink::config::ControllerConfig;
use bedlink::frame::Frame;
use bedlink::hal::{SimulatedClock, SimulatedIo, Timestamp};
use bedlink::messages::battery::BATTERY_SOC;
use bedlink::messages::lamp::{PUDLAMP_OFF, PUDLAMP_ON, PUDLAMP_RAMP_DOWN, PUD_LAMP_REQUEST};
use bedlink::messages::locking::{VEH_LOCK_ALL, VEH_LOCK_STATUS, VEH_UNLOCK_ALL};
use bedlink::messages::powertrain::{TRNPRKSTS_OUT_OF_PARK, TRNPRKSTS_PARK, TRN_PRK_SYS_STATUS};
use bedlink::messages::{
    BATTERY_MGMT_3_ID, BCM_LAMP_STAT_ID, LOCKING_SYSTEMS_2_ID, POWERTRAIN_DATA_10_ID,
};
use bedlink::Controller;
use clap::{App, Arg};
use colored::*;
use heapless::spsc::{Producer, Queue};
use std::time::Duration;
use tokio::time;
use tracing::{error, info, warn, Level};

const DEFAULT_PERIOD_MS: &str = "10";
const DEFAULT_DURATION_MS: &str = "3000";
const FRAME_QUEUE_SIZE: usize = 32;
/// Unrelated traffic mixed into every bus tick.
const NOISE_FRAME_ID: u16 = 0x202;

#[derive(Debug, Clone, Copy)]
enum BusEvent {
    Lamp(u8),
    Lock(u8),
    Park(u8),
    BusOff,
    PressButton,
    ReleaseButton,
}

/// What the simulated vehicle is currently broadcasting.
#[derive(Debug, Clone, Copy)]
struct VehicleModel {
    lamp: u8,
    lock: u8,
    park: u8,
    battery_soc: u8,
    bus_alive: bool,
}

impl VehicleModel {
    fn new() -> Self {
        Self {
            lamp: PUDLAMP_OFF,
            lock: VEH_LOCK_ALL,
            park: TRNPRKSTS_PARK,
            battery_soc: 78,
            bus_alive: true,
        }
    }

    fn frames(&self, now: Timestamp) -> [Frame; 5] {
        let encode = |field: SignalField, value: u8| -> Payload {
            let mut payload = [0u8; 8];
            field.set(&mut payload, u64::from(value));
            payload
        };

        [
            Frame::new(BCM_LAMP_STAT_ID, encode(PUD_LAMP_REQUEST, self.lamp), now),
            Frame::new(LOCKING_SYSTEMS_2_ID, encode(VEH_LOCK_STATUS, self.lock), now),
            Frame::new(POWERTRAIN_DATA_10_ID, encode(TRN_PRK_SYS_STATUS, self.park), now),
            Frame::new(BATTERY_MGMT_3_ID, encode(BATTERY_SOC, self.battery_soc), now),
            Frame::new(NOISE_FRAME_ID, [0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 0], now),
        ]
    }
}

fn scenario_events(name: &str) -> Vec<(Timestamp, BusEvent)> {
    match name {
        "unlock" => vec![
            (500, BusEvent::Lock(VEH_UNLOCK_ALL)),
            (600, BusEvent::Lamp(PUDLAMP_ON)),
            (900, BusEvent::PressButton),
            (1100, BusEvent::ReleaseButton),
            (2000, BusEvent::Lamp(PUDLAMP_RAMP_DOWN)),
            (2500, BusEvent::Lock(VEH_LOCK_ALL)),
        ],
        "drive-away" => vec![
            (500, BusEvent::Lock(VEH_UNLOCK_ALL)),
            (700, BusEvent::Park(TRNPRKSTS_OUT_OF_PARK)),
            (1500, BusEvent::Park(TRNPRKSTS_PARK)),
        ],
        "bus-off" => vec![
            (300, BusEvent::Lock(VEH_UNLOCK_ALL)),
            (1000, BusEvent::BusOff),
        ],
        _ => Vec::new(),
    }
}

/// Timing used when no `--config` is given. The bus-off scenario shrinks
/// the readiness and watchdog windows so their expiry fits in a short run.
fn scenario_config(name: &str) -> ControllerConfig {
    match name {
        "bus-off" => ControllerConfig {
            readiness_timeout_ms: 1000,
            bus_silence_timeout_ms: 800,
            not_ready_timeout_ms: 1500,
            watchdog_interval_ms: 200,
            ..ControllerConfig::default()
        },
        _ => ControllerConfig::default(),
    }
}

fn apply_event(event: BusEvent, model: &mut VehicleModel, io: &mut SimulatedIo) {
    match event {
        BusEvent::Lamp(raw) => model.lamp = raw,
        BusEvent::Lock(raw) => model.lock = raw,
        BusEvent::Park(raw) => model.park = raw,
        BusEvent::BusOff => model.bus_alive = false,
        BusEvent::PressButton => io.press_button(),
        BusEvent::ReleaseButton => io.release_button(),
    }
    info!("Scenario event: {:?}", event);
}

/// Pushes one tick of bus traffic. Returns how many frames did not fit.
fn broadcast(
    model: &VehicleModel,
    now: Timestamp,
    producer: &mut Producer<'_, Frame, FRAME_QUEUE_SIZE>,
) -> u32 {
    if !model.bus_alive {
        return 0;
    }

    let mut dropped = 0;
    for frame in model.frames(now) {
        if producer.enqueue(frame).is_err() {
            warn!("Frame queue full, dropping 0x{:03X}", frame.id);
            dropped += 1;
        }
    }
    dropped
}

fn print_status(json: &str) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(json) else {
        return;
    };

    let flag = |on: bool, label: &str| {
        if on {
            label.bright_green().bold()
        } else {
            label.bright_black()
        }
    };
    let vehicle = &value["vehicle"];
    let actuators = &value["actuators"];
    let watchdog = if value["health"]["watchdog_triggered"].as_bool().unwrap_or(false) {
        "WATCHDOG".bright_red().bold()
    } else {
        "healthy".green()
    };

    println!(
        "{:>7}ms  {}  {}  {}  {}  {}  {}  soc {:>3}%",
        value["timestamp"].as_u64().unwrap_or(0),
        flag(vehicle["system_ready"].as_bool().unwrap_or(false), "READY"),
        flag(vehicle["is_parked"].as_bool().unwrap_or(false), "PARK"),
        flag(vehicle["is_unlocked"].as_bool().unwrap_or(false), "UNLOCK"),
        flag(actuators["bedlight"].as_bool().unwrap_or(false), "BEDLIGHT"),
        flag(actuators["release_output"].as_bool().unwrap_or(false), "RELEASE"),
        watchdog,
        vehicle["battery_soc"]["current"].as_u64().unwrap_or(0),
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("bedlink-sim")
        .version("0.1.0")
        .about("Drives the bedlink controller through scripted vehicle scenarios")
        .arg(
            Arg::with_name("scenario")
                .short("s")
                .long("scenario")
                .value_name("NAME")
                .help("Vehicle scenario to replay")
                .takes_value(true)
                .possible_values(&["unlock", "drive-away", "bus-off"])
                .default_value("unlock"),
        )
        .arg(
            Arg::with_name("period")
                .short("p")
                .long("period")
                .value_name("MS")
                .help("Cycle period in milliseconds")
                .takes_value(true)
                .default_value(DEFAULT_PERIOD_MS)
                .validator(|v| match v.parse::<u32>() {
                    Ok(ms) if ms > 0 => Ok(()),
                    _ => Err("Period must be a positive number of milliseconds".into()),
                }),
        )
        .arg(
            Arg::with_name("duration")
                .short("d")
                .long("duration")
                .value_name("MS")
                .help("Simulated run time in milliseconds")
                .takes_value(true)
                .default_value(DEFAULT_DURATION_MS)
                .validator(|v| match v.parse::<u32>() {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Duration must be a number of milliseconds".into()),
                }),
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("JSON controller configuration")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Telemetry output format")
                .takes_value(true)
                .possible_values(&["json", "table"])
                .default_value("table"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable debug logging"),
        )
        .get_matches();

    let level = if matches.is_present("verbose") { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let scenario = matches.value_of("scenario").unwrap_or("unlock");
    let config = match matches.value_of("config") {
        Some(path) => ControllerConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => scenario_config(scenario),
    };
    let period_ms: u32 = matches.value_of("period").unwrap_or(DEFAULT_PERIOD_MS).parse()?;
    let duration_ms: u32 = matches
        .value_of("duration")
        .unwrap_or(DEFAULT_DURATION_MS)
        .parse()?;
    let json_output = matches.value_of("format") == Some("json");

    println!(
        "{}",
        format!("bedlink simulator: scenario '{}'", scenario)
            .bright_blue()
            .bold()
    );

    let mut controller =
        Controller::with_config(config, SimulatedIo::new(), SimulatedClock::new(0));
    controller.start();

    let mut queue: Queue<Frame, FRAME_QUEUE_SIZE> = Queue::new();
    let (mut producer, mut consumer) = queue.split();

    let mut model = VehicleModel::new();
    let mut events = scenario_events(scenario).into_iter().peekable();
    let mut interval = time::interval(Duration::from_millis(u64::from(period_ms)));

    while controller.now() < duration_ms {
        interval.tick().await;
        let now = controller.now();

        while let Some((_, event)) = events.next_if(|(at, _)| *at <= now) {
            apply_event(event, &mut model, controller.io_mut());
        }

        let dropped = broadcast(&model, now, &mut producer);
        if dropped > 0 {
            controller.record_dropped_frames(dropped);
        }

        match controller.update_from(&mut consumer) {
            Ok(Some(telemetry)) => {
                if json_output {
                    println!("{}", telemetry);
                } else {
                    print_status(&telemetry);
                }
            }
            Ok(None) => {}
            Err(e) => {
                error!("Controller error: {}", e);
                break;
            }
        }

        controller.clock().advance(period_ms);
    }

    controller.stop();

    let stats = controller.get_bus_stats();
    println!(
        "{} {} cycles, {} frames seen, {} recognized, {} rejected, {} dropped, \
         {} release activations, {} watchdog trips",
        "done:".bright_green().bold(),
        stats.cycles,
        stats.frames_seen,
        stats.frames_recognized,
        stats.parse_rejections,
        stats.frames_dropped,
        controller.get_actuator_state().release_activations,
        controller.get_health_state().trigger_count,
    );

    Ok(())
}
