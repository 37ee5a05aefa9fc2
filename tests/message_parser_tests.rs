use bedlink::frame::Frame;
use bedlink::messages::*;

const LAMP_ON_PAYLOAD: [u8; 8] = [0x40, 0xC4, 0x00, 0x00, 0x00, 0x00, 0x81, 0x00];
const LOCK_ALL_PAYLOAD: [u8; 8] = [0x00, 0x0F, 0x00, 0x00, 0x02, 0xC7, 0x44, 0x10];
const UNLOCK_ALL_PAYLOAD: [u8; 8] = [0x00, 0x0F, 0x00, 0x00, 0x05, 0xC7, 0x44, 0x10];
const PARK_PAYLOAD: [u8; 8] = [0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00];
const BATTERY_PAYLOAD: [u8; 8] = [0x32, 0x00, 0x41, 0x57, 0x40, 0xD9, 0x88, 0xC8];

#[test]
fn test_reference_lock_payloads() {
    let locked = LockingStatus::parse(&Frame::new(LOCKING_SYSTEMS_2_ID, LOCK_ALL_PAYLOAD, 0));
    assert!(locked.valid);
    assert_eq!(locked.vehicle_lock_status, 1);
    assert_eq!(locked.status(), LockStatus::Locked);

    let unlocked = LockingStatus::parse(&Frame::new(LOCKING_SYSTEMS_2_ID, UNLOCK_ALL_PAYLOAD, 0));
    assert!(unlocked.valid);
    assert_eq!(unlocked.vehicle_lock_status, 2);
    assert_eq!(unlocked.status(), LockStatus::UnlockedAll);
}

#[test]
fn test_reference_lamp_park_and_battery_payloads() {
    let lamp = LampStatus::parse(&Frame::new(BCM_LAMP_STAT_ID, LAMP_ON_PAYLOAD, 0));
    assert!(lamp.valid);
    assert_eq!(lamp.request(), LampRequest::On);

    let park = PowertrainStatus::parse(&Frame::new(POWERTRAIN_DATA_10_ID, PARK_PAYLOAD, 0));
    assert!(park.valid);
    assert_eq!(park.status(), ParkStatus::Park);

    let battery = BatteryStatus::parse(&Frame::new(BATTERY_MGMT_3_ID, BATTERY_PAYLOAD, 0));
    assert!(battery.valid);
    assert_eq!(battery.battery_soc, 65);
}

#[test]
fn test_wrong_identifier_is_invalid() {
    let status = LockingStatus::parse(&Frame::new(BCM_LAMP_STAT_ID, UNLOCK_ALL_PAYLOAD, 0));
    assert!(!status.valid);
    assert_eq!(status.vehicle_lock_status, locking::VEH_LOCK_UNKNOWN);
}

#[test]
fn test_wrong_length_is_invalid() {
    let short = Frame::from_slice(LOCKING_SYSTEMS_2_ID, &UNLOCK_ALL_PAYLOAD[..7], 0);
    assert!(!LockingStatus::parse(&short).valid);

    let mut long = Frame::new(BATTERY_MGMT_3_ID, BATTERY_PAYLOAD, 0);
    long.length = 12;
    assert!(!BatteryStatus::parse(&long).valid);
}

#[test]
fn test_oversized_driver_buffer_is_invalid() {
    let mut buffer = [0u8; 12];
    buffer[..8].copy_from_slice(&UNLOCK_ALL_PAYLOAD);

    let frame = Frame::from_slice(LOCKING_SYSTEMS_2_ID, &buffer, 0);
    assert_eq!(frame.length, 12);

    let status = LockingStatus::parse(&frame);
    assert!(!status.valid);
    assert_eq!(status.vehicle_lock_status, locking::VEH_LOCK_UNKNOWN);
    assert!(!parse(&frame).unwrap().is_valid());
}

#[test]
fn test_router_skips_unrecognized_ids() {
    assert!(parse(&Frame::new(0x202, LAMP_ON_PAYLOAD, 0)).is_none());

    let routed = parse(&Frame::new(POWERTRAIN_DATA_10_ID, PARK_PAYLOAD, 7)).unwrap();
    assert_eq!(routed.kind(), MessageKind::PowertrainStatus);
    assert!(routed.is_valid());
    match routed {
        ParsedMessage::Powertrain(status) => assert_eq!(status.received_at, 7),
        other => panic!("unexpected route: {:?}", other),
    }
}

#[test]
fn test_router_reports_malformed_recognized_frame() {
    let short = Frame::from_slice(BCM_LAMP_STAT_ID, &LAMP_ON_PAYLOAD[..4], 0);
    let routed = parse(&short).unwrap();
    assert_eq!(routed.kind(), MessageKind::LampStatus);
    assert!(!routed.is_valid());
}

#[test]
fn test_message_kind_round_trips_ids() {
    for id in [BCM_LAMP_STAT_ID, LOCKING_SYSTEMS_2_ID, POWERTRAIN_DATA_10_ID, BATTERY_MGMT_3_ID] {
        let kind = MessageKind::from_id(id).unwrap();
        assert_eq!(kind.id(), id);
        assert!(is_recognized(id));
    }
    assert_eq!(MessageKind::LockingStatus.name(), "Locking_Systems_2_FD1");
}
