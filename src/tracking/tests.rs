use super::dead_reckoning::advance_position;
use super::position_store::PositionStore;
use super::session::Backoff;
use super::snapshot::{ShiftState, VehicleSnapshot};
use crate::tesla_api::{Vehicle, VehicleData};
use serde_json::json;
use std::time::Duration;

fn snapshot_json() -> serde_json::Value {
    json!({
        "uid": "TESLA-8a2fc310",
        "display_name": "Ghost",
        "vehicle_model": "2024 Model Y Performance",
        "latitude": 40.0,
        "longitude": -74.0,
        "elevation": null,
        "speed": 36.0,
        "heading": 90.0,
        "shift_state": "D",
        "battery_level": 72,
        "battery_range": 188.3,
        "charging_state": "Disconnected",
        "charge_limit_soc": 80,
        "minutes_to_full_charge": 0,
        "time_to_full_charge": 0.0,
        "charge_port_door_open": false,
        "sentry_mode": false,
        "locked": true,
        "is_climate_on": false,
        "fd_window": 0,
        "fp_window": 0,
        "rd_window": 0,
        "rp_window": 0,
        "ft": 0,
        "rt": 0,
        "autopilot_state": null,
        "timestamp": "2026-08-07T12:00:00Z",
        "dead_reckoned": false
    })
}

fn snapshot_with(patch: impl FnOnce(&mut serde_json::Value)) -> VehicleSnapshot {
    let mut value = snapshot_json();
    patch(&mut value);
    serde_json::from_value(value).unwrap()
}

/// Great-circle distance in meters, used to verify extrapolation step sizes.
fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let r = 6_371_000.0;
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * r * a.sqrt().atan2((1.0 - a).sqrt())
}

#[test]
fn test_stationary_step_keeps_position() {
    let (lat, lon) = advance_position(40.0, -74.0, 90.0, 0.0, 1.0);
    assert!((lat - 40.0).abs() < 1e-12);
    assert!((lon - -74.0).abs() < 1e-12);
}

#[test]
fn test_eastward_step_moves_longitude_only() {
    // 36 mph due east for one second is ~16.09 m of travel.
    let (lat, lon) = advance_position(40.0, -74.0, 90.0, 36.0, 1.0);
    assert!((lat - 40.0).abs() < 1e-9, "heading due east must not change latitude");
    assert!(lon > -74.0, "eastward travel must increase longitude");
    let travelled = haversine_m(40.0, -74.0, lat, lon);
    assert!((travelled - 36.0 * 0.44704).abs() < 0.05, "travelled {travelled}m");
}

#[test]
fn test_northward_step_moves_latitude_only() {
    let (lat, lon) = advance_position(40.0, -74.0, 0.0, 36.0, 1.0);
    assert!(lat > 40.0);
    assert!((lon - -74.0).abs() < 1e-9);
}

#[test]
fn test_backoff_doubles_and_caps_on_rate_limit() {
    let mut backoff = Backoff::new();
    for n in 1..=8_u32 {
        backoff.on_rate_limit();
        assert_eq!(backoff.multiplier(), 2_u32.pow(n).min(32));
    }
    backoff.reset();
    assert_eq!(backoff.multiplier(), 1);
}

#[test]
fn test_backoff_growth_on_repeated_errors() {
    let mut backoff = Backoff::new();
    let expected = [2, 3, 5, 8, 12, 16, 16];
    for want in expected {
        backoff.on_repeated_errors();
        assert_eq!(backoff.multiplier(), want);
    }
}

#[test]
fn test_backoff_scales_base_interval() {
    let mut backoff = Backoff::new();
    backoff.on_rate_limit();
    backoff.on_rate_limit();
    assert_eq!(backoff.scaled(Duration::from_secs(10)), Duration::from_secs(40));
}

#[test]
fn test_fix_requires_both_coordinates() {
    assert!(snapshot_with(|_| {}).fix().is_some());
    assert!(snapshot_with(|v| v["latitude"] = json!(null)).fix().is_none());
    assert!(snapshot_with(|v| v["longitude"] = json!(null)).fix().is_none());
}

#[test]
fn test_fix_rejects_out_of_range_coordinates() {
    assert!(snapshot_with(|v| v["latitude"] = json!(95.2)).fix().is_none());
    assert!(snapshot_with(|v| v["longitude"] = json!(-181.0)).fix().is_none());
}

#[test]
fn test_at_position_marks_dead_reckoned() {
    let derived = snapshot_with(|_| {}).at_position(40.001, -73.999);
    assert!(derived.dead_reckoned());
    assert_eq!(derived.fix(), Some((40.001, -73.999)));
    assert_eq!(derived.uid(), "TESLA-8a2fc310");
}

#[tokio::test]
async fn test_position_store_round_trip() {
    let dir = std::env::temp_dir();
    let key = format!("ontarget-test-{}", std::process::id());
    let store = PositionStore::for_vehicle(&dir, &key);
    let snapshot = snapshot_with(|_| {});

    store.save(&snapshot).await;
    let restored = store.load().await.unwrap();
    assert_eq!(restored.fix(), snapshot.fix());
    assert_eq!(restored, snapshot);

    let _ = tokio::fs::remove_file(dir.join(format!("last_position_{key}.json"))).await;
}

#[tokio::test]
async fn test_position_store_missing_file_is_none() {
    let store = PositionStore::for_vehicle(std::env::temp_dir().as_path(), "ontarget-missing");
    assert!(store.load().await.is_none());
}

fn vehicle() -> Vehicle {
    serde_json::from_value(json!({
        "id_s": "1492931982",
        "vin": "5YJYGDEF9MF000000",
        "display_name": "Ghost",
        "state": "online"
    }))
    .unwrap()
}

fn vehicle_data() -> VehicleData {
    serde_json::from_value(json!({
        "vin": "5YJYGDEF9MF000000",
        "drive_state": {
            "latitude": 40.713, "longitude": -74.006, "speed": 25.0,
            "heading": 178.0, "shift_state": "D"
        },
        "charge_state": {
            "battery_level": 64, "battery_range": 201.5, "charging_state": "Disconnected",
            "charge_limit_soc": 80, "minutes_to_full_charge": 0, "time_to_full_charge": 0.0,
            "charge_port_door_open": false
        },
        "vehicle_state": {
            "vehicle_name": "Ghost", "sentry_mode": false, "locked": true,
            "fd_window": 0, "fp_window": 0, "rd_window": 0, "rp_window": 0,
            "ft": 0, "rt": 0, "autopilot_state": 2
        },
        "climate_state": { "is_climate_on": true },
        "vehicle_config": { "car_type": "modely", "year": 2024, "trim_badging": "p74d" }
    }))
    .unwrap()
}

#[test]
fn test_snapshot_extraction() {
    let snapshot = VehicleSnapshot::from_data(&vehicle_data(), &vehicle());
    assert!(snapshot.uid().starts_with("TESLA-"));
    assert_eq!(snapshot.uid().len(), "TESLA-".len() + 8);
    assert_eq!(snapshot.display_name(), "Ghost");
    assert_eq!(snapshot.vehicle_model(), "2024 Model Y Performance");
    assert_eq!(snapshot.fix(), Some((40.713, -74.006)));
    assert_eq!(snapshot.shift_state(), Some(ShiftState::D));
    assert_eq!(snapshot.battery_level(), 64);
    assert_eq!(snapshot.autopilot_state(), Some(2));
    assert!(snapshot.is_climate_on());
    assert!(snapshot.is_moving());
    assert!(snapshot.in_drive_gear());
    assert!(!snapshot.dead_reckoned());
}

#[test]
fn test_snapshot_extraction_defaults() {
    let data: VehicleData = serde_json::from_value(json!({})).unwrap();
    let snapshot = VehicleSnapshot::from_data(&data, &vehicle());
    assert_eq!(snapshot.vehicle_model(), "Vehicle");
    assert!(snapshot.fix().is_none());
    assert_eq!(snapshot.battery_level(), 0);
    assert_eq!(snapshot.charge_limit_soc(), 80);
    assert!(snapshot.shift_state().is_none());
    assert!(snapshot.is_parked());
    assert!(!snapshot.is_moving());
}

#[test]
fn test_uid_is_stable_and_distinct() {
    let first = VehicleSnapshot::from_data(&vehicle_data(), &vehicle());
    let second = VehicleSnapshot::from_data(&vehicle_data(), &vehicle());
    assert_eq!(first.uid(), second.uid());

    let other: Vehicle = serde_json::from_value(json!({
        "id_s": "99", "vin": null, "display_name": "Wraith", "state": "asleep"
    }))
    .unwrap();
    let third = VehicleSnapshot::from_data(&vehicle_data(), &other);
    assert_ne!(first.uid(), third.uid());
    assert!(other.is_asleep());
    assert_eq!(other.record_key(), "99");
}

#[test]
fn test_open_windows_in_position_order() {
    let snapshot = snapshot_with(|v| {
        v["fd_window"] = json!(1);
        v["rp_window"] = json!(2);
    });
    assert_eq!(snapshot.open_windows(), vec!["FD", "RP"]);
}

#[test]
fn test_charge_session_detection() {
    assert!(!snapshot_with(|_| {}).charge_session_active());
    assert!(!snapshot_with(|v| v["charging_state"] = json!("Complete")).charge_session_active());
    assert!(!snapshot_with(|v| v["charging_state"] = json!(null)).charge_session_active());
    assert!(snapshot_with(|v| v["charging_state"] = json!("Charging")).charge_session_active());
    assert!(snapshot_with(|v| v["charging_state"] = json!("Stopped")).charge_session_active());
}
