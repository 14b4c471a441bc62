use super::message::{build_remarks, format_cot_for_tak, generate_cot_packet};
use super::tak_client::TakClient;
use crate::tracking::VehicleSnapshot;
use regex::Regex;
use serde_json::json;
use tokio::io::AsyncReadExt;

fn snapshot_json() -> serde_json::Value {
    json!({
        "uid": "TESLA-8a2fc310",
        "display_name": "Ghost",
        "vehicle_model": "2024 Model Y Performance",
        "latitude": 40.713,
        "longitude": -74.006,
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

#[test]
fn test_packet_structure() {
    let xml = generate_cot_packet(&snapshot_with(|_| {}));
    assert!(xml.starts_with("<event version=\"2.0\" uid=\"TESLA-8a2fc310\""));
    assert!(xml.ends_with("</detail></event>"));
    assert_eq!(xml.matches("<point ").count(), 1);
    assert_eq!(xml.matches("<detail>").count(), 1);
    assert!(xml.contains("type=\"a-f-G-E-V-C\""));
    assert!(xml.contains("how=\"m-g\""));
    assert!(xml.contains("access=\"Undefined\""));
    assert!(xml.contains("lat=\"40.713\""));
    assert!(xml.contains("lon=\"-74.006\""));
    assert!(xml.contains("le=\"9999999.0\""));
    assert!(xml.contains("<contact endpoint=\"*:-1:stcp\" callsign=\"Ghost\" />"));
    assert!(xml.contains("<uid Droid=\"Ghost\" />"));
    assert!(xml.contains("<precisionlocation altsrc=\"GPS\" geopointsrc=\"GPS\" />"));
    assert!(xml.contains("<__group role=\"Team Member\" name=\"Cyan\" />"));
    assert!(xml.contains("<status battery=\"72\" />"));
}

#[test]
fn test_packet_timestamps_millisecond_precision() {
    let xml = generate_cot_packet(&snapshot_with(|_| {}));
    let stamp = Regex::new(r#""\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z""#).unwrap();
    // time, start and stale all carry the same format.
    assert_eq!(stamp.find_iter(&xml).count(), 3);
}

#[test]
fn test_elevation_defaults_to_zero() {
    let xml = generate_cot_packet(&snapshot_with(|_| {}));
    assert!(xml.contains("hae=\"0.000\""));
    let xml = generate_cot_packet(&snapshot_with(|v| v["elevation"] = json!(12.3456)));
    assert!(xml.contains("hae=\"12.346\""));
}

#[test]
fn test_circular_error_tightens_when_moving() {
    let moving = generate_cot_packet(&snapshot_with(|_| {}));
    assert!(moving.contains("ce=\"5.0\""));
    let stationary = generate_cot_packet(&snapshot_with(|v| v["speed"] = json!(0.0)));
    assert!(stationary.contains("ce=\"12.5\""));
    let crawling = generate_cot_packet(&snapshot_with(|v| v["speed"] = json!(1.0)));
    assert!(crawling.contains("ce=\"12.5\""));
}

#[test]
fn test_track_converts_speed_to_meters_per_second() {
    let xml = generate_cot_packet(&snapshot_with(|_| {}));
    assert!(xml.contains("course=\"90.00000000\""));
    assert!(xml.contains("speed=\"16.09344000\""));
}

#[test]
fn test_attribute_escaping() {
    let xml = generate_cot_packet(&snapshot_with(|v| v["display_name"] = json!("Rock & Roll")));
    assert!(xml.contains("callsign=\"Rock &amp; Roll\""));
    assert!(!xml.contains("callsign=\"Rock & Roll\""));
}

#[test]
fn test_remarks_basic_line() {
    let remarks = build_remarks(&snapshot_with(|_| {}));
    assert_eq!(remarks, "Tesla 2024 Model Y Performance | Gear: D | Range: 188 mi");
}

#[test]
fn test_remarks_gear_defaults_to_park() {
    let remarks = build_remarks(&snapshot_with(|v| {
        v["shift_state"] = json!(null);
        v["battery_range"] = json!(null);
    }));
    assert!(remarks.contains(" | Gear: P"));
    // Unknown gear counts as parked, so the security block applies.
    assert!(remarks.contains(" | Sentry: OFF"));
    assert!(remarks.contains(" | Doors: Locked"));
}

#[test]
fn test_remarks_assist_levels_while_driving() {
    let fsd = build_remarks(&snapshot_with(|v| v["autopilot_state"] = json!(3)));
    assert!(fsd.contains("FSD ACTIVE"));
    let active = build_remarks(&snapshot_with(|v| v["autopilot_state"] = json!(2)));
    assert!(active.contains("AUTOPILOT ACTIVE"));
    let available = build_remarks(&snapshot_with(|v| v["autopilot_state"] = json!(1)));
    assert!(available.contains("AUTOPILOT AVAILABLE"));
    // Assist state only matters in a driving gear.
    let parked = build_remarks(&snapshot_with(|v| {
        v["autopilot_state"] = json!(3);
        v["shift_state"] = json!("P");
    }));
    assert!(!parked.contains("FSD ACTIVE"));
}

#[test]
fn test_remarks_parked_security_alerts() {
    let remarks = build_remarks(&snapshot_with(|v| {
        v["shift_state"] = json!("P");
        v["sentry_mode"] = json!(true);
        v["locked"] = json!(false);
        v["fd_window"] = json!(1);
        v["rd_window"] = json!(3);
        v["ft"] = json!(1);
        v["rt"] = json!(255);
    }));
    assert!(remarks.contains("Sentry: ON"));
    assert!(remarks.contains("Doors: Unlocked"));
    assert!(remarks.contains("WINDOWS OPEN: FD,RD"));
    assert!(remarks.contains("FRUNK OPEN"));
    assert!(remarks.contains("TRUNK OPEN"));
}

#[test]
fn test_remarks_charging_minutes_breakdown() {
    let remarks = build_remarks(&snapshot_with(|v| {
        v["charging_state"] = json!("Charging");
        v["minutes_to_full_charge"] = json!(95);
        v["charge_port_door_open"] = json!(true);
    }));
    assert!(remarks.contains(" | Charging (1h 35m to 80%) Port Open"));
}

#[test]
fn test_remarks_charging_hours_fallback() {
    let hours = build_remarks(&snapshot_with(|v| {
        v["charging_state"] = json!("Supercharging");
        v["time_to_full_charge"] = json!(2.5);
    }));
    assert!(hours.contains(" | Supercharging (2.5h to 80%)"));
    let minutes = build_remarks(&snapshot_with(|v| {
        v["charging_state"] = json!("Charging");
        v["time_to_full_charge"] = json!(0.5);
    }));
    assert!(minutes.contains(" | Charging (30m to 80%)"));
}

#[test]
fn test_remarks_climate_indicator() {
    let remarks = build_remarks(&snapshot_with(|v| v["is_climate_on"] = json!(true)));
    assert!(remarks.contains(" | Climate: ON"));
}

#[test]
fn test_format_for_tak_prefixes_declaration() {
    let framed = format_cot_for_tak("<event>x</event>");
    let expected = b"<?xml version='1.0' encoding='UTF-8' standalone='yes'?><event>x</event>";
    assert_eq!(framed, expected);
}

#[test]
fn test_tak_client_rejects_bad_endpoints() {
    assert!(TakClient::new("udp://host:8087").is_err());
    assert!(TakClient::new("tcp://host").is_err());
    assert!(TakClient::new("tcp://:8087").is_err());
    assert!(TakClient::new("tcp://host:notaport").is_err());
    assert!(TakClient::new("tcp://takserver:8087").is_ok());
}

#[tokio::test]
async fn test_tak_client_delivers_bytes() {
    const MESSAGE: &[u8] = b"<?xml version='1.0' encoding='UTF-8' standalone='yes'?><event/>";
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = vec![0_u8; MESSAGE.len()];
        socket.read_exact(&mut received).await.unwrap();
        received
    });

    let client = TakClient::new(&format!("tcp://127.0.0.1:{port}")).unwrap();
    client.send(MESSAGE).await;
    assert!(client.is_connected());
    assert_eq!(server.await.unwrap(), MESSAGE);
}
