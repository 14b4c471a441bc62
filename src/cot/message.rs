use crate::tracking::{MPH_TO_MS, VehicleSnapshot};
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt::Write;

/// Friendly ground equipment vehicle, civilian.
const COT_TYPE: &str = "a-f-G-E-V-C";
/// How long a receiver should trust a reported position.
const STALE_WINDOW: TimeDelta = TimeDelta::minutes(5);
/// Circular error while the GPS is actively tracking (speed above 1 mph).
const CE_MOVING: &str = "5.0";
/// Circular error for a stationary fix.
const CE_STATIONARY: &str = "12.5";
/// Vertical uncertainty is unknown; TAK treats this sentinel as "no value".
const LE_UNKNOWN: &str = "9999999.0";
const TEAM_COLOR: &str = "Cyan";
const TAK_ENDPOINT: &str = "*:-1:stcp";
const XML_DECLARATION: &str = "<?xml version='1.0' encoding='UTF-8' standalone='yes'?>";

/// Generates one Cursor on Target event document for a vehicle snapshot.
///
/// Pure apart from the embedded wall clock: absent optional fields degrade to
/// documented defaults, nothing here fails. Callers guarantee coordinate
/// presence before transmitting (see `CotForwarder`).
pub fn generate_cot_packet(snapshot: &VehicleSnapshot) -> String {
    let now = Utc::now();
    let time = format_cot_time(now);
    let stale = format_cot_time(now + STALE_WINDOW);
    let speed_mph = snapshot.speed().unwrap_or(0.0);
    let ce = if speed_mph > 1.0 { CE_MOVING } else { CE_STATIONARY };
    let callsign = escape_xml(snapshot.display_name());

    let mut xml = String::with_capacity(1024);
    let _ = write!(
        xml,
        "<event version=\"2.0\" uid=\"{}\" type=\"{COT_TYPE}\" how=\"m-g\" access=\"Undefined\" \
         time=\"{time}\" start=\"{time}\" stale=\"{stale}\">",
        escape_xml(snapshot.uid())
    );
    let _ = write!(
        xml,
        "<point lat=\"{}\" lon=\"{}\" hae=\"{:.3}\" ce=\"{ce}\" le=\"{LE_UNKNOWN}\" />",
        snapshot.latitude().unwrap_or(0.0),
        snapshot.longitude().unwrap_or(0.0),
        snapshot.elevation().unwrap_or(0.0)
    );
    xml.push_str("<detail>");
    let _ = write!(
        xml,
        "<takv os=\"35\" version=\"{} (OnTarget)\" device=\"TESLA {}\" platform=\"ATAK-CIV\" />",
        env!("CARGO_PKG_VERSION"),
        escape_xml(snapshot.vehicle_model())
    );
    let _ = write!(xml, "<contact endpoint=\"{TAK_ENDPOINT}\" callsign=\"{callsign}\" />");
    let _ = write!(xml, "<uid Droid=\"{callsign}\" />");
    xml.push_str("<precisionlocation altsrc=\"GPS\" geopointsrc=\"GPS\" />");
    let _ = write!(xml, "<__group role=\"Team Member\" name=\"{TEAM_COLOR}\" />");
    let _ = write!(xml, "<status battery=\"{}\" />", snapshot.battery_level());
    let _ = write!(
        xml,
        "<track course=\"{:.8}\" speed=\"{:.8}\" />",
        snapshot.heading(),
        speed_mph * MPH_TO_MS
    );
    let _ = write!(xml, "<remarks>{}</remarks>", escape_xml(&build_remarks(snapshot)));
    xml.push_str("</detail></event>");
    xml
}

/// Frames an event document for TAK protocol version 0: the XML declaration
/// directly followed by the document, one contiguous UTF-8 write.
pub fn format_cot_for_tak(cot_xml: &str) -> Vec<u8> {
    let mut framed = String::with_capacity(XML_DECLARATION.len() + cot_xml.len());
    framed.push_str(XML_DECLARATION);
    framed.push_str(cot_xml);
    framed.into_bytes()
}

fn format_cot_time(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Single status line shown under the track in TAK clients. Segment order
/// matters: model, gear, range, charging, assist state, climate, then the
/// parked security block.
pub(super) fn build_remarks(snapshot: &VehicleSnapshot) -> String {
    let mut remarks = format!("Tesla {}", snapshot.vehicle_model());

    match snapshot.shift_state() {
        Some(state) => {
            let _ = write!(remarks, " | Gear: {state}");
        }
        // Gear unknown usually means the vehicle is parked and asleep.
        None => remarks.push_str(" | Gear: P"),
    }

    if let Some(range) = snapshot.battery_range() {
        let _ = write!(remarks, " | Range: {range:.0} mi");
    }

    if snapshot.charge_session_active() {
        let _ = write!(remarks, " | {}", snapshot.charging_state().unwrap_or_default());
        let soc = snapshot.charge_limit_soc();
        let minutes = snapshot.minutes_to_full_charge();
        let hours_left = snapshot.time_to_full_charge();
        if minutes > 0 {
            let (hours, mins) = (minutes / 60, minutes % 60);
            if hours > 0 {
                let _ = write!(remarks, " ({hours}h {mins}m to {soc}%)");
            } else {
                let _ = write!(remarks, " ({mins}m to {soc}%)");
            }
        } else if hours_left > 0.0 {
            if hours_left >= 1.0 {
                let _ = write!(remarks, " ({hours_left:.1}h to {soc}%)");
            } else {
                #[allow(clippy::cast_possible_truncation)]
                let mins = (hours_left * 60.0) as i64;
                let _ = write!(remarks, " ({mins}m to {soc}%)");
            }
        }
        if snapshot.charge_port_door_open() {
            remarks.push_str(" Port Open");
        }
    }

    if snapshot.in_drive_gear() {
        match snapshot.autopilot_state() {
            Some(2) => remarks.push_str(" | AUTOPILOT ACTIVE"),
            Some(3) => remarks.push_str(" | FSD ACTIVE"),
            Some(1) => remarks.push_str(" | AUTOPILOT AVAILABLE"),
            _ => {}
        }
    }

    if snapshot.is_climate_on() {
        remarks.push_str(" | Climate: ON");
    }

    if snapshot.is_parked() {
        let _ = write!(remarks, " | Sentry: {}", if snapshot.sentry_mode() { "ON" } else { "OFF" });
        if let Some(locked) = snapshot.locked() {
            let _ =
                write!(remarks, " | Doors: {}", if locked { "Locked" } else { "Unlocked" });
        }
        let windows = snapshot.open_windows();
        if !windows.is_empty() {
            let _ = write!(remarks, " | WINDOWS OPEN: {}", windows.join(","));
        }
        if snapshot.frunk_open() {
            remarks.push_str(" | FRUNK OPEN");
        }
        if snapshot.trunk_open() {
            remarks.push_str(" | TRUNK OPEN");
        }
    }

    remarks
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
