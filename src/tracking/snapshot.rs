use crate::tesla_api::{Vehicle, VehicleConfig, VehicleData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write;
use strum_macros::Display;

/// Tesla reports speed in mph, CoT wants m/s.
pub(crate) const MPH_TO_MS: f64 = 0.44704;

/// Gear selector position as reported by the drive state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ShiftState {
    P,
    D,
    R,
    N,
}

impl ShiftState {
    fn from_code(code: &str) -> Option<ShiftState> {
        match code {
            "P" => Some(ShiftState::P),
            "D" => Some(ShiftState::D),
            "R" => Some(ShiftState::R),
            "N" => Some(ShiftState::N),
            _ => None,
        }
    }
}

/// One point-in-time (or dead-reckoned) description of a vehicle.
///
/// Immutable once extracted; the dead-reckoning task derives new values via
/// [`VehicleSnapshot::at_position`]. Serializable because the last valid
/// snapshot doubles as the persisted position record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    uid: String,
    display_name: String,
    vehicle_model: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    elevation: Option<f64>,
    speed: Option<f64>,
    heading: f64,
    shift_state: Option<ShiftState>,
    battery_level: i64,
    battery_range: Option<f64>,
    charging_state: Option<String>,
    charge_limit_soc: i64,
    minutes_to_full_charge: i64,
    time_to_full_charge: f64,
    charge_port_door_open: bool,
    sentry_mode: bool,
    locked: Option<bool>,
    is_climate_on: bool,
    fd_window: i64,
    fp_window: i64,
    rd_window: i64,
    rp_window: i64,
    ft: i64,
    rt: i64,
    autopilot_state: Option<i64>,
    timestamp: DateTime<Utc>,
    dead_reckoned: bool,
}

impl VehicleSnapshot {
    /// Extracts the tracked state from a raw telemetry payload. Absent
    /// fields fall back to the same defaults the encoder documents.
    pub fn from_data(data: &VehicleData, vehicle: &Vehicle) -> VehicleSnapshot {
        let drive = data.drive_state();
        let charge = data.charge_state();
        let state = data.vehicle_state();
        let climate = data.climate_state();
        VehicleSnapshot {
            uid: derive_uid(vehicle.id()),
            display_name: vehicle.display_name().to_string(),
            vehicle_model: model_label(data.vehicle_config()),
            latitude: drive.and_then(|d| d.latitude()),
            longitude: drive.and_then(|d| d.longitude()),
            elevation: drive.and_then(|d| d.elevation()),
            speed: drive.and_then(|d| d.speed()),
            heading: drive.and_then(|d| d.heading()).unwrap_or(0.0),
            shift_state: drive.and_then(|d| d.shift_state()).and_then(ShiftState::from_code),
            battery_level: charge.and_then(|c| c.battery_level()).unwrap_or(0),
            battery_range: charge.and_then(|c| c.battery_range()),
            charging_state: charge.and_then(|c| c.charging_state()).map(String::from),
            charge_limit_soc: charge.and_then(|c| c.charge_limit_soc()).unwrap_or(80),
            minutes_to_full_charge: charge.and_then(|c| c.minutes_to_full_charge()).unwrap_or(0),
            time_to_full_charge: charge.and_then(|c| c.time_to_full_charge()).unwrap_or(0.0),
            charge_port_door_open: charge.and_then(|c| c.charge_port_door_open()).unwrap_or(false),
            sentry_mode: state.and_then(|s| s.sentry_mode()).unwrap_or(false),
            locked: state.and_then(|s| s.locked()),
            is_climate_on: climate.and_then(|c| c.is_climate_on()).unwrap_or(false),
            fd_window: state.and_then(|s| s.fd_window()).unwrap_or(0),
            fp_window: state.and_then(|s| s.fp_window()).unwrap_or(0),
            rd_window: state.and_then(|s| s.rd_window()).unwrap_or(0),
            rp_window: state.and_then(|s| s.rp_window()).unwrap_or(0),
            ft: state.and_then(|s| s.ft()).unwrap_or(0),
            rt: state.and_then(|s| s.rt()).unwrap_or(0),
            autopilot_state: state.and_then(|s| s.autopilot_state()),
            timestamp: Utc::now(),
            dead_reckoned: false,
        }
    }

    /// Derives a dead-reckoned snapshot at the given coordinates.
    pub fn at_position(&self, latitude: f64, longitude: f64) -> VehicleSnapshot {
        let mut snapshot = self.clone();
        snapshot.latitude = Some(latitude);
        snapshot.longitude = Some(longitude);
        snapshot.timestamp = Utc::now();
        snapshot.dead_reckoned = true;
        snapshot
    }

    /// Validated coordinates. A snapshot only has a fix when latitude and
    /// longitude are both present and inside their WGS84 ranges.
    pub fn fix(&self) -> Option<(f64, f64)> {
        let (latitude, longitude) = (self.latitude?, self.longitude?);
        if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) {
            Some((latitude, longitude))
        } else {
            None
        }
    }

    pub fn uid(&self) -> &str { self.uid.as_str() }
    pub fn display_name(&self) -> &str { self.display_name.as_str() }
    pub fn vehicle_model(&self) -> &str { self.vehicle_model.as_str() }
    pub fn latitude(&self) -> Option<f64> { self.latitude }
    pub fn longitude(&self) -> Option<f64> { self.longitude }
    pub fn elevation(&self) -> Option<f64> { self.elevation }
    pub fn speed(&self) -> Option<f64> { self.speed }
    pub fn heading(&self) -> f64 { self.heading }
    pub fn shift_state(&self) -> Option<ShiftState> { self.shift_state }
    pub fn battery_level(&self) -> i64 { self.battery_level }
    pub fn battery_range(&self) -> Option<f64> { self.battery_range }
    pub fn charging_state(&self) -> Option<&str> { self.charging_state.as_deref() }
    pub fn charge_limit_soc(&self) -> i64 { self.charge_limit_soc }
    pub fn minutes_to_full_charge(&self) -> i64 { self.minutes_to_full_charge }
    pub fn time_to_full_charge(&self) -> f64 { self.time_to_full_charge }
    pub fn charge_port_door_open(&self) -> bool { self.charge_port_door_open }
    pub fn sentry_mode(&self) -> bool { self.sentry_mode }
    pub fn locked(&self) -> Option<bool> { self.locked }
    pub fn is_climate_on(&self) -> bool { self.is_climate_on }
    pub fn autopilot_state(&self) -> Option<i64> { self.autopilot_state }
    pub fn timestamp(&self) -> DateTime<Utc> { self.timestamp }
    pub fn dead_reckoned(&self) -> bool { self.dead_reckoned }

    pub fn is_moving(&self) -> bool { self.speed.unwrap_or(0.0) > 0.0 }

    pub fn in_drive_gear(&self) -> bool {
        matches!(self.shift_state, Some(ShiftState::D | ShiftState::R))
    }

    /// Parked, or gear unknown (a sleeping vehicle reports no gear).
    pub fn is_parked(&self) -> bool { matches!(self.shift_state, Some(ShiftState::P) | None) }

    /// True while a charge session is in progress; "Disconnected" and
    /// "Complete" are idle states.
    pub fn charge_session_active(&self) -> bool {
        self.charging_state
            .as_deref()
            .is_some_and(|state| state != "Disconnected" && state != "Complete")
    }

    /// Position codes of every open window, in fixed FD/FP/RD/RP order.
    pub fn open_windows(&self) -> Vec<&'static str> {
        let mut open = Vec::new();
        if self.fd_window > 0 {
            open.push("FD");
        }
        if self.fp_window > 0 {
            open.push("FP");
        }
        if self.rd_window > 0 {
            open.push("RD");
        }
        if self.rp_window > 0 {
            open.push("RP");
        }
        open
    }

    pub fn frunk_open(&self) -> bool { self.ft > 0 }
    pub fn trunk_open(&self) -> bool { self.rt > 0 }
}

/// Stable anonymized entity id: `TESLA-` plus the first four digest bytes of
/// the vehicle identifier.
fn derive_uid(vehicle_id: &str) -> String {
    let digest = Sha256::digest(vehicle_id.as_bytes());
    let mut uid = String::from("TESLA-");
    for byte in &digest[..4] {
        let _ = write!(uid, "{byte:02x}");
    }
    uid
}

/// Human model string from the vehicle config, e.g. "2024 Model Y
/// Performance". Unknown car types pass through verbatim.
fn model_label(config: Option<&VehicleConfig>) -> String {
    let Some(config) = config else {
        return String::from("Vehicle");
    };
    let car_type = config.car_type().unwrap_or_default();
    let mut label = match car_type.to_lowercase().as_str() {
        "models" => String::from("Model S"),
        "modelx" => String::from("Model X"),
        "model3" => String::from("Model 3"),
        "modely" => String::from("Model Y"),
        "cybertruck" => String::from("Cybertruck"),
        "" => String::from("Vehicle"),
        _ => String::from(car_type),
    };
    if let Some(trim) = config.trim_badging().filter(|t| !t.is_empty()) {
        let variant = if trim.to_lowercase().starts_with('p') {
            String::from("Performance")
        } else if trim.to_lowercase().starts_with('l') {
            String::from("Long Range")
        } else {
            trim.to_uppercase()
        };
        label = format!("{label} {variant}");
    }
    if let Some(year) = config.year() {
        label = format!("{year} {label}");
    }
    label
}
