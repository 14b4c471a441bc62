/// Full telemetry payload for one vehicle, as returned by the `vehicle_data`
/// endpoint. Every group is optional: the API omits groups the vehicle did
/// not report, and individual fields come and go between firmware versions.
///
/// The structs are `Serialize` as well so the capture sink can write them
/// back out for offline analysis.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct VehicleData {
    vin: Option<String>,
    drive_state: Option<DriveState>,
    charge_state: Option<ChargeState>,
    vehicle_state: Option<VehicleState>,
    climate_state: Option<ClimateState>,
    vehicle_config: Option<VehicleConfig>,
}

impl VehicleData {
    pub fn vin(&self) -> Option<&str> { self.vin.as_deref() }
    pub fn drive_state(&self) -> Option<&DriveState> { self.drive_state.as_ref() }
    pub fn charge_state(&self) -> Option<&ChargeState> { self.charge_state.as_ref() }
    pub fn vehicle_state(&self) -> Option<&VehicleState> { self.vehicle_state.as_ref() }
    pub fn climate_state(&self) -> Option<&ClimateState> { self.climate_state.as_ref() }
    pub fn vehicle_config(&self) -> Option<&VehicleConfig> { self.vehicle_config.as_ref() }
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct DriveState {
    latitude: Option<f64>,
    longitude: Option<f64>,
    elevation: Option<f64>,
    speed: Option<f64>,
    heading: Option<f64>,
    shift_state: Option<String>,
}

impl DriveState {
    pub fn latitude(&self) -> Option<f64> { self.latitude }
    pub fn longitude(&self) -> Option<f64> { self.longitude }
    pub fn elevation(&self) -> Option<f64> { self.elevation }
    pub fn speed(&self) -> Option<f64> { self.speed }
    pub fn heading(&self) -> Option<f64> { self.heading }
    pub fn shift_state(&self) -> Option<&str> { self.shift_state.as_deref() }
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct ChargeState {
    battery_level: Option<i64>,
    battery_range: Option<f64>,
    charging_state: Option<String>,
    charge_limit_soc: Option<i64>,
    minutes_to_full_charge: Option<i64>,
    time_to_full_charge: Option<f64>,
    charge_port_door_open: Option<bool>,
}

impl ChargeState {
    pub fn battery_level(&self) -> Option<i64> { self.battery_level }
    pub fn battery_range(&self) -> Option<f64> { self.battery_range }
    pub fn charging_state(&self) -> Option<&str> { self.charging_state.as_deref() }
    pub fn charge_limit_soc(&self) -> Option<i64> { self.charge_limit_soc }
    pub fn minutes_to_full_charge(&self) -> Option<i64> { self.minutes_to_full_charge }
    pub fn time_to_full_charge(&self) -> Option<f64> { self.time_to_full_charge }
    pub fn charge_port_door_open(&self) -> Option<bool> { self.charge_port_door_open }
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct VehicleState {
    vehicle_name: Option<String>,
    sentry_mode: Option<bool>,
    locked: Option<bool>,
    fd_window: Option<i64>,
    fp_window: Option<i64>,
    rd_window: Option<i64>,
    rp_window: Option<i64>,
    ft: Option<i64>,
    rt: Option<i64>,
    autopilot_state: Option<i64>,
}

impl VehicleState {
    pub fn vehicle_name(&self) -> Option<&str> { self.vehicle_name.as_deref() }
    pub fn sentry_mode(&self) -> Option<bool> { self.sentry_mode }
    pub fn locked(&self) -> Option<bool> { self.locked }
    pub fn fd_window(&self) -> Option<i64> { self.fd_window }
    pub fn fp_window(&self) -> Option<i64> { self.fp_window }
    pub fn rd_window(&self) -> Option<i64> { self.rd_window }
    pub fn rp_window(&self) -> Option<i64> { self.rp_window }
    pub fn ft(&self) -> Option<i64> { self.ft }
    pub fn rt(&self) -> Option<i64> { self.rt }
    pub fn autopilot_state(&self) -> Option<i64> { self.autopilot_state }
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct ClimateState {
    is_climate_on: Option<bool>,
}

impl ClimateState {
    pub fn is_climate_on(&self) -> Option<bool> { self.is_climate_on }
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct VehicleConfig {
    car_type: Option<String>,
    year: Option<i64>,
    trim_badging: Option<String>,
}

impl VehicleConfig {
    pub fn car_type(&self) -> Option<&str> { self.car_type.as_deref() }
    pub fn year(&self) -> Option<i64> { self.year }
    pub fn trim_badging(&self) -> Option<&str> { self.trim_badging.as_deref() }
}
