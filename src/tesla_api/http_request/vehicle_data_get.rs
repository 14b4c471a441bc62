use crate::tesla_api::http_response::VehicleData;
use crate::tesla_api::request_common::{HTTPRequestMethod, TeslaRequestType};

/// Location data must be requested explicitly since the owner API stopped
/// including coordinates in the plain `vehicle_data` payload.
const TELEMETRY_ENDPOINTS: &str =
    "location_data%3Bdrive_state%3Bcharge_state%3Bvehicle_state%3Bclimate_state%3Bvehicle_config";

#[derive(Debug)]
pub struct VehicleDataRequest<'a> {
    pub id: &'a str,
}

impl TeslaRequestType for VehicleDataRequest<'_> {
    type Response = VehicleData;
    fn endpoint(&self) -> String {
        format!("/api/1/vehicles/{}/vehicle_data?endpoints={TELEMETRY_ENDPOINTS}", self.id)
    }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Get }
}
