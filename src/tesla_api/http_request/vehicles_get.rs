use crate::tesla_api::http_response::Vehicle;
use crate::tesla_api::request_common::{HTTPRequestMethod, TeslaRequestType};

#[derive(Debug)]
pub struct VehiclesRequest {}

impl TeslaRequestType for VehiclesRequest {
    type Response = Vec<Vehicle>;
    fn endpoint(&self) -> String { String::from("/api/1/vehicles") }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Get }
}
