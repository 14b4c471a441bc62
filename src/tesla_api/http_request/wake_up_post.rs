use crate::tesla_api::http_response::Vehicle;
use crate::tesla_api::request_common::{HTTPRequestMethod, TeslaRequestType};

#[derive(Debug)]
pub struct WakeUpRequest<'a> {
    pub id: &'a str,
}

impl TeslaRequestType for WakeUpRequest<'_> {
    type Response = Vehicle;
    fn endpoint(&self) -> String { format!("/api/1/vehicles/{}/wake_up", self.id) }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Post }
}
