mod api_client;
mod classify;
mod http_request;
mod http_response;
mod request_common;

pub use api_client::TeslaApiClient;
pub use classify::{PollFailure, classify};
pub use http_request::{VehicleDataRequest, VehiclesRequest, WakeUpRequest};
pub use http_response::{Vehicle, VehicleConfig, VehicleData};
pub use request_common::{ApiError, TeslaRequestType};
