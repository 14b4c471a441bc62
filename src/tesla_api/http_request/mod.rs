mod vehicle_data_get;
mod vehicles_get;
mod wake_up_post;

pub use vehicle_data_get::VehicleDataRequest;
pub use vehicles_get::VehiclesRequest;
pub use wake_up_post::WakeUpRequest;
