mod vehicle_data;
mod vehicles;

pub use vehicle_data::{
    ChargeState, ClimateState, DriveState, VehicleConfig, VehicleData, VehicleState,
};
pub use vehicles::Vehicle;
