mod capture;
mod dead_reckoning;
mod position_store;
mod session;
mod snapshot;
mod supervisor;
#[cfg(test)]
mod tests;

pub(crate) use snapshot::MPH_TO_MS;
pub use snapshot::{ShiftState, VehicleSnapshot};
pub use supervisor::{StartupError, Supervisor};
