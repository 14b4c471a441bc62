use super::snapshot::VehicleSnapshot;
use crate::{error, warn};
use std::path::{Path, PathBuf};

/// Durable single-record cache of the last valid position for one vehicle.
///
/// Best effort only: the write is a plain overwrite (losing one record to a
/// race is acceptable) and an absent or unreadable file just means "no
/// cached position". Once a live sample exists the record is never read
/// again.
pub(super) struct PositionStore {
    path: PathBuf,
}

impl PositionStore {
    pub fn for_vehicle(dir: &Path, record_key: &str) -> PositionStore {
        PositionStore { path: dir.join(format!("last_position_{record_key}.json")) }
    }

    pub async fn load(&self) -> Option<VehicleSnapshot> {
        let raw = tokio::fs::read(&self.path).await.ok()?;
        match serde_json::from_slice(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Ignoring unreadable position record {}: {e}", self.path.display());
                None
            }
        }
    }

    pub async fn save(&self, snapshot: &VehicleSnapshot) {
        match serde_json::to_vec_pretty(snapshot) {
            Ok(raw) => {
                if let Err(e) = tokio::fs::write(&self.path, raw).await {
                    error!("Error saving position to {}: {e}", self.path.display());
                }
            }
            Err(e) => error!("Error serializing position record: {e}"),
        }
    }
}
