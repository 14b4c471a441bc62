use crate::tesla_api::VehicleData;
use crate::{error, info};
use chrono::Utc;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Optional side channel that writes every telemetry response to disk for
/// offline analysis and replay.
///
/// Observes the data after extraction and never feeds back into the tracking
/// loop; every failure here is logged and swallowed.
pub(super) struct DebugCapture {
    dir: PathBuf,
    count: AtomicUsize,
}

impl DebugCapture {
    pub fn create(dir: PathBuf) -> Option<DebugCapture> {
        if let Err(e) = std::fs::create_dir_all(&dir) {
            error!("Cannot create capture directory {}: {e}", dir.display());
            return None;
        }
        info!("Telemetry capture enabled, writing to {}/", dir.display());
        Some(DebugCapture { dir, count: AtomicUsize::new(0) })
    }

    pub async fn observe(&self, data: &VehicleData) {
        let now = Utc::now();
        let path = self.dir.join(format!("vehicle_data_{}.json", now.format("%Y%m%d_%H%M%S_%6f")));
        let record = json!({
            "capture_metadata": {
                "timestamp": now.timestamp_millis(),
                "datetime": now.to_rfc3339(),
                "version": "1.0",
            },
            "telemetry": data,
        });
        match serde_json::to_vec_pretty(&record) {
            Ok(raw) => match tokio::fs::write(&path, raw).await {
                Ok(()) => {
                    let count = self.count.fetch_add(1, Ordering::Relaxed) + 1;
                    info!("Capture #{count}: saved telemetry to {}", path.display());
                }
                Err(e) => error!("Failed to save capture to {}: {e}", path.display()),
            },
            Err(e) => error!("Failed to serialize capture: {e}"),
        }
    }
}
