mod message;
mod tak_client;
#[cfg(test)]
mod tests;

pub use message::{format_cot_for_tak, generate_cot_packet};
pub use tak_client::{TakClient, TransportError};

use crate::tracking::VehicleSnapshot;
use crate::{info, warn};
use std::sync::Arc;

/// Pipeline tail shared by the tracking sessions and their extrapolators:
/// encodes a snapshot and hands it to the transport client.
pub struct CotForwarder {
    tak: Arc<TakClient>,
}

impl CotForwarder {
    pub fn new(tak: Arc<TakClient>) -> CotForwarder { CotForwarder { tak } }

    /// Encodes and delivers one snapshot. Snapshots without a usable fix are
    /// never transmitted.
    pub async fn transmit(&self, snapshot: &VehicleSnapshot) {
        let Some((latitude, longitude)) = snapshot.fix() else {
            warn!("Dropping snapshot for {} without a usable fix", snapshot.display_name());
            return;
        };
        let packet = generate_cot_packet(snapshot);
        let message = format_cot_for_tak(&packet);
        info!(
            "Sending CoT for {} at {latitude:.6}, {longitude:.6} ({} bytes)",
            snapshot.display_name(),
            message.len()
        );
        self.tak.send(&message).await;
    }
}
