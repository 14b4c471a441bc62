use super::snapshot::{MPH_TO_MS, VehicleSnapshot};
use crate::cot::CotForwarder;
use crate::{event, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Advances a position by `dt_secs` of travel at `speed_mph` along
/// `heading_deg` (clockwise from north), using an equirectangular
/// local-flatness approximation.
///
/// Only valid for the few-second, low-speed steps between telemetry samples;
/// this is not a great-circle solution and degrades near the poles.
pub fn advance_position(
    latitude: f64,
    longitude: f64,
    heading_deg: f64,
    speed_mph: f64,
    dt_secs: f64,
) -> (f64, f64) {
    let distance = speed_mph * MPH_TO_MS * dt_secs;
    let heading = heading_deg.to_radians();
    let lat = latitude.to_radians();
    let lon = longitude.to_radians();
    let new_lat = lat + (distance / EARTH_RADIUS_M) * heading.cos();
    let new_lon = lon + (distance / (EARTH_RADIUS_M * lat.cos())) * heading.sin();
    (new_lat.to_degrees(), new_lon.to_degrees())
}

/// Cancellable task emitting dead-reckoned snapshots between real samples.
///
/// At most one runs per tracking session; a fresh measured sample stops the
/// current task before a new one may start.
pub(super) struct Extrapolator {
    c_tok: CancellationToken,
    handle: JoinHandle<()>,
}

impl Extrapolator {
    const JOIN_TIMEOUT: Duration = Duration::from_secs(1);

    /// Spawns the extrapolation task. Returns `None` when the seed has no
    /// usable fix; nothing is emitted in that case.
    pub fn start(
        seed: VehicleSnapshot,
        step: Duration,
        horizon: Duration,
        forwarder: Arc<CotForwarder>,
    ) -> Option<Extrapolator> {
        let (latitude, longitude) = seed.fix()?;
        let c_tok = CancellationToken::new();
        let task_tok = c_tok.clone();
        let handle = tokio::spawn(async move {
            Self::run(seed, latitude, longitude, step, horizon, forwarder, task_tok).await;
        });
        Some(Extrapolator { c_tok, handle })
    }

    pub fn is_running(&self) -> bool { !self.handle.is_finished() }

    /// Cooperative cancel with a bounded join.
    pub async fn stop(self) {
        self.c_tok.cancel();
        if tokio::time::timeout(Self::JOIN_TIMEOUT, self.handle).await.is_err() {
            warn!("Extrapolation task did not finish within its join timeout");
        }
    }

    async fn run(
        seed: VehicleSnapshot,
        mut latitude: f64,
        mut longitude: f64,
        step: Duration,
        horizon: Duration,
        forwarder: Arc<CotForwarder>,
        c_tok: CancellationToken,
    ) {
        let started = Instant::now();
        let speed = seed.speed().unwrap_or(0.0);
        let step_secs = step.as_secs_f64();
        let mut update_count = 0_u32;
        info!(
            "Dead reckoning started for up to {}s from lat={latitude:.6}, lon={longitude:.6}",
            horizon.as_secs()
        );
        loop {
            tokio::select! {
                () = c_tok.cancelled() => break,
                () = tokio::time::sleep(step) => {}
            }
            // A stationary vehicle still re-emits its position every step to
            // keep the remote track on a steady cadence.
            if speed > 0.0 {
                (latitude, longitude) =
                    advance_position(latitude, longitude, seed.heading(), speed, step_secs);
            }
            update_count += 1;
            event!("Dead reckoning update #{update_count}: lat={latitude:.6}, lon={longitude:.6}");
            forwarder.transmit(&seed.at_position(latitude, longitude)).await;
            if started.elapsed() >= horizon {
                info!("Dead reckoning stopping after {update_count} updates, new sample imminent");
                break;
            }
        }
    }
}
