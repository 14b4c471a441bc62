use super::capture::DebugCapture;
use super::session::TrackingSession;
use crate::config::Config;
use crate::cot::{CotForwarder, TakClient};
use crate::tesla_api::{
    ApiError, TeslaApiClient, TeslaRequestType, Vehicle, VehiclesRequest, WakeUpRequest,
};
use crate::{info, warn};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use strum_macros::Display;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Failures that abort startup; everything past startup degrades instead.
#[derive(Debug, Display)]
pub enum StartupError {
    NoVehicles,
    VehicleList(ApiError),
}

impl std::error::Error for StartupError {}

impl From<ApiError> for StartupError {
    fn from(value: ApiError) -> Self { StartupError::VehicleList(value) }
}

/// Starts one tracking session per tracked vehicle, all sharing a single
/// transport client, and monitors their liveness until shutdown.
pub struct Supervisor {
    api: Arc<TeslaApiClient>,
    forwarder: Arc<CotForwarder>,
    tak: Arc<TakClient>,
    config: Arc<Config>,
    c_tok: CancellationToken,
}

impl Supervisor {
    /// Interval between liveness checks of the session tasks.
    const MONITOR_INTERVAL: Duration = Duration::from_secs(5);

    pub fn new(
        api: Arc<TeslaApiClient>,
        forwarder: Arc<CotForwarder>,
        tak: Arc<TakClient>,
        config: Arc<Config>,
        c_tok: CancellationToken,
    ) -> Supervisor {
        Supervisor { api, forwarder, tak, config, c_tok }
    }

    pub async fn run(&self) -> Result<(), StartupError> {
        let vehicles = (VehiclesRequest {}).send_request(&self.api).await?;
        info!("Found {} vehicle(s) on the account", vehicles.len());
        let tracked: Vec<Vehicle> = vehicles
            .into_iter()
            .filter(|vehicle| {
                let mut names = vec![vehicle.display_name(), vehicle.id()];
                if let Some(vin) = vehicle.vin() {
                    names.push(vin);
                }
                self.config.is_allowed(&names)
            })
            .collect();
        if tracked.is_empty() {
            return Err(StartupError::NoVehicles);
        }

        self.wake_sleeping(&tracked).await;

        let capture = if self.config.capture_enabled {
            DebugCapture::create(self.config.capture_dir.clone()).map(Arc::new)
        } else {
            None
        };

        let mut sessions: Vec<JoinHandle<()>> = Vec::with_capacity(tracked.len());
        for vehicle in tracked {
            info!("Starting tracking for {}", vehicle.display_name());
            let session = TrackingSession::new(
                vehicle,
                Arc::clone(&self.api),
                Arc::clone(&self.forwarder),
                capture.clone(),
                Arc::clone(&self.config),
                self.c_tok.child_token(),
            );
            sessions.push(tokio::spawn(session.run()));
        }
        info!(
            "All tracking sessions started, polling every {}s",
            self.config.poll_interval.as_secs()
        );

        loop {
            tokio::select! {
                () = self.c_tok.cancelled() => break,
                () = tokio::time::sleep(Self::MONITOR_INTERVAL) => {}
            }
            self.tak.ensure_connected().await;
            let alive = sessions.iter().filter(|handle| !handle.is_finished()).count();
            if alive < sessions.len() {
                warn!("Only {alive}/{} tracking sessions running", sessions.len());
            }
        }
        info!("Stop signal observed, supervisor shutting down");
        Ok(())
    }

    /// Best-effort parallel wake of every sleeping vehicle before tracking
    /// starts; failures only log.
    async fn wake_sleeping(&self, vehicles: &[Vehicle]) {
        let wakes =
            vehicles.iter().filter(|vehicle| vehicle.is_asleep()).map(|vehicle| async move {
                info!("Waking up {}", vehicle.display_name());
                if let Err(e) = (WakeUpRequest { id: vehicle.id() }).send_request(&self.api).await {
                    warn!("Could not wake {}: {e:?}", vehicle.display_name());
                }
            });
        join_all(wakes).await;
    }
}
