use super::capture::DebugCapture;
use super::dead_reckoning::Extrapolator;
use super::position_store::PositionStore;
use super::snapshot::VehicleSnapshot;
use crate::config::Config;
use crate::cot::CotForwarder;
use crate::tesla_api::{
    ApiError, PollFailure, TeslaApiClient, TeslaRequestType, Vehicle, VehicleData,
    VehicleDataRequest, WakeUpRequest, classify,
};
use crate::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Poll-interval scaling applied after throttling or repeated errors.
#[derive(Debug)]
pub(super) struct Backoff {
    multiplier: u32,
}

impl Backoff {
    const RATE_LIMIT_CEILING: u32 = 32;
    const REPEATED_ERROR_CEILING: u32 = 16;

    pub fn new() -> Backoff { Backoff { multiplier: 1 } }

    /// Doubles on every throttled poll, up to 32x.
    pub fn on_rate_limit(&mut self) {
        self.multiplier = (self.multiplier * 2).min(Self::RATE_LIMIT_CEILING);
    }

    /// Grows by 1.5x (integer, rounded up) once errors repeat, up to 16x.
    pub fn on_repeated_errors(&mut self) {
        self.multiplier = (self.multiplier * 3).div_ceil(2).min(Self::REPEATED_ERROR_CEILING);
    }

    pub fn reset(&mut self) { self.multiplier = 1; }

    pub fn multiplier(&self) -> u32 { self.multiplier }

    pub fn scaled(&self, base: Duration) -> Duration { base * self.multiplier }
}

/// One tracking session per vehicle: drives the poll→classify→act loop, owns
/// the vehicle's extrapolation task and its persisted position record.
pub(super) struct TrackingSession {
    vehicle: Vehicle,
    api: Arc<TeslaApiClient>,
    forwarder: Arc<CotForwarder>,
    store: PositionStore,
    capture: Option<Arc<DebugCapture>>,
    config: Arc<Config>,
    c_tok: CancellationToken,
    last_valid: Option<VehicleSnapshot>,
    backoff: Backoff,
    consecutive_errors: u32,
    extrapolator: Option<Extrapolator>,
}

impl TrackingSession {
    /// Grace period after a wake request before the first fetch.
    const WAKE_GRACE: Duration = Duration::from_secs(5);
    const INITIAL_FETCH_ATTEMPTS: u32 = 3;
    const INITIAL_FETCH_RETRY: Duration = Duration::from_secs(10);
    /// Consecutive unclassified errors before the backoff starts growing.
    const REPEATED_ERROR_THRESHOLD: u32 = 3;

    pub fn new(
        vehicle: Vehicle,
        api: Arc<TeslaApiClient>,
        forwarder: Arc<CotForwarder>,
        capture: Option<Arc<DebugCapture>>,
        config: Arc<Config>,
        c_tok: CancellationToken,
    ) -> TrackingSession {
        let store = PositionStore::for_vehicle(&config.position_dir, vehicle.record_key());
        TrackingSession {
            vehicle,
            api,
            forwarder,
            store,
            capture,
            config,
            c_tok,
            last_valid: None,
            backoff: Backoff::new(),
            consecutive_errors: 0,
            extrapolator: None,
        }
    }

    /// Runs until shutdown. Every poll failure is absorbed inside the loop;
    /// the session has no error exit.
    pub async fn run(mut self) {
        if !self.initialize().await {
            return;
        }
        loop {
            if self.c_tok.is_cancelled() {
                break;
            }
            let polled =
                (VehicleDataRequest { id: self.vehicle.id() }).send_request(&self.api).await;
            let delay = match polled {
                Ok(data) => {
                    self.on_sample(data).await;
                    self.config.poll_interval
                }
                Err(e) => self.on_poll_failure(&e).await,
            };
            tokio::select! {
                () = self.c_tok.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }
        if let Some(extrapolator) = self.extrapolator.take() {
            extrapolator.stop().await;
        }
        info!("Tracking session for {} stopped", self.vehicle.display_name());
    }

    /// Wake-and-first-fetch. Falls back to the persisted record when the API
    /// stays unreachable; returns false when there is nothing to track from.
    async fn initialize(&mut self) -> bool {
        info!("Initializing tracking for {}", self.vehicle.display_name());
        if self.vehicle.is_asleep() {
            info!("Vehicle is asleep, attempting to wake for an initial position");
            if let Err(e) = (WakeUpRequest { id: self.vehicle.id() }).send_request(&self.api).await
            {
                warn!("Failed to wake {}: {e:?}", self.vehicle.display_name());
            }
            tokio::time::sleep(Self::WAKE_GRACE).await;
        }
        for attempt in 1..=Self::INITIAL_FETCH_ATTEMPTS {
            let fetched =
                (VehicleDataRequest { id: self.vehicle.id() }).send_request(&self.api).await;
            match fetched {
                Ok(data) => {
                    self.observe_capture(&data).await;
                    let snapshot = VehicleSnapshot::from_data(&data, &self.vehicle);
                    if let Some((latitude, longitude)) = snapshot.fix() {
                        info!("Saved initial position: {latitude:.6}, {longitude:.6}");
                        self.store.save(&snapshot).await;
                        self.last_valid = Some(snapshot);
                    }
                    return true;
                }
                Err(e) => {
                    warn!(
                        "Failed to get vehicle data (attempt {attempt}/{}): {e:?}",
                        Self::INITIAL_FETCH_ATTEMPTS
                    );
                    if attempt < Self::INITIAL_FETCH_ATTEMPTS {
                        tokio::time::sleep(Self::INITIAL_FETCH_RETRY).await;
                    }
                }
            }
        }
        error!(
            "Failed to get initial vehicle data after {} attempts",
            Self::INITIAL_FETCH_ATTEMPTS
        );
        match self.store.load().await {
            Some(cached) => {
                info!("Using cached position data");
                self.forwarder.transmit(&cached).await;
                self.last_valid = Some(cached);
                true
            }
            None => {
                error!("No cached data available for {}", self.vehicle.display_name());
                false
            }
        }
    }

    /// Classifies a failed poll and returns how long to sleep before the
    /// next cycle.
    async fn on_poll_failure(&mut self, err: &ApiError) -> Duration {
        let base = self.config.poll_interval;
        match classify(err) {
            PollFailure::RateLimited => {
                self.consecutive_errors += 1;
                self.backoff.on_rate_limit();
                let delay = self.backoff.scaled(base);
                warn!(
                    "Rate limit detected, backing off to {}s delay (error #{})",
                    delay.as_secs(),
                    self.consecutive_errors
                );
                warn!("Error details: {err:?}");
                self.retransmit_last().await;
                delay
            }
            PollFailure::Unavailable => {
                info!("Vehicle is asleep/unavailable, using last known position");
                self.retransmit_last().await;
                base
            }
            PollFailure::Other => {
                self.consecutive_errors += 1;
                error!("API error (#{}): {err:?}", self.consecutive_errors);
                if self.consecutive_errors >= Self::REPEATED_ERROR_THRESHOLD {
                    self.backoff.on_repeated_errors();
                    let delay = self.backoff.scaled(base);
                    warn!("Multiple API errors detected, backing off to {}s delay", delay.as_secs());
                    delay
                } else {
                    base
                }
            }
        }
    }

    async fn on_sample(&mut self, data: VehicleData) {
        self.observe_capture(&data).await;
        if self.consecutive_errors > 0 || self.backoff.multiplier() > 1 {
            info!("API responding normally again, resetting backoff");
        }
        self.consecutive_errors = 0;
        self.backoff.reset();

        let snapshot = VehicleSnapshot::from_data(&data, &self.vehicle);
        info!(
            "Got vehicle data: lat={:?}, lon={:?}, speed={}mph, battery={}%, uid={}",
            snapshot.latitude(),
            snapshot.longitude(),
            snapshot.speed().unwrap_or(0.0),
            snapshot.battery_level(),
            snapshot.uid()
        );

        if snapshot.fix().is_some() {
            self.store.save(&snapshot).await;
            self.last_valid = Some(snapshot.clone());
            self.forwarder.transmit(&snapshot).await;
            if self.config.dead_reckoning_enabled {
                // A fresh measured sample supersedes any running extrapolation;
                // the old task must be fully stopped before a new one starts.
                if let Some(extrapolator) = self.extrapolator.take() {
                    extrapolator.stop().await;
                }
                if snapshot.is_moving() || snapshot.in_drive_gear() {
                    info!(
                        "Starting dead reckoning interpolation (speed: {}mph, gear: {})",
                        snapshot.speed().unwrap_or(0.0),
                        gear_label(&snapshot)
                    );
                    self.extrapolator = self.start_extrapolator(snapshot);
                }
            }
        } else {
            warn!("No valid GPS coordinates in vehicle data");
            if self.extrapolator.as_ref().is_some_and(Extrapolator::is_running) {
                // The extrapolator currently owns the reported position.
                return;
            }
            if self.config.dead_reckoning_enabled {
                if let Some(seed) = self.last_valid.clone().filter(VehicleSnapshot::is_moving) {
                    info!("No fix, dead reckoning from the last known position");
                    self.extrapolator = self.start_extrapolator(seed);
                    return;
                }
            }
            self.retransmit_last().await;
        }
    }

    fn start_extrapolator(&self, seed: VehicleSnapshot) -> Option<Extrapolator> {
        let step = self.config.dead_reckoning_interval;
        // Never race the next real sample.
        let horizon = self.config.poll_interval.saturating_sub(step);
        Extrapolator::start(seed, step, horizon, Arc::clone(&self.forwarder))
    }

    /// Replays the last valid snapshot to keep the remote track alive.
    async fn retransmit_last(&self) {
        match &self.last_valid {
            Some(last) => self.forwarder.transmit(last).await,
            None => warn!("No last known position available"),
        }
    }

    async fn observe_capture(&self, data: &VehicleData) {
        if let Some(capture) = &self.capture {
            capture.observe(data).await;
        }
    }
}

fn gear_label(snapshot: &VehicleSnapshot) -> String {
    snapshot.shift_state().map_or_else(|| String::from("unknown"), |state| state.to_string())
}
