#![allow(dead_code, clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
mod config;
mod cot;
mod logger;
mod tesla_api;
mod tracking;

use crate::config::Config;
use crate::cot::{CotForwarder, TakClient};
use crate::tesla_api::TeslaApiClient;
use crate::tracking::Supervisor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    let config = Arc::new(
        Config::from_env().unwrap_or_else(|e| fatal!("Invalid configuration: {e}")),
    );
    info!("Starting OnTarget against {}", config.cot_url);

    let api = Arc::new(TeslaApiClient::new(&config.api_base_url, &config.access_token));
    let tak = Arc::new(
        TakClient::new(&config.cot_url)
            .unwrap_or_else(|_| fatal!("Invalid CoT endpoint: {}", config.cot_url)),
    );
    if let Err(e) = tak.connect().await {
        warn!("Initial connection to TAK server failed: {e:?}");
        tak.start_background_reconnect();
    }
    let forwarder = Arc::new(CotForwarder::new(Arc::clone(&tak)));

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            shutdown_signal.cancel();
        }
    });

    let supervisor =
        Supervisor::new(api, forwarder, Arc::clone(&tak), Arc::clone(&config), shutdown);
    if let Err(e) = supervisor.run().await {
        fatal!("Startup failed: {e}");
    }
    info!("OnTarget stopped");
}
