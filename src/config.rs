use std::env;
use std::path::PathBuf;
use std::time::Duration;
use strum_macros::Display;

/// Runtime configuration, read once from the process environment at startup.
///
/// Only `COT_URL` and `TESLA_ACCESS_TOKEN` are required; everything else has
/// a default matching the tracker's normal operating cadence.
#[derive(Debug, Clone)]
pub struct Config {
    /// TAK server endpoint, `tcp://host:port`.
    pub cot_url: String,
    /// Base URL of the Tesla owner API.
    pub api_base_url: String,
    /// Opaque bearer token for the Tesla owner API.
    pub access_token: String,
    /// Base interval between telemetry polls.
    pub poll_interval: Duration,
    /// Step interval for dead-reckoned position updates.
    pub dead_reckoning_interval: Duration,
    /// Whether dead reckoning between samples is enabled.
    pub dead_reckoning_enabled: bool,
    /// Optional allow-list of display names, VINs or vehicle ids. Empty = all.
    pub allowlist: Vec<String>,
    /// Whether every telemetry response is captured to disk for offline analysis.
    pub capture_enabled: bool,
    /// Directory for capture files.
    pub capture_dir: PathBuf,
    /// Directory for persisted last-known-position records.
    pub position_dir: PathBuf,
}

#[derive(Debug, Display)]
pub enum ConfigError {
    MissingCotUrl,
    MissingAccessToken,
    InvalidNumber(String),
}

impl std::error::Error for ConfigError {}

impl Config {
    const DEFAULT_API_BASE_URL: &'static str = "https://owner-api.teslamotors.com";
    const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
    const DEFAULT_DEAD_RECKONING_INTERVAL: Duration = Duration::from_secs(1);

    pub fn from_env() -> Result<Config, ConfigError> {
        let cot_url = env::var("COT_URL").map_err(|_| ConfigError::MissingCotUrl)?;
        let access_token =
            env::var("TESLA_ACCESS_TOKEN").map_err(|_| ConfigError::MissingAccessToken)?;
        if access_token.trim().is_empty() {
            return Err(ConfigError::MissingAccessToken);
        }
        let api_base_url = env::var("TESLA_API_URL")
            .unwrap_or_else(|_| Self::DEFAULT_API_BASE_URL.to_string());
        let poll_interval = secs_var("API_LOOP_DELAY", Self::DEFAULT_POLL_INTERVAL)?;
        let dead_reckoning_interval =
            secs_var("DEAD_RECKONING_DELAY", Self::DEFAULT_DEAD_RECKONING_INTERVAL)?;
        let dead_reckoning_enabled = flag_var("DEAD_RECKONING_ENABLED");
        let allowlist = env::var("VEHICLE_ALLOWLIST")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let capture_enabled = flag_var("CAPTURE_ENABLED");
        let capture_dir =
            PathBuf::from(env::var("CAPTURE_DIR").unwrap_or_else(|_| "tesla_api_captures".into()));
        let position_dir = PathBuf::from(env::var("POSITION_DIR").unwrap_or_else(|_| ".".into()));

        Ok(Config {
            cot_url,
            api_base_url,
            access_token,
            poll_interval,
            dead_reckoning_interval,
            dead_reckoning_enabled,
            allowlist,
            capture_enabled,
            capture_dir,
            position_dir,
        })
    }

    /// True when `candidate` names a tracked vehicle under the allow-list.
    pub fn is_allowed(&self, candidates: &[&str]) -> bool {
        self.allowlist.is_empty()
            || candidates.iter().any(|c| self.allowlist.iter().any(|a| a == c))
    }
}

fn secs_var(name: &str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidNumber(name.to_string())),
        Err(_) => Ok(default),
    }
}

fn flag_var(name: &str) -> bool {
    env::var(name).is_ok_and(|raw| matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes"))
}
