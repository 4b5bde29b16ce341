//! Runtime configuration
//!
//! Values come from `FLIGHT_FINDER_*` environment variables on top of the
//! defaults below. The CLI applies its own flags afterwards.

use crate::FlightError;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Origin serving `/api/airports` and `/search-flights`
    pub base_url: String,
    pub request_timeout: Duration,
    pub carousel_interval: Duration,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub log_level: String,
    /// Directory for rolling JSON log files; stderr only when `None`
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            carousel_interval: crate::CAROUSEL_INTERVAL,
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, FlightError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup so tests don't touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FlightError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = lookup("FLIGHT_FINDER_BASE_URL") {
            config.base_url = base_url;
        }

        if let Some(timeout) = lookup("FLIGHT_FINDER_TIMEOUT_SECS") {
            let secs = timeout.trim().parse::<u64>().map_err(|_| {
                FlightError::Config(format!(
                    "FLIGHT_FINDER_TIMEOUT_SECS must be a whole number of seconds, got {}",
                    timeout
                ))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(millis) = lookup("FLIGHT_FINDER_CAROUSEL_MS") {
            let millis = millis.trim().parse::<u64>().map_err(|_| {
                FlightError::Config(format!(
                    "FLIGHT_FINDER_CAROUSEL_MS must be a whole number of milliseconds, got {}",
                    millis
                ))
            })?;
            config.carousel_interval = Duration::from_millis(millis);
        }

        if let Some(level) = lookup("FLIGHT_FINDER_LOG_LEVEL") {
            config.log_level = level;
        }

        if let Some(dir) = lookup("FLIGHT_FINDER_LOG_DIR") {
            config.log_dir = Some(PathBuf::from(dir));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FlightError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(FlightError::Config(format!(
                "base URL must start with http:// or https://, got {}",
                self.base_url
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(FlightError::Config("request timeout must be non-zero".to_string()));
        }
        if self.carousel_interval.is_zero() {
            return Err(FlightError::Config("carousel interval must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Join an endpoint path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
