//! Tracing subscriber setup

use crate::config::Config;
use crate::FlightError;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_NAME: &str = "flight-finder.log";

/// Build the filter: `RUST_LOG` wins, otherwise the configured level.
pub fn build_filter(default_level: &str) -> Result<EnvFilter, FlightError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_level).map_err(|e| {
        FlightError::Config(format!("invalid log level '{}': {}", default_level, e))
    })
}

/// Initialize logging to stderr, plus daily-rotated JSON files when `log_dir` is set.
pub fn init_logging(config: &Config) -> Result<(), FlightError> {
    let filter = build_filter(&config.log_level)?;

    let file_layer = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()
        .map_err(|e| FlightError::Config(format!("logging already initialized: {}", e)))?;

    match &config.log_dir {
        Some(dir) => info!(log_dir = %dir.display(), "Logging initialized with file output"),
        None => info!("Logging initialized"),
    }
    debug!(level = %config.log_level, "Debug logging is enabled");
    Ok(())
}
