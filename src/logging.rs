//! Tracing subscriber setup for the command line front end.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;
use crate::error::{AppError, AppResult};

/// Build the event filter: `RUST_LOG` when set, otherwise the configured level.
pub fn env_filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(settings: &LoggingSettings) -> AppResult<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(settings))
        .with_writer(std::io::stderr);

    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| AppError::Logging(e.to_string()))
}
