//! Tracing subscriber setup for binaries and harnesses hosting the service.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },

    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled,
}

/// Build the filter: `RUST_LOG` when set, otherwise `config.filter`.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter).map_err(|e| TelemetryError::Filter {
        filter: config.filter.clone(),
        reason: e.to_string(),
    })
}

/// Install a global `fmt` subscriber.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|_| TelemetryError::AlreadyInstalled)
}
