//! Startup orchestration.
//!
//! # Responsibilities
//! - Load configuration and apply command-line overrides
//! - Initialize logging and metrics
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Overrides are validated like the file they override
//! - Logging comes first so later steps can report

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::{load_config, validate_config, ConfigError, RunnerConfig};
use crate::error::RunnerError;
use crate::observability::{logging, metrics};

/// Inputs gathered before the config is known.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    /// TOML config file; defaults are used when absent.
    pub config_path: Option<PathBuf>,
    /// Replace the configured bind addresses when non-empty.
    pub bind_addresses: Vec<String>,
}

/// Resolve the effective configuration.
pub fn load(options: &StartupOptions) -> Result<RunnerConfig, RunnerError> {
    let mut config = match &options.config_path {
        Some(path) => load_config(path)?,
        None => RunnerConfig::default(),
    };

    if !options.bind_addresses.is_empty() {
        config.listener.bind_addresses = options.bind_addresses.clone();
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Initialize logging, then metrics if enabled.
pub fn init_observability(config: &RunnerConfig) {
    logging::init_logging(&config.observability);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }
}
