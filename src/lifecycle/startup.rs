//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the optional config file
//! - Apply command-line overrides on top
//! - Validate the merged result
//!
//! # Design Decisions
//! - Flags beat the file, the file beats built-in defaults
//! - Validation runs once, on the final merged config

use std::path::PathBuf;
use std::time::Duration;

use crate::config::loader::{read_config, ConfigError};
use crate::config::validation::validate_config;
use crate::config::DumpConfig;

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub listen: Option<String>,
    pub port: Option<u16>,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
}

/// Build the final, validated configuration.
pub fn resolve_config(overrides: &Overrides) -> Result<DumpConfig, ConfigError> {
    let mut config = match &overrides.config_path {
        Some(path) => read_config(path)?,
        None => DumpConfig::default(),
    };

    if let Some(listen) = &overrides.listen {
        config.listener.address = listen.clone();
    }
    if let Some(port) = overrides.port {
        config.listener.port = port;
    }
    if let Some(timeout) = overrides.read_timeout {
        config.timeouts.read_ms = timeout.as_millis() as u64;
    }
    if let Some(timeout) = overrides.write_timeout {
        config.timeouts.write_ms = timeout.as_millis() as u64;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
