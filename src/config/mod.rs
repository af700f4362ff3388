//! Configuration management for spectrabrainz
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use spectrabrainz::config::Config;
//!
//! let config = Config::load(None).expect("Failed to load configuration");
//! println!("Reports land in: {}", config.report.dir.display());
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `SPECTRABRAINZ__<section>__<key>`
//!
//! Examples:
//! - `SPECTRABRAINZ__API__BASE_URL=https://storcycle.example.org/openapi`
//! - `SPECTRABRAINZ__API__TOKEN_TTL=15m`
//! - `SPECTRABRAINZ__REPORT__DIR=/var/lib/spectrabrainz`
//!
//! `SPECTRA_USERNAME` and `SPECTRA_PASSWORD` supply credentials directly and
//! take precedence over the credentials file.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/spectrabrainz.toml`.
//! This can be overridden using the `SPECTRABRAINZ_CONFIG` environment variable
//! or the `--config` flag.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{ApiConfig, Config, CredentialsConfig, ProjectDefaults, ReportConfig};
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// `path` overrides both `SPECTRABRAINZ_CONFIG` and the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or validation fails.
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path, without environment secrets
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
