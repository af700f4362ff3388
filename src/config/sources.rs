use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "SPECTRABRAINZ_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/spectrabrainz.toml";
const ENV_PREFIX: &str = "SPECTRABRAINZ";
const ENV_SEPARATOR: &str = "__";

const USERNAME_ENV_VAR: &str = "SPECTRA_USERNAME";
const PASSWORD_ENV_VAR: &str = "SPECTRA_PASSWORD";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    let _ = dotenvy::dotenv();

    let config_path = path.unwrap_or_else(|| {
        env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    });

    let mut config = load_from_sources(config_path)?;
    load_secrets(&mut config);

    Ok(config)
}

/// Credentials are never read from TOML, only from the environment
fn load_secrets(config: &mut Config) {
    if let Ok(username) = env::var(USERNAME_ENV_VAR) {
        config.credentials.username = Some(username);
    }
    if let Ok(password) = env::var(PASSWORD_ENV_VAR) {
        config.credentials.password = Some(password);
    }
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // SPECTRABRAINZ__REPORT__PAGE_SIZE -> report.page_size
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
