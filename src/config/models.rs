use crate::humanize::HumanDuration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub project: ProjectDefaults,
}

/// StorCycle OpenAPI connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    /// Upper bound for each individual request, including every page fetch
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
    #[serde(default = "default_token_ttl")]
    pub token_ttl: HumanDuration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            token_ttl: default_token_ttl(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "https://storcycle.bil.psc.edu/openapi".to_string()
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration::from_secs(60)
}

fn default_token_ttl() -> HumanDuration {
    HumanDuration::from_secs(15 * 60)
}

fn default_user_agent() -> String {
    format!("spectrabrainz/{}", env!("CARGO_PKG_VERSION"))
}

/// Where the username/password pair comes from
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CredentialsConfig {
    /// Key-value credentials file; `~/.SPECTRA` when unset
    pub path: Option<PathBuf>,
    /// Loaded from environment only, never from the config file
    #[serde(skip)]
    pub username: Option<String>,
    #[serde(skip)]
    pub password: Option<String>,
}

/// Daily report settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_include_all")]
    pub include_all: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dir: default_report_dir(),
            page_size: default_page_size(),
            include_all: default_include_all(),
        }
    }
}

fn default_report_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_page_size() -> usize {
    500
}

fn default_include_all() -> bool {
    true
}

/// Fixed parts of the payload sent when creating an archive project
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectDefaults {
    #[serde(default = "default_share")]
    pub share: String,
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,
}

impl Default for ProjectDefaults {
    fn default() -> Self {
        Self {
            share: default_share(),
            targets: default_targets(),
        }
    }
}

fn default_share() -> String {
    "BIL Published Data".to_string()
}

fn default_targets() -> Vec<String> {
    vec!["BIL Published Data on Tape".to_string()]
}
