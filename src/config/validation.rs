use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid API base URL '{url}', expected 'http://' or 'https://'")]
    InvalidBaseUrl { url: String },

    #[error("Report page size must be positive")]
    ZeroPageSize,

    #[error("Duration must be positive: {field}")]
    ZeroDuration { field: &'static str },

    #[error("At least one archive target is required for project creation")]
    NoProjectTargets,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_api(config)?;
    validate_report(config)?;
    validate_project(config)?;
    Ok(())
}

fn validate_api(config: &Config) -> Result<(), ValidationError> {
    let url = &config.api.base_url;
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(ValidationError::InvalidBaseUrl { url: url.clone() });
    }

    for (field, value) in [
        ("api.connect_timeout", config.api.connect_timeout),
        ("api.request_timeout", config.api.request_timeout),
        ("api.token_ttl", config.api.token_ttl),
    ] {
        if value.is_zero() {
            return Err(ValidationError::ZeroDuration { field });
        }
    }

    Ok(())
}

fn validate_report(config: &Config) -> Result<(), ValidationError> {
    if config.report.page_size == 0 {
        return Err(ValidationError::ZeroPageSize);
    }
    Ok(())
}

fn validate_project(config: &Config) -> Result<(), ValidationError> {
    if config.project.targets.is_empty() {
        return Err(ValidationError::NoProjectTargets);
    }
    Ok(())
}
