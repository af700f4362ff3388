use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::CredentialsConfig;

use super::error::CredentialError;

const CREDENTIALS_FILE_NAME: &str = ".SPECTRA";
const USERNAME_KEY: &str = "USERNAME";
const PASSWORD_KEY: &str = "PASSWORD";

/// Username/password pair used for a single login attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Anything that can hand out credentials on demand.
///
/// Called once per login attempt so that a rotated password is picked up
/// without restarting the process.
pub trait CredentialSource: Send + Sync {
    fn load(&self) -> Result<Credentials, CredentialError>;
}

/// `KEY=VALUE` credentials file (default `~/.SPECTRA`).
#[derive(Debug, Clone)]
pub struct CredentialsFile {
    path: PathBuf,
}

impl CredentialsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.SPECTRA` for the current user
    pub fn default_location() -> Result<Self, CredentialError> {
        let dirs = directories::BaseDirs::new().ok_or(CredentialError::NoHomeDir)?;
        Ok(Self::new(dirs.home_dir().join(CREDENTIALS_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialSource for CredentialsFile {
    fn load(&self) -> Result<Credentials, CredentialError> {
        if !self.path.exists() {
            return Err(CredentialError::NotFound(self.path.clone()));
        }
        let contents = std::fs::read_to_string(&self.path)?;
        tracing::debug!(path = %self.path.display(), "Read credentials file");
        parse_credentials(&contents)
    }
}

/// Fixed credentials, e.g. taken from the environment.
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    pub fn new(credentials: Credentials) -> Self {
        Self(credentials)
    }
}

impl CredentialSource for StaticCredentials {
    fn load(&self) -> Result<Credentials, CredentialError> {
        Ok(self.0.clone())
    }
}

/// Pick the credential source described by the configuration.
///
/// Environment-provided username and password win over the file.
pub fn source_from_config(
    config: &CredentialsConfig,
) -> Result<Arc<dyn CredentialSource>, CredentialError> {
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        return Ok(Arc::new(StaticCredentials::new(Credentials::new(
            username.as_str(),
            password.as_str(),
        ))));
    }

    let file = match &config.path {
        Some(path) => CredentialsFile::new(path),
        None => CredentialsFile::default_location()?,
    };
    Ok(Arc::new(file))
}

/// Parse `KEY=VALUE` lines. Blank lines and `#` comments are skipped; keys
/// and values are trimmed; later duplicates override earlier ones.
pub fn parse_credentials(contents: &str) -> Result<Credentials, CredentialError> {
    let mut entries: HashMap<&str, &str> = HashMap::new();

    for (index, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or(CredentialError::InvalidLine { line: index + 1 })?;
        entries.insert(key.trim(), value.trim());
    }

    let field = |key: &'static str| {
        entries
            .get(key)
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string())
            .ok_or(CredentialError::MissingField(key))
    };

    Ok(Credentials::new(field(USERNAME_KEY)?, field(PASSWORD_KEY)?))
}
