use std::path::PathBuf;

use thiserror::Error;

use crate::client::ClientError;

/// Problems locating or reading the username/password pair.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Credential file not found: {0}")]
    NotFound(PathBuf),

    /// The offending line is not echoed since it may hold the password.
    #[error("Invalid line {line} in credentials file (expected KEY=VALUE)")]
    InvalidLine { line: usize },

    #[error("{0} must be defined in the credentials source")]
    MissingField(&'static str),

    #[error("No home directory available to locate the credentials file")]
    NoHomeDir,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures while obtaining a bearer token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("Failed login (HTTP {status})")]
    FailedLogin { status: u16 },

    #[error("No 'token' field found in authentication response")]
    MissingToken,

    #[error(transparent)]
    Client(#[from] ClientError),
}
