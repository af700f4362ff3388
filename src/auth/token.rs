use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::client::{ClientError, StorcycleClient};

use super::credentials::CredentialSource;
use super::error::AuthError;

/// Wall-clock source, swappable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Bearer token plus the moment it was requested.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    pub issued_at: DateTime<Utc>,
}

impl Token {
    pub fn new(value: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            issued_at,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value)
    }

    /// A token exactly `ttl` old is already expired.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now.signed_duration_since(self.issued_at) < ttl
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"***")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Performs a full login and returns the raw token string.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self) -> Result<String, AuthError>;
}

/// Username/password login against `POST /tokens`.
pub struct PasswordLogin {
    client: Arc<StorcycleClient>,
    credentials: Arc<dyn CredentialSource>,
}

impl PasswordLogin {
    pub fn new(client: Arc<StorcycleClient>, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            client,
            credentials,
        }
    }
}

#[async_trait]
impl Authenticator for PasswordLogin {
    async fn login(&self) -> Result<String, AuthError> {
        let credentials = self.credentials.load()?;
        debug!(username = %credentials.username, "Requesting authentication token");

        let body = match self.client.request_token(&credentials).await {
            Ok(body) => body,
            Err(ClientError::Status { status, .. }) => {
                return Err(AuthError::FailedLogin { status });
            }
            Err(e) => return Err(e.into()),
        };

        extract_token(&body)
    }
}

/// Pull the non-empty `token` field out of a `/tokens` response.
pub fn extract_token(body: &Value) -> Result<String, AuthError> {
    body.get("token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .ok_or(AuthError::MissingToken)
}

/// Process-wide token memo with a fixed time-to-live.
///
/// Shared by `Arc`; the mutex covers the whole read-check-refresh-write
/// sequence so concurrent callers trigger at most one login.
pub struct TokenCache {
    authenticator: Arc<dyn Authenticator>,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    slot: Mutex<Option<Token>>,
}

impl TokenCache {
    pub fn new(authenticator: Arc<dyn Authenticator>, ttl: Duration) -> Self {
        Self {
            authenticator,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            clock: Arc::new(SystemClock),
            slot: Mutex::new(None),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Cached token if still fresh, otherwise a new login that replaces the cache.
    pub async fn get_token(&self) -> Result<Token, AuthError> {
        let mut slot = self.slot.lock().await;
        let now = self.clock.now();

        if let Some(token) = slot.as_ref() {
            if token.is_fresh(now, self.ttl) {
                debug!(issued_at = %token.issued_at, "Reusing cached token");
                return Ok(token.clone());
            }
        }

        let token = Token::new(self.authenticator.login().await?, now);
        info!(issued_at = %token.issued_at, "Obtained new authentication token");
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Always logs in. The cache is left untouched; use [`TokenCache::replace`]
    /// to store the result.
    pub async fn force_login(&self) -> Result<Token, AuthError> {
        let now = self.clock.now();
        let token = Token::new(self.authenticator.login().await?, now);
        info!(issued_at = %token.issued_at, "Obtained uncached authentication token");
        Ok(token)
    }

    pub async fn replace(&self, token: Token) {
        *self.slot.lock().await = Some(token);
    }
}
