//! Credentials and bearer-token lifecycle for the StorCycle OpenAPI.
//!
//! - [`CredentialSource`] hands out a username/password pair per login attempt
//! - [`Authenticator`] turns credentials into a raw token (`POST /tokens`)
//! - [`TokenCache`] memoizes the token for a fixed TTL behind an async mutex

mod credentials;
mod error;
mod token;

pub use credentials::{
    CredentialSource, Credentials, CredentialsFile, StaticCredentials, parse_credentials,
    source_from_config,
};
pub use error::{AuthError, CredentialError};
pub use token::{
    Authenticator, Clock, PasswordLogin, SystemClock, Token, TokenCache, extract_token,
};
