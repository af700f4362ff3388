//! HTTP client for the StorCycle OpenAPI

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::auth::{Credentials, Token};
use crate::config::ApiConfig;
use crate::ingest::{FetchError, PageSource};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for HttpConfig {
    fn from(api: &ApiConfig) -> Self {
        Self {
            base_url: api.base_url.clone(),
            connect_timeout: api.connect_timeout.as_duration(),
            request_timeout: api.request_timeout.as_duration(),
            user_agent: api.user_agent.clone(),
        }
    }
}

/// StorCycle OpenAPI client. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct StorcycleClient {
    client: Client,
    base_url: Url,
}

impl StorcycleClient {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url));
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL extended by path segments, each percent-encoded on its own
    /// (a `/` inside a segment is escaped, not treated as a separator).
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `POST /tokens` with the username/password pair
    pub async fn request_token(&self, credentials: &Credentials) -> Result<Value> {
        let url = self.endpoint(&["tokens"])?;
        let payload = json!({
            "username": credentials.username,
            "password": credentials.password(),
        });

        let request = self
            .client
            .post(url.clone())
            .header(ACCEPT, "application/json")
            .json(&payload);
        let response = send(request, &url).await?;
        read_json(check_status(response, &url)?).await
    }

    /// Authenticated GET returning the JSON body of a 2xx response
    pub async fn get_json(
        &self,
        token: &Token,
        segments: &[&str],
        query: &[(String, String)],
    ) -> Result<Value> {
        let response = self.get_raw(token, segments, query).await?;
        let url = response.url().clone();
        read_json(check_status(response, &url)?).await
    }

    /// Authenticated GET; the caller interprets the status code
    pub async fn get_raw(
        &self,
        token: &Token,
        segments: &[&str],
        query: &[(String, String)],
    ) -> Result<Response> {
        let url = self.endpoint(segments)?;
        let request = self.authorized(self.client.get(url.clone()), token).query(query);
        send(request, &url).await
    }

    /// Authenticated PUT with a JSON body
    pub async fn put_json(&self, token: &Token, segments: &[&str], body: &Value) -> Result<Value> {
        let url = self.endpoint(segments)?;
        let request = self.authorized(self.client.put(url.clone()), token).json(body);
        let response = send(request, &url).await?;
        read_json(check_status(response, &url)?).await
    }

    fn authorized(&self, request: RequestBuilder, token: &Token) -> RequestBuilder {
        request
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, token.bearer())
    }

    /// Page source bound to one bearer token
    pub fn pages<'a>(&'a self, token: &'a Token) -> BearerPages<'a> {
        BearerPages {
            client: self,
            token,
        }
    }
}

async fn send(request: RequestBuilder, url: &Url) -> Result<Response> {
    debug!(%url, "Sending request");
    request.send().await.map_err(|e| {
        if e.is_timeout() {
            ClientError::Timeout(url.to_string())
        } else {
            ClientError::Request(e)
        }
    })
}

fn check_status(response: Response, url: &Url) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(status_error(status, url));
    }
    Ok(response)
}

pub(crate) fn status_error(status: StatusCode, url: &Url) -> ClientError {
    ClientError::Status {
        status: status.as_u16(),
        url: url.to_string(),
    }
}

async fn read_json(response: Response) -> Result<Value> {
    response.json::<Value>().await.map_err(|e| {
        if e.is_timeout() {
            ClientError::Timeout(e.url().map(Url::to_string).unwrap_or_default())
        } else {
            ClientError::Request(e)
        }
    })
}

/// [`PageSource`] issuing authenticated GETs with a fixed token.
pub struct BearerPages<'a> {
    client: &'a StorcycleClient,
    token: &'a Token,
}

#[async_trait]
impl PageSource for BearerPages<'_> {
    async fn fetch_page(
        &self,
        endpoint: &str,
        query: &[(String, String)],
    ) -> std::result::Result<Value, FetchError> {
        let segments: Vec<&str> = endpoint.split('/').filter(|s| !s.is_empty()).collect();
        Ok(self.client.get_json(self.token, &segments, query).await?)
    }
}
