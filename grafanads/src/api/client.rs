use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::error::{ApiError, ErrorBody};

/// Grafana API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}

/// How requests authenticate against Grafana
#[derive(Clone, PartialEq)]
pub enum Credentials {
    Basic { username: String, password: String },
    ApiKey(String),
}

impl Credentials {
    /// `user:password` selects basic auth, anything else is an API key
    pub fn parse(auth: &str) -> Self {
        match auth.split_once(':') {
            Some((username, password)) => Credentials::Basic {
                username: username.to_string(),
                password: password.to_string(),
            },
            None => Credentials::ApiKey(auth.to_string()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Credentials::ApiKey(_) => f.write_str("ApiKey(..)"),
        }
    }
}

impl Client {
    /// Create a new API client with default configuration
    pub fn new(auth: &str, url: &str) -> Result<Self, ApiError> {
        Self::with_config(auth, url, ClientConfig::default())
    }

    pub fn with_config(auth: &str, url: &str, config: ClientConfig) -> Result<Self, ApiError> {
        let parsed = Url::parse(url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(url.to_string()));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: parsed.as_str().trim_end_matches('/').to_string(),
                credentials: Credentials::parse(auth),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.inner.credentials
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.execute(self.request(Method::GET, path), path).await?;
        parse_body(&body)
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::POST, path).json(body);
        let body = self.execute(request, path).await?;
        parse_body(&body)
    }

    /// Grafana answers PUT with a status message only, so the body is dropped
    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let request = self.request(Method::PUT, path).json(body);
        self.execute(request, path).await.map(|_| ())
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(self.request(Method::DELETE, path), path)
            .await
            .map(|_| ())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!("{} request to: {}", method, url);

        let builder = self.inner.http_client.request(method, url);
        match &self.inner.credentials {
            Credentials::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
            Credentials::ApiKey(key) => builder.header(AUTHORIZATION, format!("Bearer {}", key)),
        }
    }

    /// Send the request, returning the body text of a 2xx response
    async fn execute(&self, request: RequestBuilder, path: &str) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Response status for {}: {}", path, status);

        if status.is_success() {
            return Ok(response.text().await?);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or(text);

        Err(ApiError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message,
        })
    }
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| {
        tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
        ApiError::Parse(e.to_string())
    })
}
