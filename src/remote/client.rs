use std::time::Duration;

use reqwest::{header, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    config::Config,
    error::{ClientError, Result},
    models::session::SessionToken,
};

/// The longest remote body quoted in an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// The error body shapes the remote answers with.
#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// HTTP access to the remote blog API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client from the application's configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(&config.api_url, config.request_timeout)
    }

    /// Creates a client for `base_url` with a per-request timeout.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The API origin, e.g. `http://localhost:5000`.
    /// * `timeout` - Requests taking longer fail with `ClientError::Network`.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    pub(crate) fn put(&self, path: &str) -> RequestBuilder {
        self.http.put(self.url(path))
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.http.delete(self.url(path))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends `request` and returns the raw body of a success response.
    ///
    /// Transport failures become `Network`; non-success statuses become
    /// `Remote` with the server's message, or `fallback` when it sent none.
    pub(crate) async fn execute(&self, request: RequestBuilder, fallback: &str) -> Result<Vec<u8>> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            return Ok(body.to_vec());
        }

        let parsed: ErrorBody = sonic_rs::from_slice(&body).unwrap_or_default();
        let message = parsed
            .message
            .or(parsed.error)
            .filter(|m| !m.trim().is_empty())
            .or_else(|| {
                let text = String::from_utf8_lossy(&body);
                let text = text.trim();
                (!text.is_empty() && !text.starts_with('{') && !text.starts_with('<'))
                    .then(|| text.chars().take(MAX_ERROR_BODY_CHARS).collect())
            })
            .unwrap_or_else(|| fallback.to_string());

        tracing::warn!("Remote error {}: {}", status, message);
        Err(ClientError::remote(status, parsed.code.as_deref(), message))
    }

    /// Sends `request` and decodes the JSON body of a success response.
    pub(crate) async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<T> {
        let body = self.execute(request, fallback).await?;
        sonic_rs::from_slice(&body).map_err(|e| {
            tracing::warn!("Undecodable response body: {}", e);
            ClientError::Serialization(e.to_string())
        })
    }
}

/// Attaches a JSON body encoded with sonic-rs.
pub(crate) fn with_json<B: Serialize + ?Sized>(request: RequestBuilder, body: &B) -> Result<RequestBuilder> {
    let json = sonic_rs::to_string(body)?;
    Ok(request
        .header(header::CONTENT_TYPE, "application/json")
        .body(json))
}

/// Attaches `Authorization: Bearer <token>`.
pub(crate) fn with_bearer(request: RequestBuilder, token: &SessionToken) -> RequestBuilder {
    request.bearer_auth(token.expose())
}
