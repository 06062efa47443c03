//! Message client for the coach backend.
//!
//! One operation: POST `{"message": ...}` to `<base>/api/chat` and parse a
//! `{"reply": ...}` body. Every call reaches the origin; nothing is cached,
//! retried or timed out.

pub mod error;
pub mod types;

pub use error::{ClientError, UNREACHABLE_MESSAGE};
pub use types::{ChatRequest, ErrorBody, Reply};

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use crate::config::ClientConfig;

/// Anything that can exchange one user message for one reply.
#[async_trait]
pub trait MessageClient: Send + Sync {
    /// Send `message` and wait for the reply.
    ///
    /// # Errors
    /// Returns an error if the backend is unreachable, answers with a
    /// non-success status, or returns a body that is not a reply.
    async fn send(&self, message: &str) -> Result<Reply, ClientError>;
}

/// `reqwest`-backed client for the `/api/chat` endpoint.
#[derive(Clone, Debug)]
pub struct HttpMessageClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpMessageClient {
    /// Create a client for the endpoint resolved from `config`.
    ///
    /// # Errors
    /// Returns an error if the endpoint cannot be resolved or the HTTP client
    /// cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let resolved = config.base_url();
        let endpoint = resolved.chat_endpoint(config.origin.as_ref())?;
        tracing::debug!(tier = ?resolved.tier, %endpoint, "resolved chat endpoint");
        Self::with_endpoint(endpoint)
    }

    /// Create a client posting to an already resolved endpoint.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_endpoint(endpoint: Url) -> Result<Self, ClientError> {
        Ok(Self {
            client: Self::build_client()?,
            endpoint,
        })
    }

    /// The chat endpoint this client posts to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build an HTTP client that asks every intermediary not to cache.
    fn build_client() -> Result<reqwest::Client, ClientError> {
        use reqwest::header::{
            CACHE_CONTROL, EXPIRES, HeaderMap, HeaderValue, PRAGMA, USER_AGENT,
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(EXPIRES, HeaderValue::from_static("0"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("mental-coach/", env!("CARGO_PKG_VERSION"))),
        );

        reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::HttpClient(e.to_string()))
    }
}

#[async_trait]
impl MessageClient for HttpMessageClient {
    async fn send(&self, message: &str) -> Result<Reply, ClientError> {
        tracing::debug!(endpoint = %self.endpoint, "sending chat message");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&ChatRequest::new(message))
            .send()
            .await
            .map_err(ClientError::Unreachable)?;

        let status = response.status();
        let body = response.bytes().await;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "chat request failed");
            let message = match &body {
                Ok(bytes) => status_error_message(status, bytes),
                Err(e) => {
                    tracing::debug!("Failed to read error body: {e}");
                    status_error_message(status, b"")
                }
            };
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = body.map_err(|e| ClientError::MalformedReply(e.to_string()))?;
        Ok(serde_json::from_slice::<Reply>(&body)?)
    }
}

/// Human-readable message for a non-success response.
///
/// A JSON body yields its `detail` or `message` field, else the generic
/// status text. A non-JSON body yields the status reason phrase.
#[must_use]
pub fn status_error_message(status: StatusCode, body: &[u8]) -> String {
    let generic = format!("HTTP error! status: {}", status.as_u16());

    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => parsed
            .human_message()
            .map_or(generic, ToString::to_string),
        Err(_) => status
            .canonical_reason()
            .map_or(generic, ToString::to_string),
    }
}
