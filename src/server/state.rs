//! Application state shared across all request handlers.

use std::sync::Arc;

use url::Url;

use crate::config::{ConfigError, RunMode, ServerConfig};

/// Shared application state.
pub struct AppState {
    /// HTTP client used to forward rewritten requests.
    pub client: reqwest::Client,
    /// Backend origin `/api/*` is rewritten to; `None` disables rewriting.
    pub destination: Option<Url>,
    /// Run mode.
    pub mode: RunMode,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    /// Returns an error if the backend URL is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: &ServerConfig) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let destination = config.rewrite_destination()?;
        Self::with_destination(destination, config.mode)
    }

    /// Create a state forwarding to `destination`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_destination(
        destination: Option<Url>,
        mode: RunMode,
    ) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {e}"))?;

        Ok(Arc::new(Self {
            client,
            destination,
            mode,
        }))
    }

    /// Whether `/api/*` is forwarded.
    pub const fn rewrites_enabled(&self) -> bool {
        self.destination.is_some()
    }

    /// Rewritten URL for `/api/<path>?<query>`.
    ///
    /// # Errors
    /// Returns an error if rewriting is disabled or the joined URL is invalid.
    pub fn rewrite_url(&self, path: &str, query: Option<&str>) -> Result<Url, ConfigError> {
        let destination = self.destination.as_ref().ok_or(ConfigError::MissingOrigin)?;
        let base = destination.as_str().trim_end_matches('/');
        let mut value = format!("{base}/api/{}", path.trim_start_matches('/'));
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            value.push('?');
            value.push_str(query);
        }
        Url::parse(&value).map_err(|source| ConfigError::InvalidUrl { value, source })
    }
}
