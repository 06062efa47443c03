//! Configuration for the coach client and the rewrite server.
//!
//! The client reaches the backend at `<base>/api/chat`. The base is picked by
//! [`resolve_base_url`] from three ordered tiers:
//! 1. an explicitly configured URL,
//! 2. the fixed local backend when running against a local development host,
//! 3. an empty base, so the path is joined to the host origin and served by
//!    the rewrite layer.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Fixed path of the chat endpoint on every backend.
pub const CHAT_PATH: &str = "/api/chat";

/// Backend address used by the local development tier.
pub const LOCAL_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Host names treated as local development hosts.
pub const LOCAL_DEV_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// Default port of the rewrite server.
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Errors raised while turning settings into concrete endpoints.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configured URL could not be parsed.
    #[error("Invalid URL '{value}': {source}")]
    InvalidUrl {
        /// The offending value.
        value: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// The base resolved to a relative path but no host origin is known.
    #[error("No API URL configured and no host origin to resolve /api/chat against")]
    MissingOrigin,
}

/// Development or production run mode.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum RunMode {
    /// Local development: local fallbacks and rewrites are enabled.
    Development,
    /// Deployed build.
    #[default]
    Production,
}

impl RunMode {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    /// Whether this is the development mode.
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which fallback tier produced the base URL.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BaseUrlTier {
    /// Explicitly configured base URL.
    Explicit,
    /// Fixed local backend for local development hosts.
    LocalDevelopment,
    /// Empty base; the path is resolved against the host origin.
    RelativeOrigin,
}

/// Outcome of base URL resolution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedBaseUrl {
    /// Tier that matched.
    pub tier: BaseUrlTier,
    /// Base without trailing slash. Empty for [`BaseUrlTier::RelativeOrigin`].
    pub base: String,
}

impl ResolvedBaseUrl {
    /// Build the absolute chat endpoint.
    ///
    /// # Errors
    /// Returns an error if the base is not a valid URL, or if the base is
    /// relative and `host_origin` is `None`.
    pub fn chat_endpoint(&self, host_origin: Option<&Url>) -> Result<Url, ConfigError> {
        if self.base.is_empty() {
            let origin = host_origin.ok_or(ConfigError::MissingOrigin)?;
            return origin
                .join(CHAT_PATH)
                .map_err(|source| ConfigError::InvalidUrl {
                    value: origin.to_string(),
                    source,
                });
        }

        let value = format!("{}{CHAT_PATH}", self.base);
        Url::parse(&value).map_err(|source| ConfigError::InvalidUrl { value, source })
    }
}

/// Whether `origin` points at a local development host.
#[must_use]
pub fn is_local_dev_host(origin: &Url) -> bool {
    origin
        .host_str()
        .is_some_and(|host| LOCAL_DEV_HOSTS.contains(&host))
}

/// Resolve the API base URL from the ordered fallback tiers.
///
/// Without a host origin the local tier applies only in development mode.
#[must_use]
pub fn resolve_base_url(
    explicit: Option<&str>,
    host_origin: Option<&Url>,
    mode: RunMode,
) -> ResolvedBaseUrl {
    if let Some(url) = explicit.map(str::trim).filter(|url| !url.is_empty()) {
        return ResolvedBaseUrl {
            tier: BaseUrlTier::Explicit,
            base: url.trim_end_matches('/').to_string(),
        };
    }

    let local = match host_origin {
        Some(origin) => is_local_dev_host(origin),
        None => mode.is_development(),
    };
    if local {
        return ResolvedBaseUrl {
            tier: BaseUrlTier::LocalDevelopment,
            base: LOCAL_BACKEND_URL.to_string(),
        };
    }

    ResolvedBaseUrl {
        tier: BaseUrlTier::RelativeOrigin,
        base: String::new(),
    }
}

/// Settings for the message client.
#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    /// Explicit API base URL.
    pub api_url: Option<String>,
    /// Origin the client runs against (the shell server).
    pub origin: Option<Url>,
    /// Run mode.
    pub mode: RunMode,
}

impl ClientConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the explicit API base URL.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Set the host origin.
    #[must_use]
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Set the run mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Resolve the base URL tier for these settings.
    #[must_use]
    pub fn base_url(&self) -> ResolvedBaseUrl {
        resolve_base_url(self.api_url.as_deref(), self.origin.as_ref(), self.mode)
    }

    /// Absolute URL of the chat endpoint.
    ///
    /// # Errors
    /// See [`ResolvedBaseUrl::chat_endpoint`].
    pub fn chat_endpoint(&self) -> Result<Url, ConfigError> {
        self.base_url().chat_endpoint(self.origin.as_ref())
    }
}

/// Settings for the rewrite server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
    /// Explicit backend URL that `/api/*` is rewritten to.
    pub backend_url: Option<String>,
    /// Run mode.
    pub mode: RunMode,
    /// Directory served for non-API paths.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERVER_PORT,
            backend_url: None,
            mode: RunMode::Production,
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listening port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the explicit backend URL.
    #[must_use]
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = Some(url.into());
        self
    }

    /// Set the run mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the static asset directory.
    #[must_use]
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Destination origin for `/api/*`, or `None` when rewriting is disabled.
    ///
    /// Rewriting is enabled in development mode or when a backend URL is set.
    ///
    /// # Errors
    /// Returns an error if the configured backend URL is invalid.
    pub fn rewrite_destination(&self) -> Result<Option<Url>, ConfigError> {
        let explicit = self
            .backend_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty());

        let value = match explicit {
            Some(url) => url.trim_end_matches('/'),
            None if self.mode.is_development() => LOCAL_BACKEND_URL,
            None => return Ok(None),
        };

        Url::parse(value)
            .map(Some)
            .map_err(|source| ConfigError::InvalidUrl {
                value: value.to_string(),
                source,
            })
    }
}
