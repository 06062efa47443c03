//! Command-line arguments. Every flag falls back to an environment variable.

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use crate::config::{ClientConfig, DEFAULT_SERVER_PORT, RunMode, ServerConfig};

/// Arguments of the `mental-coach` terminal client.
#[derive(Debug, Parser)]
#[command(name = "mental-coach", version, about = "Chat with your mental coach")]
pub struct ChatArgs {
    /// Base URL of the coach API (the `/api/chat` path is appended)
    #[arg(long, env = "MENTAL_COACH_API_URL")]
    pub api_url: Option<String>,

    /// Origin the client runs against, e.g. the rewrite server address
    #[arg(long, env = "MENTAL_COACH_ORIGIN")]
    pub origin: Option<Url>,

    /// Run mode; development falls back to the local backend
    #[arg(long, value_enum, env = "MENTAL_COACH_ENV", default_value_t = RunMode::Production)]
    pub mode: RunMode,
}

impl ChatArgs {
    /// Client settings for these arguments.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new().with_mode(self.mode);
        if let Some(url) = &self.api_url {
            config = config.with_api_url(url.clone());
        }
        if let Some(origin) = &self.origin {
            config = config.with_origin(origin.clone());
        }
        config
    }
}

/// Arguments of the `mental-coach-server` rewrite server.
#[derive(Debug, Parser)]
#[command(name = "mental-coach-server", version, about = "Rewrite server for the coach API")]
pub struct ServerArgs {
    /// Port to listen on
    #[arg(short, long, env = "MENTAL_COACH_PORT", default_value_t = DEFAULT_SERVER_PORT)]
    pub port: u16,

    /// Backend origin that `/api/*` is rewritten to
    #[arg(long, env = "MENTAL_COACH_API_URL")]
    pub backend_url: Option<String>,

    /// Directory of static assets served for non-API paths
    #[arg(long, env = "MENTAL_COACH_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Run mode; development enables rewrites to the local backend
    #[arg(long, value_enum, env = "MENTAL_COACH_ENV", default_value_t = RunMode::Production)]
    pub mode: RunMode,
}

impl ServerArgs {
    /// Server settings for these arguments.
    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        let mut config = ServerConfig::new()
            .with_port(self.port)
            .with_mode(self.mode);
        if let Some(url) = &self.backend_url {
            config = config.with_backend_url(url.clone());
        }
        if let Some(dir) = &self.static_dir {
            config = config.with_static_dir(dir.clone());
        }
        config
    }
}
