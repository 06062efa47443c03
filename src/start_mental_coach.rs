//! Startup helpers for the terminal client and the rewrite server.

use std::io::{self, IsTerminal, Stdout};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::Parser;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::{Terminal, TerminalOptions, Viewport};
use tracing::Level;

use crate::cli::{ChatArgs, ServerArgs};
use crate::client::{HttpMessageClient, MessageClient};
use crate::server::{self, AppState};
use crate::terminal::{ScreenGuard, TerminalSession, key_inputs, line_inputs};

/// Screen size used when output is not a terminal.
const PIPED_WIDTH: u16 = 80;
const PIPED_HEIGHT: u16 = 24;

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` directives are honoured on top of `default_level`.
pub fn init_tracing(default_level: Level) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .init();
}

/// Run the terminal client (used by the `mental-coach` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` when the session ends, `1` on failure.
#[must_use]
pub fn run_chat() -> ExitCode {
    let args = ChatArgs::parse();
    // Logs share the terminal with the transcript, keep them quiet by default.
    init_tracing(Level::WARN);

    if let Err(e) = chat_main(&args) {
        tracing::error!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

fn chat_main(args: &ChatArgs) -> anyhow::Result<()> {
    let config = args.client_config();
    let client = HttpMessageClient::new(&config).context("Failed to create message client")?;
    tracing::info!("Chat endpoint: {}", client.endpoint());
    let client: Arc<dyn MessageClient> = Arc::new(client);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create runtime")?;

    if io::stdin().is_terminal() {
        let _screen = ScreenGuard::enter().context("Failed to set up terminal")?;
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
            .context("Failed to create terminal")?;
        let mut session = TerminalSession::new(client, terminal);
        runtime
            .block_on(session.run(key_inputs()))
            .context("Terminal session failed")
    } else {
        let mut session = TerminalSession::new(client, piped_terminal()?);
        let input = tokio::io::BufReader::new(tokio::io::stdin());
        runtime
            .block_on(session.run(line_inputs(input)))
            .context("Terminal session failed")
    }
}

/// Terminal for piped input. Output that is not a terminal gets a fixed size.
fn piped_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    let backend = CrosstermBackend::new(io::stdout());
    let terminal = if io::stdout().is_terminal() {
        Terminal::new(backend)
    } else {
        Terminal::with_options(
            backend,
            TerminalOptions {
                viewport: Viewport::Fixed(Rect::new(0, 0, PIPED_WIDTH, PIPED_HEIGHT)),
            },
        )
    };
    terminal.context("Failed to create terminal")
}

/// Run the rewrite server (used by the `mental-coach-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run_server() -> ExitCode {
    let args = ServerArgs::parse();
    init_tracing(Level::INFO);

    tracing::info!("Starting mental coach server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = server_main(&args) {
        tracing::error!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

fn server_main(args: &ServerArgs) -> anyhow::Result<()> {
    let config = args.server_config();
    let state = AppState::new(&config).map_err(|e| anyhow!("Failed to create state: {e}"))?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to create runtime")?;
    runtime
        .block_on(server::run_server_with_shutdown(
            state,
            config.port,
            config.static_dir.as_deref(),
            shutdown_signal(),
        ))
        .map_err(|e| anyhow!("Server error: {e}"))
}

/// Resolve on Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Ctrl+C handler failed: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}
