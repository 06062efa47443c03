//! Transcript view: ordered turns, pending input and the single in-flight exchange.

use crate::client::{ClientError, MessageClient, Reply};

use super::clock::{Clock, SystemClock};
use super::render::TranscriptRow;
use super::turn::Turn;

/// Greeting appended when a session mounts.
pub const GREETING: &str = "Hello! I'm your mental coach. How can I support you today?";

/// Prefix of every assistant turn produced from a failure.
pub const ERROR_PREFIX: &str = "Sorry, I encountered an error: ";

/// Lifecycle of the most recent exchange.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ExchangeState {
    /// No exchange started yet.
    #[default]
    Idle,
    /// Waiting for the backend.
    Sending,
    /// Last exchange produced a reply.
    Succeeded,
    /// Last exchange failed; an error turn was appended.
    Failed,
}

/// Token for an exchange started by [`TranscriptView::begin_submit`].
///
/// Hand it back to [`TranscriptView::complete`] once the client resolves.
#[must_use]
#[derive(Debug)]
pub struct PendingExchange {
    message: String,
}

impl PendingExchange {
    /// Trimmed text to send.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Assistant text for a failed exchange.
#[must_use]
pub fn error_turn_text(error: &ClientError) -> String {
    format!("{ERROR_PREFIX}{error}")
}

/// Chat transcript with at most one outstanding request.
///
/// [`TranscriptView::new`] builds the static shell: no turns, nothing
/// session-specific. [`TranscriptView::mount`] starts the session.
#[derive(Debug)]
pub struct TranscriptView<C: Clock = SystemClock> {
    turns: Vec<Turn>,
    pending_input: String,
    state: ExchangeState,
    mounted: bool,
    clock: C,
}

impl TranscriptView {
    /// Empty shell using the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for TranscriptView {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TranscriptView<C> {
    /// Empty shell using `clock` for timestamps.
    #[must_use]
    pub const fn with_clock(clock: C) -> Self {
        Self {
            turns: Vec::new(),
            pending_input: String::new(),
            state: ExchangeState::Idle,
            mounted: false,
            clock,
        }
    }

    /// Start the session by appending the greeting.
    ///
    /// Returns `false` if the view was already mounted.
    pub fn mount(&mut self) -> bool {
        if self.mounted {
            return false;
        }
        self.mounted = true;
        self.turns.push(Turn::assistant(GREETING, self.clock.now()));
        true
    }

    /// Whether [`Self::mount`] has run.
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Turns in append order.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// State of the latest exchange.
    #[must_use]
    pub const fn state(&self) -> ExchangeState {
        self.state
    }

    /// Whether a reply is being awaited.
    #[must_use]
    pub const fn is_awaiting_reply(&self) -> bool {
        matches!(self.state, ExchangeState::Sending)
    }

    /// Text being composed.
    #[must_use]
    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    /// Replace the text being composed.
    pub fn set_pending_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    /// Append typed text to the input.
    pub fn insert_text(&mut self, text: &str) {
        self.pending_input.push_str(text);
    }

    /// Start a new line in the input.
    pub fn insert_newline(&mut self) {
        self.pending_input.push('\n');
    }

    /// Remove the last character of the input.
    pub fn delete_char(&mut self) {
        self.pending_input.pop();
    }

    /// Height of the input surface in lines; grows with the content.
    #[must_use]
    pub fn input_height(&self) -> usize {
        self.pending_input.split('\n').count()
    }

    /// Whether the send control is enabled.
    #[must_use]
    pub fn can_send(&self) -> bool {
        !self.is_awaiting_reply() && !self.pending_input.trim().is_empty()
    }

    /// Label of the send control.
    #[must_use]
    pub const fn send_label(&self) -> &'static str {
        if self.is_awaiting_reply() {
            "Sending..."
        } else {
            "Send"
        }
    }

    /// Validate `text` and start an exchange.
    ///
    /// Returns `None` without touching the transcript when `text` is blank or
    /// a reply is already awaited. Otherwise appends the user turn, clears
    /// the pending input and enters [`ExchangeState::Sending`].
    pub fn begin_submit(&mut self, text: &str) -> Option<PendingExchange> {
        let message = text.trim();
        if message.is_empty() {
            return None;
        }
        if self.is_awaiting_reply() {
            tracing::debug!("submit ignored while a reply is awaited");
            return None;
        }

        self.turns.push(Turn::user(message, self.clock.now()));
        self.pending_input.clear();
        self.state = ExchangeState::Sending;

        Some(PendingExchange {
            message: message.to_string(),
        })
    }

    /// [`Self::begin_submit`] with the pending input.
    pub fn begin_submit_pending(&mut self) -> Option<PendingExchange> {
        let text = self.pending_input.clone();
        self.begin_submit(&text)
    }

    /// Finish an exchange with the client's outcome.
    ///
    /// Appends exactly one assistant turn: the reply, or an error message.
    pub fn complete(
        &mut self,
        exchange: PendingExchange,
        outcome: Result<Reply, ClientError>,
    ) -> ExchangeState {
        if !self.is_awaiting_reply() {
            tracing::warn!(
                pending = exchange.message(),
                "completion received with no exchange in flight"
            );
            return self.state;
        }

        let now = self.clock.now();
        let (turn, state) = match outcome {
            Ok(reply) => (Turn::assistant(reply.reply, now), ExchangeState::Succeeded),
            Err(err) => {
                tracing::debug!(error = %err, "chat exchange failed");
                (
                    Turn::assistant(error_turn_text(&err), now),
                    ExchangeState::Failed,
                )
            }
        };
        self.turns.push(turn);
        self.state = state;
        state
    }

    /// Run one full exchange for `text` through `client`.
    ///
    /// Returns `None` when the submit was ignored.
    pub async fn submit<M>(&mut self, text: &str, client: &M) -> Option<ExchangeState>
    where
        M: MessageClient + ?Sized,
    {
        let exchange = self.begin_submit(text)?;
        let outcome = client.send(exchange.message()).await;
        Some(self.complete(exchange, outcome))
    }

    /// Rows to display, with a typing indicator while a reply is awaited.
    #[must_use]
    pub fn rows(&self) -> Vec<TranscriptRow> {
        let mut rows: Vec<TranscriptRow> = self.turns.iter().map(TranscriptRow::from_turn).collect();
        if self.is_awaiting_reply() {
            rows.push(TranscriptRow::typing_indicator());
        }
        rows
    }
}
