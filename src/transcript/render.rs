//! Display rows for the transcript.

use chrono::{DateTime, TimeZone, Timelike};

use super::turn::{Role, Turn};

/// Text shown in the typing-indicator row.
pub const TYPING_INDICATOR: &str = "...";

/// Format a timestamp as zero-padded `HH:MM` wall-clock time.
///
/// Pure function of the instant and its zone, so repeated render passes agree.
#[must_use]
pub fn format_time<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String {
    format!("{:02}:{:02}", timestamp.hour(), timestamp.minute())
}

/// Kind of a rendered row.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RowKind {
    /// A committed turn.
    Turn,
    /// Placeholder shown while a reply is awaited.
    TypingIndicator,
}

/// One rendered line of the transcript.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TranscriptRow {
    /// Row kind.
    pub kind: RowKind,
    /// Author, used for styling.
    pub role: Role,
    /// Author label (`You` or `Coach`).
    pub label: &'static str,
    /// Body text.
    pub text: String,
    /// `HH:MM` time label; absent on the typing indicator.
    pub time: Option<String>,
}

impl TranscriptRow {
    /// Row for a committed turn.
    #[must_use]
    pub fn from_turn(turn: &Turn) -> Self {
        Self {
            kind: RowKind::Turn,
            role: turn.role(),
            label: turn.role().label(),
            text: turn.content().to_string(),
            time: Some(format_time(&turn.timestamp())),
        }
    }

    /// Placeholder row for a reply in flight.
    #[must_use]
    pub fn typing_indicator() -> Self {
        Self {
            kind: RowKind::TypingIndicator,
            role: Role::Assistant,
            label: Role::Assistant.label(),
            text: TYPING_INDICATOR.to_string(),
            time: None,
        }
    }

    /// Whether this is the typing indicator.
    #[must_use]
    pub fn is_typing_indicator(&self) -> bool {
        self.kind == RowKind::TypingIndicator
    }
}
