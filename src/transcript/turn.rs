//! Chat turns and their authors.

use chrono::{DateTime, Local};
use std::fmt;

/// Author of a turn.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    /// The person typing.
    User,
    /// The coach backend.
    Assistant,
}

impl Role {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Label shown next to the turn.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Coach",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One message in the transcript. Immutable once built.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Turn {
    role: Role,
    content: String,
    timestamp: DateTime<Local>,
}

impl Turn {
    /// Build a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp,
        }
    }

    /// Build an assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp,
        }
    }

    /// Author of the turn.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Text of the turn.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// When the turn was created.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
}
