//! Input events for the terminal session.
//!
//! Two sources feed the same [`Input`] stream: crossterm key events for an
//! interactive terminal, and newline-delimited text for piped stdin.

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::future;
use futures::stream::{self, Stream, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Line suffix that continues the message on the next line in piped input.
pub const CONTINUATION: char = '\\';

/// One editing or control action.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Input {
    /// Text typed or pasted into the input.
    Text(String),
    /// New line inside the message (Alt+Enter, Shift+Enter, Ctrl+J).
    Newline,
    /// Send the message (Enter).
    Submit,
    /// Delete the last character.
    Backspace,
    /// Terminal resized; redraw only.
    Redraw,
    /// Leave the session (Ctrl+C, Ctrl+D, Esc).
    Quit,
}

/// Convert a crossterm event to an [`Input`].
#[must_use]
pub fn map_crossterm_event(event: CrosstermEvent) -> Option<Input> {
    match event {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => map_key(key),
        CrosstermEvent::Paste(text) => Some(Input::Text(text)),
        CrosstermEvent::Resize(..) => Some(Input::Redraw),
        _ => None,
    }
}

fn map_key(key: KeyEvent) -> Option<Input> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c' | 'd') if ctrl => Some(Input::Quit),
        KeyCode::Char('j') if ctrl => Some(Input::Newline),
        KeyCode::Enter if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) => {
            Some(Input::Newline)
        }
        KeyCode::Enter => Some(Input::Submit),
        KeyCode::Backspace => Some(Input::Backspace),
        KeyCode::Esc => Some(Input::Quit),
        KeyCode::Char(c) if !ctrl => Some(Input::Text(c.to_string())),
        _ => None,
    }
}

/// Key events from the controlling terminal.
///
/// A read error ends the session.
pub fn key_inputs() -> impl Stream<Item = Input> {
    EventStream::new().filter_map(|event| {
        future::ready(match event {
            Ok(event) => map_crossterm_event(event),
            Err(e) => {
                tracing::warn!("Terminal event error: {e}");
                Some(Input::Quit)
            }
        })
    })
}

/// Inputs decoded from newline-delimited text.
///
/// Each line is decoded lossily, so bytes that are not UTF-8 become
/// replacement characters instead of ending the session. A line ending in
/// [`CONTINUATION`] continues the message; any other line submits it.
pub fn line_inputs<R>(reader: R) -> impl Stream<Item = Input>
where
    R: AsyncBufRead + Unpin,
{
    stream::unfold(reader, |mut reader| async move {
        let mut buf = Vec::new();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => None,
            Ok(_) => Some((line_to_inputs(&buf), reader)),
            Err(e) => {
                tracing::warn!("Failed to read input: {e}");
                None
            }
        }
    })
    .flat_map(stream::iter)
}

fn line_to_inputs(raw: &[u8]) -> Vec<Input> {
    let decoded = String::from_utf8_lossy(raw);
    let line = decoded.trim_end_matches(['\n', '\r']);
    let (text, end) = match line.strip_suffix(CONTINUATION) {
        Some(partial) => (partial, Input::Newline),
        None => (line, Input::Submit),
    };

    let mut inputs = Vec::with_capacity(2);
    if !text.is_empty() {
        inputs.push(Input::Text(text.to_string()));
    }
    inputs.push(end);
    inputs
}
