//! Frame rendering for the terminal session.
//!
//! Every frame is drawn from [`TranscriptView::rows`], so the typing
//! indicator only appears while a reply is awaited.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::transcript::{Clock, Role, RowKind, TranscriptRow, TranscriptView};

/// Title drawn above the transcript.
pub const TITLE: &str = "Mental Coach";

/// Subtitle drawn under the title.
pub const SUBTITLE: &str = "Your supportive AI companion for mental wellness";

/// Key help drawn on the status line.
pub const KEY_HINT: &str = "[Enter: Send] [Alt+Enter: New line] [Ctrl-c: Quit]";

/// Placeholder shown in an empty input.
pub const PLACEHOLDER: &str = "Type your message...";

/// Input lines shown before the input starts scrolling.
pub const MAX_INPUT_LINES: usize = 8;

const EMPTY_TIME: &str = "     ";

/// Draw the whole session into `frame`.
pub fn render_frame<C: Clock>(frame: &mut Frame, view: &TranscriptView<C>) {
    let area = frame.area();
    let input_lines = view.input_height().min(MAX_INPUT_LINES);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(to_u16(input_lines).saturating_add(2)),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(frame, chunks[0]);
    render_transcript(frame, chunks[1], view);
    render_input(frame, chunks[2], view, input_lines);

    let status = Paragraph::new(KEY_HINT).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(status, chunks[3]);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            TITLE,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(SUBTITLE, Style::default().fg(Color::DarkGray))),
    ]);
    frame.render_widget(header, area);
}

/// Transcript pinned to its newest line.
fn render_transcript<C: Clock>(frame: &mut Frame, area: Rect, view: &TranscriptView<C>) {
    let lines = transcript_lines(&view.rows(), usize::from(area.width));
    let scroll = lines.len().saturating_sub(usize::from(area.height));
    let transcript = Paragraph::new(lines).scroll((to_u16(scroll), 0));
    frame.render_widget(transcript, area);
}

fn render_input<C: Clock>(frame: &mut Frame, area: Rect, view: &TranscriptView<C>, visible: usize) {
    let border = if view.can_send() { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(view.send_label());

    let pending = view.pending_input();
    let input = if pending.is_empty() {
        Paragraph::new(PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
    } else {
        let lines: Vec<Line<'_>> = pending.split('\n').map(Line::from).collect();
        let scroll = lines.len().saturating_sub(visible);
        Paragraph::new(lines).scroll((to_u16(scroll), 0))
    };
    frame.render_widget(input.block(block), area);

    if !view.is_awaiting_reply() {
        let last = pending.rsplit('\n').next().unwrap_or_default();
        let row = view.input_height().min(visible).saturating_sub(1);
        frame.set_cursor_position(Position::new(
            area.x
                .saturating_add(1)
                .saturating_add(to_u16(last.chars().count())),
            area.y.saturating_add(1).saturating_add(to_u16(row)),
        ));
    }
}

/// Lay out rows as `[HH:MM] Label: text`, wrapped to `width` columns.
///
/// Continuation lines are indented under the text.
#[must_use]
pub fn transcript_lines(rows: &[TranscriptRow], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for row in rows {
        let prefix = format!(
            "[{}] {}: ",
            row.time.as_deref().unwrap_or(EMPTY_TIME),
            row.label
        );
        let indent = " ".repeat(prefix.chars().count());
        let text_width = width.saturating_sub(indent.len()).max(1);
        let (label_style, text_style) = row_styles(row);

        let mut lead = prefix;
        for text_line in row.text.split('\n') {
            for piece in wrap(text_line, text_width) {
                lines.push(Line::from(vec![
                    Span::styled(std::mem::replace(&mut lead, indent.clone()), label_style),
                    Span::styled(piece, text_style),
                ]));
            }
        }
    }

    lines
}

fn row_styles(row: &TranscriptRow) -> (Style, Style) {
    if row.kind == RowKind::TypingIndicator {
        let style = Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC);
        return (style, style);
    }
    let label = match row.role {
        Role::User => Style::default().fg(Color::Cyan),
        Role::Assistant => Style::default().fg(Color::Green),
    };
    (label.add_modifier(Modifier::BOLD), Style::default())
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(width).map(|chunk| chunk.iter().collect()).collect()
}

fn to_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};

    use super::*;
    use crate::transcript::Turn;

    fn plain(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn turn_row(text: &str) -> TranscriptRow {
        let instant = Local.with_ymd_and_hms(2024, 1, 15, 9, 5, 0).earliest().unwrap();
        TranscriptRow::from_turn(&Turn::user(text, instant))
    }

    #[test]
    fn test_lines_indent_continuations() {
        let lines = transcript_lines(&[turn_row("a\nb")], 80);
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(text, vec!["[09:05] You: a", "             b"]);
    }

    #[test]
    fn test_long_lines_wrap_under_text() {
        let lines = transcript_lines(&[turn_row("abcdefgh")], 17);
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(text, vec!["[09:05] You: abcd", "             efgh"]);
    }

    #[test]
    fn test_typing_indicator_has_blank_time() {
        let lines = transcript_lines(&[TranscriptRow::typing_indicator()], 80);
        assert_eq!(plain(&lines[0]), "[     ] Coach: ...");
    }
}
