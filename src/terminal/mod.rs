//! Terminal front end built on ratatui and crossterm.
//!
//! The session owns the view and redraws it from scratch after every input or
//! completion. Input keeps flowing while a reply is awaited, but the input
//! surface is disabled until it resolves, so at most one request is ever in
//! flight.

pub mod input;
pub mod renderer;

pub use input::{Input, key_inputs, line_inputs, map_crossterm_event};
pub use renderer::{SUBTITLE, TITLE, render_frame, transcript_lines};

use std::io;
use std::sync::Arc;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::Stream;
use ratatui::Terminal;
use ratatui::backend::Backend;

use crate::client::{ClientError, MessageClient, Reply};
use crate::transcript::{Clock, PendingExchange, SystemClock, TranscriptView};

/// Message that ends the session when submitted.
pub const QUIT_COMMAND: &str = "/quit";

struct InFlight {
    exchange: PendingExchange,
    reply: BoxFuture<'static, Result<Reply, ClientError>>,
}

enum Event {
    Input(Option<Input>),
    Completed(Result<Reply, ClientError>),
}

enum Step {
    Continue,
    Started(InFlight),
    Quit,
}

/// Terminal session hosting one transcript view.
pub struct TerminalSession<B: Backend, C: Clock = SystemClock> {
    view: TranscriptView<C>,
    client: Arc<dyn MessageClient>,
    terminal: Terminal<B>,
}

impl<B: Backend> TerminalSession<B> {
    /// Session using the wall clock.
    pub fn new(client: Arc<dyn MessageClient>, terminal: Terminal<B>) -> Self {
        Self::with_view(TranscriptView::new(), client, terminal)
    }
}

impl<B: Backend, C: Clock> TerminalSession<B, C> {
    /// Session around an existing (unmounted) view.
    pub fn with_view(
        view: TranscriptView<C>,
        client: Arc<dyn MessageClient>,
        terminal: Terminal<B>,
    ) -> Self {
        Self {
            view,
            client,
            terminal,
        }
    }

    /// The hosted view.
    pub const fn view(&self) -> &TranscriptView<C> {
        &self.view
    }

    /// The terminal the session draws on.
    pub const fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    /// Run until quit or end of input.
    ///
    /// On end of input with a reply in flight, waits for it first.
    ///
    /// # Errors
    /// Returns an error if drawing to the terminal fails.
    pub async fn run<S>(&mut self, inputs: S) -> io::Result<()>
    where
        S: Stream<Item = Input>,
    {
        let mut inputs = std::pin::pin!(inputs);

        self.view.mount();
        self.draw()?;

        let mut inflight: Option<InFlight> = None;
        let mut input_closed = false;

        loop {
            let event = match inflight.as_mut() {
                Some(flight) => tokio::select! {
                    biased;
                    outcome = &mut flight.reply => Event::Completed(outcome),
                    input = inputs.next(), if !input_closed => Event::Input(input),
                },
                None => Event::Input(inputs.next().await),
            };

            match event {
                Event::Completed(outcome) => {
                    if let Some(flight) = inflight.take() {
                        self.view.complete(flight.exchange, outcome);
                    }
                    if input_closed {
                        break;
                    }
                }
                Event::Input(None) => {
                    if inflight.is_none() {
                        break;
                    }
                    input_closed = true;
                }
                Event::Input(Some(input)) => match self.handle(input) {
                    Step::Continue => {}
                    Step::Started(flight) => inflight = Some(flight),
                    Step::Quit => break,
                },
            }

            self.draw()?;
        }

        self.draw()
    }

    /// Apply one input to the view.
    fn handle(&mut self, input: Input) -> Step {
        match input {
            Input::Quit => Step::Quit,
            Input::Redraw => Step::Continue,
            // Input surface is disabled while a reply is awaited.
            _ if self.view.is_awaiting_reply() => Step::Continue,
            Input::Text(text) => {
                self.view.insert_text(&text);
                Step::Continue
            }
            Input::Newline => {
                self.view.insert_newline();
                Step::Continue
            }
            Input::Backspace => {
                self.view.delete_char();
                Step::Continue
            }
            Input::Submit => {
                if self.view.pending_input().trim() == QUIT_COMMAND {
                    return Step::Quit;
                }
                self.view
                    .begin_submit_pending()
                    .map_or(Step::Continue, |exchange| Step::Started(self.dispatch(exchange)))
            }
        }
    }

    fn dispatch(&self, exchange: PendingExchange) -> InFlight {
        let client = Arc::clone(&self.client);
        let message = exchange.message().to_string();
        InFlight {
            exchange,
            reply: Box::pin(async move { client.send(&message).await }),
        }
    }

    fn draw(&mut self) -> io::Result<()> {
        let view = &self.view;
        self.terminal.draw(|frame| render_frame(frame, view))?;
        Ok(())
    }
}

/// Raw mode on the alternate screen, restored on drop.
#[derive(Debug)]
pub struct ScreenGuard(());

impl ScreenGuard {
    /// Enter raw mode and the alternate screen.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be switched.
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = Self(());
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{Local, TimeZone};
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Cell;

    use super::*;
    use crate::transcript::{FixedClock, GREETING, Role};

    struct SlowEcho {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl SlowEcho {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
            })
        }
    }

    #[async_trait]
    impl MessageClient for SlowEcho {
        async fn send(&self, message: &str) -> Result<Reply, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(Reply::new(format!("echo: {message}")))
        }
    }

    fn fixed_view() -> TranscriptView<FixedClock> {
        let instant = Local.with_ymd_and_hms(2024, 1, 15, 9, 5, 0).earliest().unwrap();
        TranscriptView::with_clock(FixedClock(instant))
    }

    fn session(client: Arc<SlowEcho>) -> TerminalSession<TestBackend, FixedClock> {
        let terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        TerminalSession::with_view(fixed_view(), client, terminal)
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = usize::from(buffer.area.width);
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(Cell::symbol).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn text(text: &str) -> Input {
        Input::Text(text.to_string())
    }

    #[tokio::test]
    async fn test_session_renders_exchange() {
        let client = SlowEcho::new(Duration::ZERO);
        let mut session = session(Arc::clone(&client));

        session.run(line_inputs(&b"hello coach\n"[..])).await.unwrap();

        let turns = session.view().turns();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content(), GREETING);
        assert_eq!(turns[2].content(), "echo: hello coach");

        let output = screen(session.terminal());
        assert!(output.starts_with(TITLE));
        assert!(output.contains(SUBTITLE));
        assert!(output.contains("[09:05] Coach: Hello! I'm your mental coach."));
        assert!(output.contains("[09:05] You: hello coach"));
        assert!(output.contains("[09:05] Coach: echo: hello coach"));
    }

    #[tokio::test]
    async fn test_typing_indicator_is_removed_after_reply() {
        let client = SlowEcho::new(Duration::from_millis(20));
        let mut session = session(Arc::clone(&client));

        session.run(line_inputs(&b"hi\n"[..])).await.unwrap();

        assert!(!session.view().is_awaiting_reply());
        let output = screen(session.terminal());
        assert!(output.contains("Coach: echo: hi"));
        assert!(!output.contains("Coach: ..."));
    }

    #[test]
    fn test_typing_indicator_shown_while_awaiting() {
        let mut view = fixed_view();
        view.mount();
        let exchange = view.begin_submit("hi").unwrap();
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();

        terminal.draw(|frame| render_frame(frame, &view)).unwrap();
        let output = screen(&terminal);
        assert!(output.contains("[     ] Coach: ..."));
        assert!(output.contains("Sending..."));

        view.complete(exchange, Ok(Reply::new("hello")));
        terminal.draw(|frame| render_frame(frame, &view)).unwrap();
        let output = screen(&terminal);
        assert!(!output.contains("Coach: ..."));
        assert!(output.contains("[09:05] Coach: hello"));
    }

    #[tokio::test]
    async fn test_lines_during_reply_are_ignored() {
        let client = SlowEcho::new(Duration::from_millis(50));
        let mut session = session(Arc::clone(&client));

        session.run(line_inputs(&b"first\nsecond\n"[..])).await.unwrap();

        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        let turns = session.view().turns();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1].content(), "first");
        assert_eq!(turns[2].role(), Role::Assistant);
        assert!(session.view().pending_input().is_empty());
    }

    #[tokio::test]
    async fn test_newline_grows_the_input() {
        let client = SlowEcho::new(Duration::ZERO);
        let mut session = session(Arc::clone(&client));
        let inputs = futures::stream::iter(vec![
            text("line one"),
            Input::Newline,
            text("line two"),
            Input::Newline,
            text("line 3"),
        ]);

        session.run(inputs).await.unwrap();

        assert_eq!(session.view().input_height(), 3);
        let output = screen(session.terminal());
        assert!(output.contains("line one"));
        assert!(output.contains("line two"));
        assert!(output.contains("line 3"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_continuation_builds_multiline_message() {
        let client = SlowEcho::new(Duration::ZERO);
        let mut session = session(Arc::clone(&client));

        session.run(line_inputs(&b"line one\\\nline two\n"[..])).await.unwrap();

        assert_eq!(session.view().turns()[1].content(), "line one\nline two");
    }

    #[tokio::test]
    async fn test_backspace_edits_pending_input() {
        let client = SlowEcho::new(Duration::ZERO);
        let mut session = session(Arc::clone(&client));
        let inputs = futures::stream::iter(vec![text("hey!"), Input::Backspace, Input::Submit]);

        session.run(inputs).await.unwrap();

        assert_eq!(session.view().turns()[1].content(), "hey");
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_session() {
        let client = SlowEcho::new(Duration::ZERO);
        let mut session = session(Arc::clone(&client));

        let result = session.run(line_inputs(&b"\xff\xfe\nhello\n"[..])).await;

        assert!(result.is_ok());
        let turns = session.view().turns();
        assert_eq!(turns.len(), 5);
        assert_eq!(turns[1].content(), "\u{FFFD}\u{FFFD}");
        assert_eq!(turns[3].content(), "hello");
        assert_eq!(turns[4].content(), "echo: hello");
    }

    #[tokio::test]
    async fn test_blank_lines_and_quit() {
        let client = SlowEcho::new(Duration::ZERO);
        let mut session = session(Arc::clone(&client));

        session
            .run(line_inputs(&b"\n   \n/quit\nnever sent\n"[..]))
            .await
            .unwrap();

        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.view().turns().len(), 1);
    }

    #[tokio::test]
    async fn test_quit_key_leaves_with_reply_in_flight() {
        let client = SlowEcho::new(Duration::from_secs(60));
        let mut session = session(Arc::clone(&client));
        let inputs = futures::stream::iter(vec![text("hi"), Input::Submit, Input::Quit]);

        session.run(inputs).await.unwrap();

        assert_eq!(session.view().turns().len(), 2);
        assert!(session.view().is_awaiting_reply());
    }
}
