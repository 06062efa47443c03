//! Binary entrypoint for the terminal chat client.

use std::process::ExitCode;

use mental_coach::start_mental_coach;

/// Open a chat session with the coach backend on stdin/stdout.
fn main() -> ExitCode {
    start_mental_coach::run_chat()
}
