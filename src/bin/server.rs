//! Rewrite server binary that forwards `/api/*` to the coach backend.
//! Run with: cargo run --bin mental-coach-server

use std::process::ExitCode;

use mental_coach::start_mental_coach;

fn main() -> ExitCode {
    start_mental_coach::run_server()
}
