//! Chat transcript: turns, the submit state machine and display rows.

pub mod clock;
pub mod render;
pub mod turn;
pub mod view;

pub use clock::{Clock, FixedClock, SystemClock};
pub use render::{RowKind, TranscriptRow, format_time};
pub use turn::{Role, Turn};
pub use view::{ERROR_PREFIX, ExchangeState, GREETING, PendingExchange, TranscriptView};
