//! Session lifecycle: the conversation driver and history persistence.

mod driver;
pub mod history;

pub use driver::{
    CompletionReason, SessionError, SessionOutcome, TokenTally, run_session,
};
pub use history::HistoryError;
