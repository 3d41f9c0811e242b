//! Background process tracking for code launched by the agent.
//!
//! A process that outlives its execution timeout is handed over to the
//! session's [`ProcessRegistry`] and keeps running until the model stops
//! it or the session ends.

mod registry;

pub use registry::{ProcessEntry, ProcessRegistry};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("no running process found with ID {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
