use thiserror::Error;

use crate::environment::EnvironmentError;

/// Errors surfaced by tool lookup and execution.
///
/// Everything except `Environment` is rendered into a tool-result string
/// by the dispatch step and fed back to the model; environment failures
/// abort the session.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Environment(#[from] EnvironmentError),
}
