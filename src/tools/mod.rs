//! Tool execution for the agent loop.
//!
//! Tools are self-contained structs implementing the [`Tool`] trait; the
//! executor dispatches model-issued tool calls to them by name.

mod builtins;
mod error;
mod executor;
mod factory;
mod tool;

pub use builtins::execute_code::DEFAULT_EXECUTE_TIMEOUT_SECS;
pub use error::ToolError;
pub use executor::{ToolExecutor, ToolResult};
pub use factory::build_executor;
pub use tool::Tool;
