//! Tool trait for extensible tool execution.
//!
//! Each tool is a self-contained struct holding its own dependencies
//! (process registry, working directory), so new tools can be added
//! without touching the executor.

use async_trait::async_trait;

use super::error::ToolError;
use super::executor::ToolResult;
use crate::llm::ToolDefinition;

/// A tool that can be executed by the tool executor.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool.
    fn name(&self) -> &str;

    /// Generate the LLM tool definition for this tool.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given JSON arguments.
    ///
    /// Domain failures (missing file, unknown process) come back as a
    /// `ToolResult` with `success: false`; a `ToolError` is reserved for
    /// malformed arguments and infrastructure failures.
    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError>;
}
