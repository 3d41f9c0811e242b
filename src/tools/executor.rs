//! Tool executor: maps tool-call names to handlers.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::error::ToolError;
use super::tool::Tool;
use crate::llm::{ToolCall, ToolDefinition};

// ============================================================================
// Types
// ============================================================================

/// Result of a tool execution.
///
/// Success and failure both carry a display string for the model; the
/// flag keeps the outcome machine-checkable without parsing the string.
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// Whether the tool succeeded.
    pub success: bool,
    /// Content for LLM consumption.
    pub content: String,
    /// Process identifier assigned by `execute_code`, when applicable.
    ///
    /// Lets the dispatch step check the registry for a still-running
    /// process without parsing `content`.
    pub process: Option<String>,
}

impl ToolResult {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
            process: None,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            success: false,
            content: content.into(),
            process: None,
        }
    }

    pub fn with_process(mut self, id: impl Into<String>) -> Self {
        self.process = Some(id.into());
        self
    }
}

// ============================================================================
// Executor
// ============================================================================

/// Executor for running tools.
#[derive(Default)]
pub struct ToolExecutor {
    /// Tool implementations by name.
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolExecutor {
    /// Create an empty executor; add tools with `register()` or
    /// `register_all()`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single tool.
    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    /// Register multiple tools.
    pub fn register_all(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        for tool in tools {
            self.tools.insert(tool.name().to_string(), tool);
        }
        self
    }

    /// Execute a tool call and return the result.
    pub async fn execute(&self, tool_call: &ToolCall) -> Result<ToolResult, ToolError> {
        let tool_name = &tool_call.function.name;
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| ToolError::UnknownTool(tool_name.clone()))?;

        debug!(
            tool = %tool_name,
            arguments = %tool_call.function.arguments,
            "Executing tool"
        );
        tool.execute(&tool_call.function.arguments).await
    }

    /// Generate tool definitions for the LLM.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    /// Check if any tools are configured.
    pub fn has_tools(&self) -> bool {
        !self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FunctionCall;
    use async_trait::async_trait;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition::function("echo", "Echo arguments", serde_json::json!({"type": "object"}))
        }

        async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::ok(arguments.to_string()))
        }
    }

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            tool_type: "function".to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn execute_dispatches_to_registered_tool() {
        let executor = ToolExecutor::new().register(Arc::new(EchoTool));
        let result = executor.execute(&call("echo", "{\"x\": 1}")).await.unwrap();
        assert!(result.success);
        assert_eq!(result.content, "{\"x\": 1}");
    }

    #[tokio::test]
    async fn execute_returns_unknown_tool_for_unregistered_name() {
        let executor = ToolExecutor::new().register(Arc::new(EchoTool));
        let err = executor.execute(&call("nonexistent", "{}")).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "nonexistent"));
    }

    #[test]
    fn tool_definitions_cover_registered_tools() {
        let executor = ToolExecutor::new().register(Arc::new(EchoTool));
        let defs = executor.tool_definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].function.name, "echo");
        assert!(executor.has_tools());
    }

    #[test]
    fn tool_result_constructors() {
        let ok = ToolResult::ok("done");
        assert!(ok.success);
        assert!(ok.process.is_none());

        let err = ToolResult::error("failed");
        assert!(!err.success);

        let bg = ToolResult::ok("spawned").with_process("process_3");
        assert_eq!(bg.process.as_deref(), Some("process_3"));
    }
}
