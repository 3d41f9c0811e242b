//! stop_process tool — terminate a background process by identifier.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::llm::ToolDefinition;
use crate::process::{ProcessError, ProcessRegistry};
use crate::tools::error::ToolError;
use crate::tools::executor::ToolResult;
use crate::tools::tool::Tool;

// ============================================================================
// Tool struct
// ============================================================================

pub struct StopProcessTool {
    registry: Arc<ProcessRegistry>,
}

impl StopProcessTool {
    pub fn new(registry: Arc<ProcessRegistry>) -> Self {
        Self { registry }
    }
}

#[derive(Debug, Deserialize)]
struct StopProcessArgs {
    process_id: serde_json::Value,
}

/// Normalize the `process_id` argument.
///
/// The schema declares an integer while the manager hands out string
/// identifiers, so both are accepted: a bare integer `n` maps to
/// `process_<n>`.
fn normalize_process_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => n.as_i64().map(|n| format!("process_{}", n)),
        _ => None,
    }
}

// ============================================================================
// Tool trait implementation
// ============================================================================

#[async_trait]
impl Tool for StopProcessTool {
    fn name(&self) -> &str {
        "stop_process"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            "stop_process",
            "Stop a running background process by its ID, as returned by \
             execute_code for long-running executions. The process group is \
             terminated, including any subprocesses it started.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "process_id": {
                        "type": "string",
                        "description": "The ID of the process to stop, e.g. 'process_0'."
                    }
                },
                "required": ["process_id"]
            }),
        )
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError> {
        let args: StopProcessArgs = serde_json::from_str(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let Some(process_id) = normalize_process_id(&args.process_id) else {
            return Err(ToolError::InvalidArguments(
                "process_id must be a string or integer".to_string(),
            ));
        };

        match self.registry.terminate(&process_id) {
            Ok(()) => Ok(ToolResult::ok(format!(
                "Process {} has been stopped.",
                process_id
            ))),
            Err(ProcessError::NotFound(_)) => Ok(ToolResult::error(format!(
                "No running process found with ID {}.",
                process_id
            ))),
            Err(e) => Ok(ToolResult::error(format!(
                "Error stopping process {}: {}",
                process_id, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_accepts_string_ids() {
        let value = serde_json::json!("process_2");
        assert_eq!(normalize_process_id(&value).as_deref(), Some("process_2"));
    }

    #[test]
    fn normalize_maps_integers_to_identifiers() {
        let value = serde_json::json!(7);
        assert_eq!(normalize_process_id(&value).as_deref(), Some("process_7"));
    }

    #[test]
    fn normalize_rejects_other_shapes() {
        assert!(normalize_process_id(&serde_json::json!(["process_0"])).is_none());
        assert!(normalize_process_id(&serde_json::json!(1.5)).is_none());
    }

    #[tokio::test]
    async fn stop_unknown_process_reports_not_found() {
        let tool = StopProcessTool::new(Arc::new(ProcessRegistry::new()));

        let result = tool
            .execute(r#"{"process_id": "process_9"}"#)
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(
            result.content,
            "No running process found with ID process_9."
        );
    }

    #[tokio::test]
    async fn stop_rejects_malformed_arguments() {
        let tool = StopProcessTool::new(Arc::new(ProcessRegistry::new()));
        let err = tool.execute(r#"{"pid": 1}"#).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stop_registered_process_removes_it_and_reports_success() {
        use crate::process::ProcessEntry;

        let registry = Arc::new(ProcessRegistry::new());
        let id = registry.next_process_id();

        let mut cmd = tokio::process::Command::new("sleep");
        cmd.arg("30")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());
        // SAFETY: setsid detaches the child into its own process group.
        unsafe {
            cmd.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }
        registry.insert(ProcessEntry::new(id.clone(), cmd.spawn().unwrap()));

        let tool = StopProcessTool::new(registry.clone());
        let args = serde_json::json!({ "process_id": id });
        let result = tool.execute(&args.to_string()).await.unwrap();

        assert!(result.success);
        assert_eq!(result.content, format!("Process {} has been stopped.", id));
        assert!(!registry.contains(&id));

        // Stopping again reports not-found and leaves the registry alone.
        let again = tool.execute(&args.to_string()).await.unwrap();
        assert!(!again.success);
        assert!(again.content.contains(&id));
    }
}
