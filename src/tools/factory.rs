//! Assembly of the fixed tool set for a session.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::builtins::execute_code::ExecuteCodeTool;
use super::builtins::files::{
    CreateFileTool, CreateFolderTool, ListFilesTool, ReadFileTool, UpdateFileTool,
};
use super::builtins::stop_process::StopProcessTool;
use super::executor::ToolExecutor;
use crate::process::ProcessRegistry;

/// Build the executor with the full tool set for one session.
///
/// The registry is shared between `execute_code` (inserts) and
/// `stop_process` (removes); nothing else touches it.
pub fn build_executor(
    registry: Arc<ProcessRegistry>,
    workdir: PathBuf,
    execute_timeout: Duration,
) -> ToolExecutor {
    ToolExecutor::new().register_all(vec![
        Arc::new(CreateFileTool),
        Arc::new(CreateFolderTool),
        Arc::new(ListFilesTool),
        Arc::new(ReadFileTool),
        Arc::new(UpdateFileTool),
        Arc::new(ExecuteCodeTool::new(
            registry.clone(),
            workdir,
            execute_timeout,
        )),
        Arc::new(StopProcessTool::new(registry)),
    ])
}
