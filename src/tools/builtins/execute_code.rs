//! execute_code tool — run Python code with timeout-based backgrounding.
//!
//! The code is written to an artifact named after its process identifier
//! and launched in its own process group inside the execution
//! environment. Completion races a timeout: a process that finishes in
//! time reports its real output and exit code; one that does not is
//! handed to the process registry and keeps running in the background.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::environment;
use crate::llm::ToolDefinition;
use crate::process::{ProcessEntry, ProcessRegistry};
use crate::tools::error::ToolError;
use crate::tools::executor::ToolResult;
use crate::tools::tool::Tool;

/// Default wait before a process is considered long-running.
pub const DEFAULT_EXECUTE_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Tool struct
// ============================================================================

pub struct ExecuteCodeTool {
    registry: Arc<ProcessRegistry>,
    workdir: PathBuf,
    timeout: Duration,
}

impl ExecuteCodeTool {
    pub fn new(registry: Arc<ProcessRegistry>, workdir: PathBuf, timeout: Duration) -> Self {
        Self {
            registry,
            workdir,
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExecuteCodeArgs {
    code: String,
}

// ============================================================================
// Tool trait implementation
// ============================================================================

#[async_trait]
impl Tool for ExecuteCodeTool {
    fn name(&self) -> &str {
        "execute_code"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            "execute_code",
            "Execute Python code in the 'code_execution_env' virtual \
             environment and return its standard output, standard error, \
             and return code. Code that keeps running past the timeout is \
             moved to the background and reported with a process ID that \
             can be passed to stop_process later.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "code": {
                        "type": "string",
                        "description": "The Python code to execute. Include all necessary imports; the code must be complete and self-contained."
                    }
                },
                "required": ["code"]
            }),
        )
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError> {
        let args: ExecuteCodeArgs = serde_json::from_str(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        // Environment failures abort the session rather than being
        // reported to the model (see ToolError).
        let env = environment::ensure_environment(&self.workdir).await?;

        let process_id = self.registry.next_process_id();
        let artifact = self.workdir.join(format!("{}.py", process_id));
        if let Err(e) = tokio::fs::write(&artifact, &args.code).await {
            return Ok(ToolResult::error(format!(
                "Error writing code for execution: {}",
                e
            )));
        }

        let command = env.launch_command(&artifact);
        match run_with_timeout(
            &self.registry,
            &process_id,
            &command,
            &self.workdir,
            self.timeout,
        )
        .await
        {
            Ok(execution) => Ok(execution.render()),
            Err(e) => {
                warn!(id = %process_id, error = %e, "Failed to execute code");
                Ok(ToolResult::error(format!("Error executing code: {}", e)))
            }
        }
    }
}

// ============================================================================
// Execution
// ============================================================================

/// Return code of an execution: a real exit code, or the sentinel for a
/// process still running in the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReturnCode {
    Exited(i32),
    Running,
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnCode::Exited(code) => write!(f, "{}", code),
            ReturnCode::Running => write!(f, "Running"),
        }
    }
}

/// Outcome of one execution attempt.
struct Execution {
    process_id: String,
    stdout: String,
    stderr: String,
    code: ReturnCode,
}

impl Execution {
    fn render(self) -> ToolResult {
        let content = format!(
            "Process ID: {}\n\nStdout:\n{}\n\nStderr:\n{}\n\nReturn Code: {}",
            self.process_id, self.stdout, self.stderr, self.code
        );
        let success = match self.code {
            ReturnCode::Exited(code) => code == 0,
            ReturnCode::Running => true,
        };
        let result = if success {
            ToolResult::ok(content)
        } else {
            ToolResult::error(content)
        };
        result.with_process(self.process_id)
    }
}

/// Launch `command` as a shell child in its own process group and race its
/// completion against `timeout`.
///
/// Output streams are redirected to `<id>.out` / `<id>.err` files so a
/// detached process can keep writing without backpressure. Only a process
/// that outlives the timeout is registered.
async fn run_with_timeout(
    registry: &ProcessRegistry,
    process_id: &str,
    command: &str,
    workdir: &Path,
    timeout: Duration,
) -> std::io::Result<Execution> {
    let out_path = workdir.join(format!("{}.out", process_id));
    let err_path = workdir.join(format!("{}.err", process_id));
    let out_file = std::fs::File::create(&out_path)?;
    let err_file = std::fs::File::create(&err_path)?;

    let mut cmd = if cfg!(windows) {
        let mut c = tokio::process::Command::new("cmd");
        c.args(["/C", command]);
        c
    } else {
        let mut c = tokio::process::Command::new("bash");
        c.args(["-c", command]);
        c
    };
    cmd.current_dir(workdir)
        .stdin(std::process::Stdio::null())
        .stdout(out_file)
        .stderr(err_file);

    // SAFETY: setsid in the forked child makes it the leader of a fresh
    // process group, so the whole group (including anything it spawns)
    // can be signalled as a unit. No shared mutable state is touched.
    #[cfg(unix)]
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }

    let mut child = cmd.spawn()?;
    info!(id = %process_id, pid = ?child.id(), "Launched code execution");

    let status = tokio::select! {
        status = child.wait() => Some(status?),
        _ = tokio::time::sleep(timeout) => None,
    };

    match status {
        Some(status) => {
            let stdout = tokio::fs::read_to_string(&out_path).await.unwrap_or_default();
            let stderr = tokio::fs::read_to_string(&err_path).await.unwrap_or_default();
            Ok(Execution {
                process_id: process_id.to_string(),
                stdout,
                stderr,
                code: ReturnCode::Exited(status.code().unwrap_or(-1)),
            })
        }
        None => {
            info!(id = %process_id, "Execution exceeded timeout, moving to background");
            registry.insert(ProcessEntry::new(process_id.to_string(), child));
            Ok(Execution {
                process_id: process_id.to_string(),
                stdout: "Process started and running in the background.".to_string(),
                stderr: String::new(),
                code: ReturnCode::Running,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[cfg(unix)]
    #[tokio::test]
    async fn fast_command_reports_exit_code_and_output() {
        let dir = TempDir::new().unwrap();
        let registry = ProcessRegistry::new();
        let id = registry.next_process_id();

        let execution = run_with_timeout(
            &registry,
            &id,
            "echo hello; echo oops >&2",
            dir.path(),
            Duration::from_secs(10),
        )
        .await
        .unwrap();

        assert_eq!(execution.code, ReturnCode::Exited(0));
        assert_eq!(execution.stdout.trim(), "hello");
        assert_eq!(execution.stderr.trim(), "oops");
        // Completed executions are never registered.
        assert!(registry.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_renders_unsuccessful_result() {
        let dir = TempDir::new().unwrap();
        let registry = ProcessRegistry::new();
        let id = registry.next_process_id();

        let execution = run_with_timeout(
            &registry,
            &id,
            "exit 3",
            dir.path(),
            Duration::from_secs(10),
        )
        .await
        .unwrap();

        assert_eq!(execution.code, ReturnCode::Exited(3));
        let result = execution.render();
        assert!(!result.success);
        assert!(result.content.contains("Return Code: 3"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_command_is_registered_as_background_process() {
        let dir = TempDir::new().unwrap();
        let registry = ProcessRegistry::new();
        let id = registry.next_process_id();

        let execution = run_with_timeout(
            &registry,
            &id,
            "sleep 30",
            dir.path(),
            Duration::from_millis(200),
        )
        .await
        .unwrap();

        assert_eq!(execution.code, ReturnCode::Running);
        assert!(registry.contains(&id));

        let result = execution.render();
        assert!(result.success);
        assert!(result.content.contains("Return Code: Running"));
        assert!(
            result
                .content
                .contains("Process started and running in the background.")
        );
        assert_eq!(result.process.as_deref(), Some(id.as_str()));

        registry.terminate(&id).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn output_artifacts_are_left_on_disk() {
        let dir = TempDir::new().unwrap();
        let registry = ProcessRegistry::new();
        let id = registry.next_process_id();

        run_with_timeout(&registry, &id, "echo x", dir.path(), Duration::from_secs(10))
            .await
            .unwrap();

        assert!(dir.path().join(format!("{}.out", id)).exists());
        assert!(dir.path().join(format!("{}.err", id)).exists());
    }

    #[test]
    fn render_formats_result_string() {
        let execution = Execution {
            process_id: "process_4".to_string(),
            stdout: "out".to_string(),
            stderr: "err".to_string(),
            code: ReturnCode::Exited(0),
        };

        let result = execution.render();
        assert!(result.success);
        assert_eq!(
            result.content,
            "Process ID: process_4\n\nStdout:\nout\n\nStderr:\nerr\n\nReturn Code: 0"
        );
        assert_eq!(result.process.as_deref(), Some("process_4"));
    }
}
