//! Python execution environment bootstrap.
//!
//! All code execution happens inside a dedicated virtual environment in
//! the working directory. Creating it is a prerequisite step, not part of
//! the dispatch core: failures here are infrastructure failures and abort
//! the session instead of being reported back to the model.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info};

/// Name of the virtual environment directory.
pub const VENV_DIR: &str = "code_execution_env";

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("failed to create virtual environment: {0}")]
    Create(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A ready-to-use execution environment.
#[derive(Debug, Clone)]
pub struct ExecutionEnv {
    pub activate_script: PathBuf,
}

impl ExecutionEnv {
    /// Shell line that activates the environment and runs `artifact`.
    pub fn launch_command(&self, artifact: &Path) -> String {
        if cfg!(windows) {
            format!(
                "\"{}\" && python \"{}\"",
                self.activate_script.display(),
                artifact.display()
            )
        } else {
            format!(
                "source \"{}\" && python3 \"{}\"",
                self.activate_script.display(),
                artifact.display()
            )
        }
    }
}

/// Ensure the execution environment exists under `workdir`, creating it on
/// first use.
pub async fn ensure_environment(workdir: &Path) -> Result<ExecutionEnv, EnvironmentError> {
    let venv_path = workdir.join(VENV_DIR);

    if !venv_path.exists() {
        info!(path = %venv_path.display(), "Creating execution environment");
        let output = tokio::process::Command::new(python_binary())
            .args(["-m", "venv"])
            .arg(&venv_path)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(stderr = %stderr, "venv creation failed");
            return Err(EnvironmentError::Create(stderr));
        }
    }

    Ok(ExecutionEnv {
        activate_script: activate_script(&venv_path),
    })
}

fn python_binary() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

fn activate_script(venv_path: &Path) -> PathBuf {
    if cfg!(windows) {
        venv_path.join("Scripts").join("activate.bat")
    } else {
        venv_path.join("bin").join("activate")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activate_script_lives_inside_venv() {
        let script = activate_script(Path::new("/work/code_execution_env"));
        assert!(script.starts_with("/work/code_execution_env"));
        #[cfg(unix)]
        assert!(script.ends_with("bin/activate"));
    }

    #[cfg(unix)]
    #[test]
    fn launch_command_sources_activate_then_runs_artifact() {
        let env = ExecutionEnv {
            activate_script: PathBuf::from("/work/code_execution_env/bin/activate"),
        };
        let command = env.launch_command(Path::new("/work/process_0.py"));
        assert!(command.starts_with("source \"/work/code_execution_env/bin/activate\""));
        assert!(command.contains("python3 \"/work/process_0.py\""));
    }
}
