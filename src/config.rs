//! Configuration loading.
//!
//! YAML file with `${VAR}` environment-variable expansion applied before
//! parsing, so secrets stay out of the file. A missing config file yields
//! defaults.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

use crate::llm::OpenAiProvider;

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("unclosed variable reference '${{' (missing '}}')")]
    UnclosedVarReference,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        let expanded = expand_env_vars(&contents)?;
        Ok(serde_yaml::from_str(&expanded)?)
    }
}

// ============================================================================
// LlmConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key; typically `${OPENAI_API_KEY}` in the file. Falls back to
    /// the `OPENAI_API_KEY` environment variable when absent.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

// ============================================================================
// SessionConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    /// Model round-trip budget per session.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Seconds to wait before an execution is moved to the background.
    #[serde(default = "default_execute_timeout")]
    pub execute_timeout_seconds: u64,
    /// Working directory for code artifacts and the execution environment.
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,
    /// Directory where conversation histories are written at session end.
    #[serde(default = "default_histories_dir")]
    pub histories_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            execute_timeout_seconds: default_execute_timeout(),
            workdir: default_workdir(),
            histories_dir: default_histories_dir(),
        }
    }
}

// ============================================================================
// Private Helpers (Serde Defaults)
// ============================================================================

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    OpenAiProvider::DEFAULT_BASE_URL.to_string()
}

fn default_max_iterations() -> u32 {
    20
}

fn default_execute_timeout() -> u64 {
    crate::tools::DEFAULT_EXECUTE_TIMEOUT_SECS
}

fn default_workdir() -> PathBuf {
    PathBuf::from(".")
}

fn default_histories_dir() -> PathBuf {
    PathBuf::from(".")
}

// ============================================================================
// Env Var Expansion
// ============================================================================

/// Replace `${NAME}` references with environment-variable values.
fn expand_env_vars(contents: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(contents.len());
    let mut rest = contents;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err(ConfigError::UnclosedVarReference);
        };
        let name = &after[..end];
        let value =
            std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        result.push_str(&value);
        rest = &after[end + 1..];
    }
    result.push_str(rest);

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_config_file_yields_defaults() {
        let config = Config::load("/nonexistent/autodev.yaml").await.unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.session.max_iterations, 20);
        assert_eq!(config.session.execute_timeout_seconds, 10);
        assert!(config.llm.api_key.is_none());
    }

    #[tokio::test]
    async fn config_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("autodev.yaml");
        tokio::fs::write(
            &path,
            "llm:\n  model: gpt-4o\nsession:\n  max_iterations: 5\n",
        )
        .await
        .unwrap();

        let config = Config::load(&path).await.unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.session.max_iterations, 5);
        // Untouched fields keep defaults.
        assert_eq!(config.session.execute_timeout_seconds, 10);
    }

    #[test]
    fn expand_env_vars_substitutes_values() {
        // SAFETY: test-only mutation of this process's environment.
        unsafe {
            std::env::set_var("AUTODEV_TEST_KEY", "sk-123");
        }
        let expanded = expand_env_vars("api_key: ${AUTODEV_TEST_KEY}\n").unwrap();
        assert_eq!(expanded, "api_key: sk-123\n");
    }

    #[test]
    fn expand_env_vars_errors_on_missing_variable() {
        let err = expand_env_vars("key: ${AUTODEV_DEFINITELY_UNSET_VAR}").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(name) if name == "AUTODEV_DEFINITELY_UNSET_VAR"));
    }

    #[test]
    fn expand_env_vars_errors_on_unclosed_reference() {
        let err = expand_env_vars("key: ${OOPS").unwrap_err();
        assert!(matches!(err, ConfigError::UnclosedVarReference));
    }

    #[test]
    fn expand_env_vars_passes_plain_text_through() {
        let text = "llm:\n  model: gpt-4o-mini\n";
        assert_eq!(expand_env_vars(text).unwrap(), text);
    }
}
