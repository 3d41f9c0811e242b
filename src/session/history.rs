//! Conversation-history persistence.
//!
//! The full message sequence of a session is serialized to a
//! timestamp-named JSON artifact when the session terminates. There is no
//! read path; the artifact is for inspection only.

use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::info;

use crate::llm::Message;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to write history: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persist the conversation to `conversation_history_<timestamp>.json`.
///
/// Returns the path of the written artifact.
pub async fn save(messages: &[Message], dir: &Path) -> Result<PathBuf, HistoryError> {
    let timestamp = Local::now().format("%Y-%m-%d_%H%M%S");
    let path = dir.join(format!("conversation_history_{}.json", timestamp));

    let json = serde_json::to_string_pretty(messages)?;
    tokio::fs::write(&path, json).await?;

    info!(path = %path.display(), messages = messages.len(), "Saved conversation history");
    Ok(path)
}
