use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Errors that can occur during tool execution.
///
/// These never abort the agent loop; they travel back to the model inside
/// a [`ToolResult`](crate::ToolResult).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ToolError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("no such file or directory: {0}")]
    NotFound(String),
    #[error("is a directory: {0}")]
    IsADirectory(String),
    #[error("no match: {0}")]
    NoMatch(String),
    #[error("io error: {0}")]
    Io(String),
}

impl ToolError {
    /// Classify an I/O failure on `path`.
    pub(crate) fn io(path: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_string()),
            io::ErrorKind::IsADirectory => Self::IsADirectory(path.to_string()),
            _ => Self::Io(format!("{path}: {err}")),
        }
    }
}
