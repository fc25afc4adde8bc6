//! Error type shared by the storage, remote and facade layers.
//!
//! Most variants never reach the user: read paths downgrade them to local or
//! seed data. Only [`ConsoleError::Validation`] and remote sheet-write failures
//! are surfaced by the facade.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("request to {path} failed with status {status}")]
    Status { path: String, status: u16 },
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("{0}")]
    Validation(String),
    #[error("config error: {0}")]
    Config(String),
}

impl ConsoleError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ConsoleError::Validation(msg.into())
    }

    /// True for failures caused by the remote side (network, status, payload).
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ConsoleError::Transport(_) | ConsoleError::Status { .. } | ConsoleError::Malformed(_)
        )
    }
}
