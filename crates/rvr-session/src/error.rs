//! Session-specific error types.

use thiserror::Error;

/// Errors that can occur while saving or loading conversations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Conversation not found: {name}")]
    NotFound { name: String },

    #[error("Invalid conversation name '{name}'")]
    InvalidName { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
