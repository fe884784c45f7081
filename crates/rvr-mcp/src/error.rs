//! Error types for MCP operations.

use thiserror::Error;

/// Errors from MCP server communication.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Failed to spawn MCP server '{name}': {source}")]
    SpawnFailed {
        name: String,
        source: std::io::Error,
    },

    #[error("MCP server '{name}' is not running")]
    ServerNotRunning { name: String },

    #[error("MCP server '{name}' closed the connection")]
    ConnectionClosed { name: String },

    #[error("MCP request '{method}' timed out after {timeout_ms}ms")]
    Timeout { method: String, timeout_ms: u64 },

    #[error("MCP handshake with '{name}' failed: {message}")]
    HandshakeFailed { name: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    /// Whether the server connection is gone for good.
    pub fn is_connection_lost(&self) -> bool {
        matches!(
            self,
            McpError::ConnectionClosed { .. } | McpError::ServerNotRunning { .. }
        )
    }
}
