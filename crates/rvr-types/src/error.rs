//! Error hierarchy for RVR Chat.

use thiserror::Error;

/// Top-level error type for a chat turn.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("LLM error: {0}")]
    Api(#[from] ApiError),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Errors from the Ollama HTTP API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Model '{model}' not found")]
    ModelNotFound { model: String },

    #[error("Server busy")]
    Overloaded,

    #[error("Server error: {status} {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Stream parse error: {0}")]
    StreamParse(String),

    /// An `error` field reported inside the response stream.
    #[error("{0}")]
    Stream(String),

    #[error("Request timeout")]
    Timeout,
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to write config file {path}: {message}")]
    Write { path: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_convert_into_chat_errors() {
        let err: ChatError = ApiError::ModelNotFound {
            model: "llama3.2".into(),
        }
        .into();
        assert!(matches!(err, ChatError::Api(ApiError::ModelNotFound { .. })));
        assert_eq!(err.to_string(), "LLM error: Model 'llama3.2' not found");
    }
}
