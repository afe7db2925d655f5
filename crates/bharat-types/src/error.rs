use thiserror::Error;

use crate::llm::LlmError;

/// Errors from session store operations (used by the trait in bharat-core).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store operation failed: {0}")]
    Operation(String),
}

/// Errors surfaced by the chat orchestration layer.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Configuration(String),

    #[error(transparent)]
    Upstream(#[from] LlmError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ChatError {
    /// Machine-readable kind, reported alongside the message to clients.
    pub fn kind(&self) -> String {
        match self {
            ChatError::Validation(_) => "validation_error".to_string(),
            ChatError::Configuration(_) => "configuration_error".to_string(),
            ChatError::Upstream(e) => e.kind().to_string(),
            ChatError::Store(_) => "internal_error".to_string(),
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
