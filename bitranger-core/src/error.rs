//! Error types for the context tree and the agent loop.
//!
//! Uses thiserror for ergonomic error definition.

use std::path::PathBuf;

/// Errors from context tree store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The config artifact does not exist yet.
    #[error("bitranger not initialized in {}", root.display())]
    NotInitialized { root: PathBuf },

    /// `initialize` was called on a tree that already has a config artifact.
    #[error("bitranger is already initialized in {}", root.display())]
    AlreadyInitialized { root: PathBuf },

    /// Missing document or project file.
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// A namespace segment or relative path that would leave its root.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Build an `InvalidPath` error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error means the target simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Errors from the relation graph layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelationError {
    /// Token does not match `@domain/topic(/subtopic)?`.
    #[error("Malformed relation: {0}")]
    Malformed(String),
}

/// Errors raised by a reasoning engine.
///
/// Any of these ends an agent run in the failed state; the message is
/// surfaced to the caller verbatim.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("ANTHROPIC_API_KEY not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The model answered without requesting a tool.
    #[error("Reasoning engine returned no tool request")]
    NoToolRequest,

    #[error("Invalid input for tool {tool}: {reason}")]
    InvalidToolInput { tool: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for engine calls
pub type EngineResult<T> = std::result::Result<T, EngineError>;
