//! Error types for Scenably

use thiserror::Error;

/// Result type alias using Scenably Error
pub type Result<T> = std::result::Result<T, Error>;

/// Scenably error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session already active: {kind} session {id}")]
    SessionActive { kind: String, id: String },

    #[error("Session not found: {kind} session {id}")]
    SessionNotFound { kind: String, id: String },

    #[error("Invalid scenario code: {0}")]
    InvalidCode(String),

    #[error("Failed to spawn process: {0}")]
    Spawn(String),

    #[error("Operation timeout after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}
