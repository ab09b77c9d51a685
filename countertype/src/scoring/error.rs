//! Structured error types for the scoring subsystem.

use std::path::PathBuf;

/// Errors from the profile store and scoring engine.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    /// Failed to read a profile file from disk.
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a profile file to disk.
    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse or produce JSON.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A thread panicked while holding a profile lock.
    #[error("Profile lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result type alias for scoring operations.
pub type ScoringResult<T> = Result<T, ScoringError>;
