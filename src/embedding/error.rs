use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("no embedding for word '{word}'")]
    NotFound { word: String },

    #[error("vector lookup unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("invalid vector for '{word}': {reason}")]
    InvalidVector { word: String, reason: String },

    #[error("embedding dimension mismatch for '{word}': expected {expected}, got {actual}")]
    DimensionMismatch {
        word: String,
        expected: usize,
        actual: usize,
    },

    #[error("failed to read vector table at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse vector table: {0}")]
    Parse(#[from] serde_json::Error),
}

impl EmbeddingError {
    /// Returns `true` for infrastructure failures that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, EmbeddingError::Unavailable { .. })
    }
}
