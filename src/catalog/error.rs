use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::EmbeddingError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog is empty")]
    Empty,

    #[error("catalog word '{word}' has no usable embedding: {source}")]
    Embedding {
        word: String,
        #[source]
        source: EmbeddingError,
    },

    #[error("catalog word '{word}' has a zero-magnitude or empty vector")]
    DegenerateWord { word: String },

    #[error("catalog dimension mismatch at '{word}': expected {expected}, got {actual}")]
    DimensionMismatch {
        word: String,
        expected: usize,
        actual: usize,
    },

    #[error("failed to read catalog at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}
