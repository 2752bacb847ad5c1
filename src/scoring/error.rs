use thiserror::Error;

use crate::embedding::EmbeddingError;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("lookup failed: {0}")]
    Lookup(#[from] EmbeddingError),

    #[error("vector for '{word}' has zero magnitude")]
    DegenerateVector { word: String },

    #[error("vector dimensions differ: '{left}' has {left_dim}, '{right}' has {right_dim}")]
    DimensionMismatch {
        left: String,
        left_dim: usize,
        right: String,
        right_dim: usize,
    },

    #[error("vector for '{word}' is empty")]
    EmptyVector { word: String },
}
