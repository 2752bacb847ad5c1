//! Similarity engine: cosine similarity between two word vectors, mapped to a [`Tier`].
//!
//! Scoring is pure. Vectors come either from the caller (the game engine resolves
//! the presented word from its catalog snapshot) or from a [`VectorLookup`]
//! passed to [`SimilarityEngine::score`].
//!
//! [`VectorLookup`]: crate::embedding::VectorLookup

pub mod error;
pub mod scorer;
pub mod types;


pub use error::ScoringError;
pub use scorer::{SimilarityEngine, cosine_similarity};
pub use types::{
    DEFAULT_T_HIGH, DEFAULT_T_LOW, ScoreResult, Tier, TierThresholds, similarity_points,
};
