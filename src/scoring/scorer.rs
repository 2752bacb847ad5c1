use tracing::debug;

use crate::embedding::VectorLookup;

use super::error::ScoringError;
use super::types::{ScoreResult, TierThresholds};

/// Cosine similarity with tier classification. Holds no state besides thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityEngine {
    thresholds: TierThresholds,
}

impl SimilarityEngine {
    pub fn new(thresholds: TierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &TierThresholds {
        &self.thresholds
    }

    /// Scores two already-resolved vectors.
    pub fn score_vectors(
        &self,
        word_a: &str,
        vec_a: &[f32],
        word_b: &str,
        vec_b: &[f32],
    ) -> Result<ScoreResult, ScoringError> {
        let similarity = cosine_similarity(word_a, vec_a, word_b, vec_b)?;
        let result = ScoreResult::new(similarity, &self.thresholds);

        debug!(
            word_a,
            word_b,
            similarity,
            tier = %result.tier,
            "Scored pair"
        );

        Ok(result)
    }

    /// Resolves both words through `lookup` and scores them.
    pub async fn score<L: VectorLookup>(
        &self,
        lookup: &L,
        word_a: &str,
        word_b: &str,
    ) -> Result<ScoreResult, ScoringError> {
        let vec_a = lookup.get(word_a).await?;
        let vec_b = lookup.get(word_b).await?;
        self.score_vectors(word_a, &vec_a, word_b, &vec_b)
    }
}

/// `dot(a, b) / (|a| * |b|)`, clamped to `[-1, 1]`.
///
/// Unlike a lenient similarity that maps bad input to `0.0`, every malformed
/// input here is an error so that a corrupt vector never silently lands in Tier1.
pub fn cosine_similarity(
    word_a: &str,
    a: &[f32],
    word_b: &str,
    b: &[f32],
) -> Result<f32, ScoringError> {
    if a.is_empty() {
        return Err(ScoringError::EmptyVector {
            word: word_a.to_string(),
        });
    }
    if b.is_empty() {
        return Err(ScoringError::EmptyVector {
            word: word_b.to_string(),
        });
    }
    if a.len() != b.len() {
        return Err(ScoringError::DimensionMismatch {
            left: word_a.to_string(),
            left_dim: a.len(),
            right: word_b.to_string(),
            right_dim: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || !norm_a.is_finite() {
        return Err(ScoringError::DegenerateVector {
            word: word_a.to_string(),
        });
    }
    if norm_b == 0.0 || !norm_b.is_finite() {
        return Err(ScoringError::DegenerateVector {
            word: word_b.to_string(),
        });
    }

    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}
