use serde::{Deserialize, Serialize};

use crate::pool::PoolState;
use crate::scoring::Tier;
use crate::store::WordPair;

/// Result of one accepted response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub pair: WordPair,
    pub similarity: f32,
    pub tier: Tier,
    pub points: i32,
    /// `true` if `points` reached the score threshold and were added to `total_score`.
    pub counted: bool,
    pub total_score: f32,
    /// Tier the presented word sat in before this response.
    pub previous_tier: Tier,
    pub pool_exhausted: bool,
    pub round: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadOutcome {
    pub round: u32,
    pub words: usize,
    pub excluded_pairs: usize,
}

/// Answer to [`GameEngine::play`](super::GameEngine::play).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayResult {
    /// No response was submitted; here is a word to answer.
    Next { word: String },
    /// A response was scored. `next_word` is `None` once the pool is exhausted.
    Scored {
        outcome: SubmitOutcome,
        next_word: Option<String>,
    },
}

impl PlayResult {
    pub fn next_word(&self) -> Option<&str> {
        match self {
            PlayResult::Next { word } => Some(word),
            PlayResult::Scored { next_word, .. } => next_word.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub user_id: String,
    pub state: PoolState,
    pub round: u32,
    pub remaining: usize,
    pub accepted: usize,
    pub total_score: f32,
}
