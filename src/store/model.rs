//! Persisted record types.

use rkyv::{Archive, Deserialize, Serialize};

use super::WordPair;

/// One consumed pair for one user, as written to disk.
///
/// # Example
/// ```rust
/// use wordgame::store::{ExclusionRecord, WordPair};
///
/// let record = ExclusionRecord::new("alice", &WordPair::new("sky", "star"), 0);
/// assert_eq!(record.pair(), WordPair::new("sky", "star"));
/// ```
#[derive(Archive, Deserialize, Serialize, Debug, PartialEq, Eq, Clone)]
pub struct ExclusionRecord {
    pub user_id: String,
    pub presented: String,
    pub response: String,
    /// Unix timestamp (seconds) when the pair was recorded.
    pub recorded_at: i64,
}

impl ExclusionRecord {
    pub fn new(user_id: &str, pair: &WordPair, recorded_at: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            presented: pair.presented.clone(),
            response: pair.response.clone(),
            recorded_at,
        }
    }

    pub fn pair(&self) -> WordPair {
        WordPair {
            presented: self.presented.clone(),
            response: self.response.clone(),
        }
    }
}
