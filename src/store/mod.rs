//! Used-pair store: which `(presented, response)` pairs each user has already consumed.
//!
//! The store is the source of truth for the "no repeated pair after reload" rule,
//! so callers must never fall back to skipping it when it is unavailable.
//!
//! - [`InMemoryUsedPairStore`] keeps everything in a map (tests, ephemeral runs).
//! - [`FileUsedPairStore`] appends to one rkyv log per user and survives restarts.
//!
//! Stores are policy-agnostic: callers pass pairs already keyed with
//! [`WordPair::key`] for their [`PairPolicy`].

pub mod error;
mod file;
mod memory;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod model;


pub use error::{StoreError, StoreResult};
pub use file::FileUsedPairStore;
pub use memory::InMemoryUsedPairStore;
#[cfg(any(test, feature = "mock"))]
pub use mock::FlakyStore;
pub use model::{ArchivedExclusionRecord, ExclusionRecord};

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A `(presented, response)` pair. Both sides are trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WordPair {
    pub presented: String,
    pub response: String,
}

impl WordPair {
    pub fn new(presented: &str, response: &str) -> Self {
        Self {
            presented: presented.trim().to_lowercase(),
            response: response.trim().to_lowercase(),
        }
    }

    /// Returns the exclusion key for `policy`.
    ///
    /// Ordered keys are the pair itself. Unordered keys sort the two words so
    /// `(star, sky)` and `(sky, star)` collide.
    pub fn key(&self, policy: PairPolicy) -> WordPair {
        match policy {
            PairPolicy::Ordered => self.clone(),
            PairPolicy::Unordered if self.response < self.presented => WordPair {
                presented: self.response.clone(),
                response: self.presented.clone(),
            },
            PairPolicy::Unordered => self.clone(),
        }
    }
}

impl std::fmt::Display for WordPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.presented, self.response)
    }
}

/// Whether pair direction matters for exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PairPolicy {
    #[default]
    Ordered,
    Unordered,
}

impl std::str::FromStr for PairPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ordered" | "directed" => Ok(Self::Ordered),
            "unordered" | "undirected" => Ok(Self::Unordered),
            _ => Err(format!("Unknown pair policy: {}", s)),
        }
    }
}

/// Persistent per-user set of consumed pairs.
///
/// Implementations must tolerate concurrent calls for different users and
/// repeated calls for the same user. `record_used` is idempotent and returns
/// `true` only when the pair was not already present.
pub trait UsedPairStore: Send + Sync + 'static {
    fn is_used(
        &self,
        user_id: &str,
        pair: &WordPair,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    fn record_used(
        &self,
        user_id: &str,
        pair: &WordPair,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    fn all_used(&self, user_id: &str) -> impl Future<Output = StoreResult<HashSet<WordPair>>> + Send;
}

impl<S: UsedPairStore> UsedPairStore for Arc<S> {
    fn is_used(
        &self,
        user_id: &str,
        pair: &WordPair,
    ) -> impl Future<Output = StoreResult<bool>> + Send {
        (**self).is_used(user_id, pair)
    }

    fn record_used(
        &self,
        user_id: &str,
        pair: &WordPair,
    ) -> impl Future<Output = StoreResult<bool>> + Send {
        (**self).record_used(user_id, pair)
    }

    fn all_used(&self, user_id: &str) -> impl Future<Output = StoreResult<HashSet<WordPair>>> + Send {
        (**self).all_used(user_id)
    }
}
