use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::scoring::Tier;

/// Lifecycle of one user's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolState {
    /// At least one word is presentable.
    Active,
    /// Every word has been scored this cycle; only `reload` is valid.
    Exhausted,
    /// A reload is collecting exclusions. Only visible to the reloading task.
    Reloading,
}

impl PoolState {
    pub fn as_str(self) -> &'static str {
        match self {
            PoolState::Active => "active",
            PoolState::Exhausted => "exhausted",
            PoolState::Reloading => "reloading",
        }
    }
}

impl std::fmt::Display for PoolState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of moving a scored word between tier buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    pub from: Tier,
    pub to: Tier,
    /// `true` if this migration consumed the last presentable word.
    pub exhausted: bool,
}

/// Contents of one tier bucket, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketView {
    /// Words still presentable this cycle.
    pub pending: Vec<String>,
    /// Words scored this cycle into this tier.
    pub played: Vec<String>,
}

/// Point-in-time copy of a pool, for inspection and comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub state: PoolState,
    pub round: u32,
    pub catalog_version: u64,
    /// Size of the catalog the pool was filled from.
    pub words: usize,
    pub buckets: BTreeMap<Tier, BucketView>,
    pub excluded_pairs: usize,
}

impl PoolSnapshot {
    pub fn remaining(&self) -> usize {
        self.buckets.values().map(|b| b.pending.len()).sum()
    }

    /// Checks that every catalog word sits in exactly one bucket half and
    /// that the state agrees with the pending count.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for (tier, bucket) in &self.buckets {
            for word in bucket.pending.iter().chain(bucket.played.iter()) {
                if !seen.insert(word.as_str()) {
                    return Err(format!("'{word}' appears more than once (last in {tier})"));
                }
            }
        }
        if seen.len() != self.words {
            return Err(format!(
                "pool holds {} words, catalog has {}",
                seen.len(),
                self.words
            ));
        }

        match (self.state, self.remaining()) {
            (PoolState::Active, 0) => Err("active pool with nothing pending".to_string()),
            (PoolState::Exhausted, n) if n > 0 => Err(format!("exhausted pool with {n} pending")),
            _ => Ok(()),
        }
    }

    /// Returns the tier whose bucket holds `word`, if any.
    pub fn tier_of(&self, word: &str) -> Option<Tier> {
        self.buckets.iter().find_map(|(tier, bucket)| {
            (bucket.pending.iter().any(|w| w == word) || bucket.played.iter().any(|w| w == word))
                .then_some(*tier)
        })
    }
}
