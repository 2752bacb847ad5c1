use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info};

use super::error::PoolError;
use super::types::{BucketView, Migration, PoolSnapshot, PoolState};
use crate::catalog::{Catalog, Word};
use crate::scoring::Tier;
use crate::store::WordPair;

#[derive(Debug, Clone, Default)]
struct TierBucket {
    pending: BTreeSet<String>,
    played: BTreeSet<String>,
}

impl TierBucket {
    fn remove(&mut self, word: &str) -> bool {
        self.pending.remove(word) || self.played.remove(word)
    }
}

/// One user's word pool, partitioned into tier buckets.
///
/// Every catalog word lives in exactly one bucket, either still pending
/// (presentable this cycle) or played (scored this cycle). `location` is the
/// authoritative word → tier index and is kept in lockstep with the buckets.
#[derive(Debug)]
pub struct Pool {
    catalog: Arc<Catalog>,
    buckets: [TierBucket; 3],
    location: HashMap<String, Tier>,
    state: PoolState,
    excluded: HashSet<WordPair>,
    round: u32,
}

impl Pool {
    /// Fresh pool: the whole catalog pending in the lowest tier.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let mut pool = Self {
            catalog,
            buckets: Default::default(),
            location: HashMap::new(),
            state: PoolState::Active,
            excluded: HashSet::new(),
            round: 1,
        };
        pool.fill_from_catalog();
        pool
    }

    fn fill_from_catalog(&mut self) {
        self.buckets = Default::default();
        self.location.clear();

        let lowest = Tier::LOWEST;
        for text in self.catalog.texts() {
            self.buckets[lowest.index()].pending.insert(text.to_string());
            self.location.insert(text.to_string(), lowest);
        }
    }

    pub fn state(&self) -> PoolState {
        self.state
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Number of words still presentable this cycle.
    pub fn remaining(&self) -> usize {
        self.buckets.iter().map(|b| b.pending.len()).sum()
    }

    pub fn tier_of(&self, word: &str) -> Option<Tier> {
        self.location.get(word).copied()
    }

    pub fn is_presentable(&self, word: &str) -> bool {
        self.state == PoolState::Active
            && self
                .tier_of(word)
                .is_some_and(|tier| self.buckets[tier.index()].pending.contains(word))
    }

    /// Picks a presentable word uniformly at random, regardless of tier.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&str, PoolError> {
        if self.state != PoolState::Active {
            return Err(PoolError::Exhausted);
        }

        let remaining = self.remaining();
        if remaining == 0 {
            return Err(PoolError::Exhausted);
        }

        let mut choice = rng.gen_range(0..remaining);
        for bucket in &self.buckets {
            if let Some(word) = bucket.pending.iter().nth(choice) {
                return Ok(word);
            }
            choice -= bucket.pending.len();
        }

        Err(PoolError::Exhausted)
    }

    /// Looks up the catalog entry for a word that is presentable right now.
    pub fn presentable_word(&self, word: &str) -> Result<&Word, PoolError> {
        if self.state != PoolState::Active {
            return Err(PoolError::Exhausted);
        }
        if !self.is_presentable(word) {
            return Err(PoolError::WordNotInPool {
                word: word.to_string(),
            });
        }
        self.catalog.get(word).ok_or_else(|| PoolError::WordNotInPool {
            word: word.to_string(),
        })
    }

    /// Moves a scored word from its bucket into the played half of `tier`.
    ///
    /// Validates before touching any bucket, so a failed call leaves the pool unchanged.
    pub fn apply_score(&mut self, word: &str, tier: Tier) -> Result<Migration, PoolError> {
        self.presentable_word(word)?;
        let from = self.tier_of(word).ok_or_else(|| PoolError::WordNotInPool {
            word: word.to_string(),
        })?;

        self.buckets[from.index()].remove(word);
        self.buckets[tier.index()].played.insert(word.to_string());
        self.location.insert(word.to_string(), tier);

        let exhausted = self.remaining() == 0;
        if exhausted {
            self.state = PoolState::Exhausted;
            info!(round = self.round, "Word pool exhausted");
        }

        debug!(word, %from, to = %tier, remaining = self.remaining(), "Word migrated");

        Ok(Migration {
            from,
            to: tier,
            exhausted,
        })
    }

    /// Adds a pair key to this pool's local exclusion set.
    pub fn note_used(&mut self, key: WordPair) {
        self.excluded.insert(key);
    }

    pub fn is_excluded(&self, key: &WordPair) -> bool {
        self.excluded.contains(key)
    }

    pub fn excluded_len(&self) -> usize {
        self.excluded.len()
    }

    /// `Exhausted -> Reloading`.
    pub fn begin_reload(&mut self) -> Result<(), PoolError> {
        if self.state != PoolState::Exhausted {
            return Err(PoolError::InvalidReloadState { state: self.state });
        }
        self.state = PoolState::Reloading;
        Ok(())
    }

    /// `Reloading -> Exhausted`, used when exclusions could not be fetched.
    pub fn abort_reload(&mut self) {
        if self.state == PoolState::Reloading {
            self.state = PoolState::Exhausted;
        }
    }

    /// `Reloading -> Active`: repopulates every word, undifferentiated, from `catalog`.
    ///
    /// `excluded` replaces the local exclusion set; presentation itself ignores it
    /// because exclusion applies to pairs, not words.
    pub fn finish_reload(
        &mut self,
        catalog: Arc<Catalog>,
        excluded: HashSet<WordPair>,
    ) -> Result<(), PoolError> {
        if self.state != PoolState::Reloading {
            return Err(PoolError::InvalidReloadState { state: self.state });
        }

        self.catalog = catalog;
        self.fill_from_catalog();
        self.excluded = excluded;
        self.round += 1;
        self.state = PoolState::Active;

        info!(
            round = self.round,
            words = self.remaining(),
            excluded_pairs = self.excluded.len(),
            "Word pool reloaded"
        );
        Ok(())
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        let buckets: BTreeMap<Tier, BucketView> = Tier::ALL
            .iter()
            .map(|tier| {
                let bucket = &self.buckets[tier.index()];
                (
                    *tier,
                    BucketView {
                        pending: bucket.pending.iter().cloned().collect(),
                        played: bucket.played.iter().cloned().collect(),
                    },
                )
            })
            .collect();

        PoolSnapshot {
            state: self.state,
            round: self.round,
            catalog_version: self.catalog.version(),
            words: self.catalog.len(),
            buckets,
            excluded_pairs: self.excluded.len(),
        }
    }

    /// Checks that every catalog word sits in exactly one bucket and matches `location`.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for tier in Tier::ALL {
            let bucket = &self.buckets[tier.index()];
            if let Some(word) = bucket.pending.intersection(&bucket.played).next() {
                return Err(format!("'{word}' is both pending and played in {tier}"));
            }
            for word in bucket.pending.iter().chain(bucket.played.iter()) {
                if !seen.insert(word.as_str()) {
                    return Err(format!("'{word}' appears in more than one tier"));
                }
                if self.location.get(word) != Some(&tier) {
                    return Err(format!("'{word}' is in {tier} but indexed elsewhere"));
                }
            }
        }

        if seen.len() != self.catalog.len() || self.location.len() != self.catalog.len() {
            return Err(format!(
                "pool holds {} words, catalog has {}",
                seen.len(),
                self.catalog.len()
            ));
        }
        if self.catalog.texts().any(|w| !seen.contains(w)) {
            return Err("catalog word missing from pool".to_string());
        }

        Ok(())
    }
}
