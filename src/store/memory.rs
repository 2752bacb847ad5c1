use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use super::error::StoreResult;
use super::model::ExclusionRecord;
use super::{UsedPairStore, WordPair};

#[derive(Debug, Default)]
struct UserPairs {
    pairs: HashSet<WordPair>,
    records: Vec<ExclusionRecord>,
}

/// Non-persistent store backed by a map of per-user sets.
#[derive(Debug, Default)]
pub struct InMemoryUsedPairStore {
    users: RwLock<HashMap<String, UserPairs>>,
}

impl InMemoryUsedPairStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the user's records in insertion order.
    pub fn records(&self, user_id: &str) -> Vec<ExclusionRecord> {
        self.users
            .read()
            .get(user_id)
            .map(|u| u.records.clone())
            .unwrap_or_default()
    }

    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }
}

impl UsedPairStore for InMemoryUsedPairStore {
    async fn is_used(&self, user_id: &str, pair: &WordPair) -> StoreResult<bool> {
        Ok(self
            .users
            .read()
            .get(user_id)
            .is_some_and(|u| u.pairs.contains(pair)))
    }

    async fn record_used(&self, user_id: &str, pair: &WordPair) -> StoreResult<bool> {
        let mut users = self.users.write();
        let user = users.entry(user_id.to_string()).or_default();
        if !user.pairs.insert(pair.clone()) {
            return Ok(false);
        }
        user.records.push(ExclusionRecord::new(
            user_id,
            pair,
            chrono::Utc::now().timestamp(),
        ));
        Ok(true)
    }

    async fn all_used(&self, user_id: &str) -> StoreResult<HashSet<WordPair>> {
        Ok(self
            .users
            .read()
            .get(user_id)
            .map(|u| u.pairs.clone())
            .unwrap_or_default())
    }
}
