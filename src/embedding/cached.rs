use moka::sync::Cache;
use tracing::debug;

use super::error::EmbeddingError;
use super::{Embedding, VectorLookup};

/// Read-through cache in front of another [`VectorLookup`].
///
/// Only successful lookups are cached, so a transient failure or an unknown
/// word is asked again next time.
pub struct CachedVectorLookup<L: VectorLookup> {
    inner: L,
    entries: Cache<String, Embedding>,
}

impl<L: VectorLookup> CachedVectorLookup<L> {
    pub const DEFAULT_CAPACITY: u64 = 50_000;

    pub fn new(inner: L) -> Self {
        Self::with_capacity(inner, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: L, capacity: u64) -> Self {
        Self {
            inner,
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    pub fn cached_len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl<L: VectorLookup> VectorLookup for CachedVectorLookup<L> {
    async fn get(&self, word: &str) -> Result<Embedding, EmbeddingError> {
        let key = word.trim().to_lowercase();
        if let Some(hit) = self.entries.get(&key) {
            return Ok(hit);
        }

        debug!(word = %key, "Vector cache miss");
        let vector = self.inner.get(&key).await?;
        self.entries.insert(key, vector.clone());
        Ok(vector)
    }
}

impl<L: VectorLookup> std::fmt::Debug for CachedVectorLookup<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedVectorLookup")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}
