use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::error::{StoreError, StoreResult};
use super::{UsedPairStore, WordPair};

/// Wraps a store and injects failures or latency, for exercising retry paths.
#[derive(Debug)]
pub struct FlakyStore<S: UsedPairStore> {
    inner: S,
    failures_remaining: AtomicUsize,
    delay_ms: AtomicU64,
    calls: AtomicUsize,
}

impl<S: UsedPairStore> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failures_remaining: AtomicUsize::new(0),
            delay_ms: AtomicU64::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// The next `n` calls (of any kind) fail with [`StoreError::Unavailable`].
    pub fn fail_next(&self, n: usize) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    /// Every call sleeps for `delay` before running.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn gate(&self) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let failed = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(StoreError::Unavailable {
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl<S: UsedPairStore> UsedPairStore for FlakyStore<S> {
    async fn is_used(&self, user_id: &str, pair: &WordPair) -> StoreResult<bool> {
        self.gate().await?;
        self.inner.is_used(user_id, pair).await
    }

    async fn record_used(&self, user_id: &str, pair: &WordPair) -> StoreResult<bool> {
        self.gate().await?;
        self.inner.record_used(user_id, pair).await
    }

    async fn all_used(&self, user_id: &str) -> StoreResult<HashSet<WordPair>> {
        self.gate().await?;
        self.inner.all_used(user_id).await
    }
}
