use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::error::EmbeddingError;
use super::{Embedding, VectorLookup};

/// Wraps a lookup and injects failures or latency.
#[derive(Debug)]
pub struct FlakyLookup<L: VectorLookup> {
    inner: L,
    failures_remaining: AtomicUsize,
    delay_ms: AtomicU64,
    calls: AtomicUsize,
}

impl<L: VectorLookup> FlakyLookup<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            failures_remaining: AtomicUsize::new(0),
            delay_ms: AtomicU64::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// The next `n` lookups fail with [`EmbeddingError::Unavailable`].
    pub fn fail_next(&self, n: usize) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<L: VectorLookup> VectorLookup for FlakyLookup<L> {
    async fn get(&self, word: &str) -> Result<Embedding, EmbeddingError> {
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
            return Err(EmbeddingError::Unavailable {
                reason: "injected failure".to_string(),
            });
        }

        self.inner.get(word).await
    }
}
