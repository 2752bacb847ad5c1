//! Timeout plus a single retry around collaborator calls.
//!
//! Only transient failures (timeouts, unavailability) are retried. After the
//! second failure the error surfaces; nothing here ever substitutes a default.

use std::future::Future;
use std::time::Duration;

use tokio::time;
use tracing::warn;

use crate::embedding::{Embedding, EmbeddingError, VectorLookup};
use crate::error::{GameError, GameResult};
use crate::store::StoreResult;

pub(crate) const MAX_ATTEMPTS: u32 = 2;

pub(crate) async fn store_call<T, F, Fut>(
    operation: &'static str,
    timeout: Duration,
    mut call: F,
) -> GameResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let mut last_reason = String::new();

    for attempt in 1..=MAX_ATTEMPTS {
        match time::timeout(timeout, call()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) if err.is_transient() => {
                warn!(operation, attempt, error = %err, "Used-pair store call failed");
                last_reason = err.to_string();
            }
            Ok(Err(err)) => return Err(GameError::from_store(operation, err)),
            Err(_) => {
                warn!(operation, attempt, ?timeout, "Used-pair store call timed out");
                last_reason = format!("timed out after {timeout:?}");
            }
        }
    }

    Err(GameError::StorageUnavailable {
        operation,
        reason: last_reason,
    })
}

pub(crate) async fn lookup_call<L: VectorLookup>(
    lookup: &L,
    word: &str,
    timeout: Duration,
) -> GameResult<Embedding> {
    let mut last_reason = String::new();

    for attempt in 1..=MAX_ATTEMPTS {
        match time::timeout(timeout, lookup.get(word)).await {
            Ok(Ok(vector)) => return Ok(vector),
            Ok(Err(err @ EmbeddingError::Unavailable { .. })) => {
                warn!(word, attempt, error = %err, "Vector lookup failed");
                last_reason = err.to_string();
            }
            Ok(Err(err)) => return Err(GameError::from_lookup(word, err)),
            Err(_) => {
                warn!(word, attempt, ?timeout, "Vector lookup timed out");
                last_reason = format!("timed out after {timeout:?}");
            }
        }
    }

    Err(GameError::LookupTimeout {
        word: word.to_string(),
        reason: last_reason,
    })
}
