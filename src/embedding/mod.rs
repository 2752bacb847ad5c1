//! Word → vector lookup.
//!
//! The engine never computes embeddings itself. It asks a [`VectorLookup`] for a
//! word's vector and treats the answer as read-only.
//!
//! - [`StaticVectorTable`] is an in-memory table (optionally parsed from JSON).
//! - [`CachedVectorLookup`] puts a moka cache in front of any other lookup.

mod cached;
mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod table;

#[cfg(test)]
mod tests;

pub use cached::CachedVectorLookup;
pub use error::EmbeddingError;
#[cfg(any(test, feature = "mock"))]
pub use mock::FlakyLookup;
pub use table::StaticVectorTable;

use std::future::Future;
use std::sync::Arc;

/// Shared, immutable embedding vector.
pub type Embedding = Arc<[f32]>;

/// Resolves a word to its embedding vector.
///
/// Implementations must not mutate engine state and should return
/// [`EmbeddingError::NotFound`] for unknown words and
/// [`EmbeddingError::Unavailable`] for transient backend failures.
pub trait VectorLookup: Send + Sync + 'static {
    fn get(&self, word: &str) -> impl Future<Output = Result<Embedding, EmbeddingError>> + Send;
}

impl<L: VectorLookup> VectorLookup for Arc<L> {
    fn get(&self, word: &str) -> impl Future<Output = Result<Embedding, EmbeddingError>> + Send {
        (**self).get(word)
    }
}
