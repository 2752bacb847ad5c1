//! Wordgame library crate (used by the terminal binary and integration tests).
//!
//! # Public API Surface
//!
//! ## Engine
//! - [`GameEngine`] - `next_word`, `submit_response`, `reload`, `play` and session queries
//! - [`GameError`] - error taxonomy returned by every engine operation
//!
//! ## Components
//! - [`SimilarityEngine`], [`Tier`], [`TierThresholds`] - cosine scoring and tier mapping
//! - [`UsedPairStore`], [`InMemoryUsedPairStore`], [`FileUsedPairStore`] - consumed pairs
//! - [`Pool`], [`PoolState`] - per-user tier buckets and the exhaustion / reload cycle
//! - [`SessionRegistry`], [`SessionReaper`] - per-user locking and idle expiry
//! - [`Catalog`], [`CatalogLoader`], [`VectorLookup`] - word data collaborators
//!
//! ## Test/Mock Support
//! Failure-injecting wrappers are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod catalog;
pub mod config;
pub mod embedding;
pub mod error;
pub mod game;
pub mod hashing;
pub mod pool;
pub mod scoring;
pub mod session;
pub mod store;

pub use catalog::{Catalog, CatalogError, CatalogHandle, CatalogLoader, Word, WordListLoader};
pub use config::{Config, ConfigError};
#[cfg(any(test, feature = "mock"))]
pub use embedding::FlakyLookup;
pub use embedding::{
    CachedVectorLookup, Embedding, EmbeddingError, StaticVectorTable, VectorLookup,
};
pub use error::{GameError, GameResult, InvalidResponseReason};
pub use game::{
    GameEngine, PlayResult, ReloadOutcome, SessionSummary, SubmitOutcome, normalize_response,
};
pub use hashing::{hash_user_id, user_seed, user_storage_key};
pub use pool::{BucketView, Migration, Pool, PoolError, PoolSnapshot, PoolState};
pub use scoring::{
    ScoreResult, ScoringError, SimilarityEngine, Tier, TierThresholds, cosine_similarity,
};
pub use session::{HistoryEntry, SessionReaper, SessionRegistry, UserSession};
#[cfg(any(test, feature = "mock"))]
pub use store::FlakyStore;
pub use store::{
    ExclusionRecord, FileUsedPairStore, InMemoryUsedPairStore, PairPolicy, StoreError,
    UsedPairStore, WordPair,
};
