//! Pool manager: per-user tier buckets and the `Active -> Exhausted -> Reloading -> Active` cycle.
//!
//! The pool itself is synchronous and never talks to storage. The game engine
//! gathers everything an operation needs (scores, store answers) first, then
//! calls into the pool to commit, so an error can never leave a half-migrated word.

mod error;
mod manager;
mod types;


pub use error::PoolError;
pub use manager::Pool;
pub use types::{BucketView, Migration, PoolSnapshot, PoolState};
