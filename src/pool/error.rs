use thiserror::Error;

use super::PoolState;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("word pool exhausted; reload required")]
    Exhausted,

    #[error("'{word}' is not presentable in the current pool")]
    WordNotInPool { word: String },

    #[error("reload is only valid from the exhausted state (pool is {state})")]
    InvalidReloadState { state: PoolState },
}
