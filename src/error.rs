//! Top-level error returned by [`GameEngine`](crate::game::GameEngine) operations.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::embedding::EmbeddingError;
use crate::pool::{PoolError, PoolState};
use crate::scoring::ScoringError;
use crate::store::{StoreError, WordPair};

/// Why a submitted response was rejected before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidResponseReason {
    Empty,
    MultipleWords,
    NoAlphanumeric,
    SameAsPresented,
    UnknownWord,
}

impl InvalidResponseReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "response is empty",
            Self::MultipleWords => "response must be a single word",
            Self::NoAlphanumeric => "response has no letters or digits",
            Self::SameAsPresented => "response repeats the presented word",
            Self::UnknownWord => "response is not a known word",
        }
    }
}

impl std::fmt::Display for InvalidResponseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("unknown word '{word}'")]
    Lookup { word: String },

    #[error("vector for '{word}' is degenerate")]
    DegenerateVector { word: String },

    #[error("invalid response '{response}': {reason}")]
    InvalidResponse {
        response: String,
        reason: InvalidResponseReason,
    },

    #[error("pair {pair} was already played; try a different word")]
    PairAlreadyUsed { pair: WordPair },

    #[error("'{word}' was not presented from the current pool")]
    WordNotInPool { word: String },

    #[error("word pool exhausted; reload required")]
    PoolExhausted,

    #[error("reload is only valid from the exhausted state (pool is {state})")]
    ReloadState { state: PoolState },

    #[error("used-pair store unavailable during {operation}: {reason}")]
    StorageUnavailable {
        operation: &'static str,
        reason: String,
    },

    #[error("vector lookup for '{word}' failed: {reason}")]
    LookupTimeout { word: String, reason: String },

    #[error("no session for user '{user_id}'")]
    SessionNotFound { user_id: String },

    #[error("a response needs the word it answers")]
    MissingPresentedWord,

    #[error(transparent)]
    Scoring(ScoringError),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type GameResult<T> = Result<T, GameError>;

impl GameError {
    /// Stable machine-readable name for the serving layer.
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::Lookup { .. } => "lookup",
            GameError::DegenerateVector { .. } => "degenerate_vector",
            GameError::InvalidResponse { .. } => "invalid_response",
            GameError::PairAlreadyUsed { .. } => "pair_already_used",
            GameError::WordNotInPool { .. } => "word_not_in_pool",
            GameError::PoolExhausted => "pool_exhausted",
            GameError::ReloadState { .. } => "reload_state",
            GameError::StorageUnavailable { .. } => "storage_unavailable",
            GameError::LookupTimeout { .. } => "lookup_timeout",
            GameError::SessionNotFound { .. } => "session_not_found",
            GameError::MissingPresentedWord => "missing_presented_word",
            GameError::Scoring(_) => "scoring",
            GameError::Store(_) => "store",
            GameError::Catalog(_) => "catalog",
            GameError::Internal(_) => "internal",
        }
    }

    /// Infrastructure failures the caller may retry as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GameError::StorageUnavailable { .. } | GameError::LookupTimeout { .. }
        )
    }

    pub(crate) fn invalid_response(response: &str, reason: InvalidResponseReason) -> Self {
        GameError::InvalidResponse {
            response: response.to_string(),
            reason,
        }
    }

    pub(crate) fn from_store(operation: &'static str, err: StoreError) -> Self {
        if err.is_transient() {
            GameError::StorageUnavailable {
                operation,
                reason: err.to_string(),
            }
        } else {
            GameError::Store(err)
        }
    }

    pub(crate) fn from_lookup(word: &str, err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::NotFound { word } => GameError::Lookup { word },
            err if err.is_transient() => GameError::LookupTimeout {
                word: word.to_string(),
                reason: err.to_string(),
            },
            err => GameError::Scoring(ScoringError::Lookup(err)),
        }
    }
}

impl From<PoolError> for GameError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Exhausted => GameError::PoolExhausted,
            PoolError::WordNotInPool { word } => GameError::WordNotInPool { word },
            PoolError::InvalidReloadState { state } => GameError::ReloadState { state },
        }
    }
}

impl From<ScoringError> for GameError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::Lookup(EmbeddingError::NotFound { word }) => GameError::Lookup { word },
            ScoringError::DegenerateVector { word } | ScoringError::EmptyVector { word } => {
                GameError::DegenerateVector { word }
            }
            other => GameError::Scoring(other),
        }
    }
}

impl From<tokio::task::JoinError> for GameError {
    fn from(err: tokio::task::JoinError) -> Self {
        GameError::Internal(err.to_string())
    }
}
