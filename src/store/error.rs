use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("used-pair store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt used-pair log at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Returns `true` for failures worth one retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. } | StoreError::Io { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
