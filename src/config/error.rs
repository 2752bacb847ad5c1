//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric variable could not be parsed.
    #[error("failed to parse {name}='{value}' as a number")]
    InvalidNumber { name: &'static str, value: String },

    /// A boolean variable was not one of the accepted spellings.
    #[error("failed to parse {name}='{value}' as a boolean")]
    InvalidBool { name: &'static str, value: String },

    /// Pair policy was neither `ordered` nor `unordered`.
    #[error("unknown pair policy '{value}' (expected 'ordered' or 'unordered')")]
    InvalidPairPolicy { value: String },

    /// Tier thresholds out of range or out of order.
    #[error("invalid tier thresholds: t_low={t_low}, t_high={t_high} (need -1 <= t_low <= t_high <= 1)")]
    InvalidThresholds { t_low: f32, t_high: f32 },

    /// A timeout was configured as zero.
    #[error("{name} must be greater than zero")]
    ZeroTimeout { name: &'static str },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a file (when a file was expected).
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
