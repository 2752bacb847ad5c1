//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `WORDGAME_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::scoring::TierThresholds;
use crate::store::PairPolicy;

/// Default lookup / storage timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 2_000;
/// Default idle time before a session is reaped.
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;
/// Default points a response must reach to count towards the running score.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 1.5;
/// Default capacity of the response-word vector cache.
pub const DEFAULT_VECTOR_CACHE_CAPACITY: u64 = 50_000;

/// Engine configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `WORDGAME_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for the file-backed used-pair store. Default: `./.data`.
    pub storage_path: PathBuf,

    /// JSON array of catalog words (read by the binary).
    pub catalog_path: Option<PathBuf>,

    /// JSON object mapping words to vectors (read by the binary).
    pub vectors_path: Option<PathBuf>,

    /// Similarity cut-offs for Tier2 / Tier3. Default: `0.4` / `0.8`.
    pub thresholds: TierThresholds,

    /// Points needed for a response to add to the running score. Default: `1.5`.
    pub score_threshold: f32,

    /// Per-call vector lookup timeout.
    pub lookup_timeout: Duration,

    /// Per-call used-pair store timeout.
    pub storage_timeout: Duration,

    /// Idle time before a session is dropped. `None` disables the reaper.
    pub session_idle_timeout: Option<Duration>,

    /// Whether exclusion keys care about pair direction. Default: ordered.
    pub pair_policy: PairPolicy,

    /// Reload automatically from `play` when the pool runs out. Default: `false`.
    pub auto_reload: bool,

    /// Fixed selection seed (tests and replays).
    pub seed: Option<u64>,

    /// Max response-word vectors kept in the lookup cache.
    pub vector_cache_capacity: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./.data"),
            catalog_path: None,
            vectors_path: None,
            thresholds: TierThresholds::default(),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            lookup_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            storage_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            session_idle_timeout: Some(Duration::from_secs(DEFAULT_SESSION_IDLE_SECS)),
            pair_policy: PairPolicy::default(),
            auto_reload: false,
            seed: None,
            vector_cache_capacity: DEFAULT_VECTOR_CACHE_CAPACITY,
        }
    }
}

impl Config {
    const ENV_STORAGE_PATH: &'static str = "WORDGAME_STORAGE_PATH";
    const ENV_CATALOG_PATH: &'static str = "WORDGAME_CATALOG_PATH";
    const ENV_VECTORS_PATH: &'static str = "WORDGAME_VECTORS_PATH";
    const ENV_T_LOW: &'static str = "WORDGAME_T_LOW";
    const ENV_T_HIGH: &'static str = "WORDGAME_T_HIGH";
    const ENV_SCORE_THRESHOLD: &'static str = "WORDGAME_SCORE_THRESHOLD";
    const ENV_LOOKUP_TIMEOUT_MS: &'static str = "WORDGAME_LOOKUP_TIMEOUT_MS";
    const ENV_STORAGE_TIMEOUT_MS: &'static str = "WORDGAME_STORAGE_TIMEOUT_MS";
    const ENV_SESSION_IDLE_SECS: &'static str = "WORDGAME_SESSION_IDLE_SECS";
    const ENV_PAIR_POLICY: &'static str = "WORDGAME_PAIR_POLICY";
    const ENV_AUTO_RELOAD: &'static str = "WORDGAME_AUTO_RELOAD";
    const ENV_SEED: &'static str = "WORDGAME_SEED";
    const ENV_VECTOR_CACHE_CAPACITY: &'static str = "WORDGAME_VECTOR_CACHE_CAPACITY";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let storage_path = Self::parse_path_from_env(Self::ENV_STORAGE_PATH, defaults.storage_path);
        let catalog_path = Self::parse_optional_path_from_env(Self::ENV_CATALOG_PATH);
        let vectors_path = Self::parse_optional_path_from_env(Self::ENV_VECTORS_PATH);

        let t_low = Self::parse_f32_from_env(Self::ENV_T_LOW, defaults.thresholds.t_low)?;
        let t_high = Self::parse_f32_from_env(Self::ENV_T_HIGH, defaults.thresholds.t_high)?;
        let score_threshold =
            Self::parse_f32_from_env(Self::ENV_SCORE_THRESHOLD, defaults.score_threshold)?;

        let lookup_timeout = Self::parse_u64_from_env(Self::ENV_LOOKUP_TIMEOUT_MS)?
            .map(Duration::from_millis)
            .unwrap_or(defaults.lookup_timeout);
        let storage_timeout = Self::parse_u64_from_env(Self::ENV_STORAGE_TIMEOUT_MS)?
            .map(Duration::from_millis)
            .unwrap_or(defaults.storage_timeout);
        let session_idle_timeout = match Self::parse_u64_from_env(Self::ENV_SESSION_IDLE_SECS)? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.session_idle_timeout,
        };

        let pair_policy = match env::var(Self::ENV_PAIR_POLICY) {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidPairPolicy { value })?,
            Err(_) => defaults.pair_policy,
        };

        let auto_reload = Self::parse_bool_from_env(Self::ENV_AUTO_RELOAD, defaults.auto_reload)?;
        let seed = Self::parse_u64_from_env(Self::ENV_SEED)?;
        let vector_cache_capacity = Self::parse_u64_from_env(Self::ENV_VECTOR_CACHE_CAPACITY)?
            .unwrap_or(defaults.vector_cache_capacity);

        Ok(Self {
            storage_path,
            catalog_path,
            vectors_path,
            thresholds: TierThresholds { t_low, t_high },
            score_threshold,
            lookup_timeout,
            storage_timeout,
            session_idle_timeout,
            pair_policy,
            auto_reload,
            seed,
            vector_cache_capacity,
        })
    }

    /// Validates thresholds, timeouts and paths (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.thresholds.is_valid() {
            return Err(ConfigError::InvalidThresholds {
                t_low: self.thresholds.t_low,
                t_high: self.thresholds.t_high,
            });
        }

        if self.lookup_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout {
                name: Self::ENV_LOOKUP_TIMEOUT_MS,
            });
        }
        if self.storage_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout {
                name: Self::ENV_STORAGE_TIMEOUT_MS,
            });
        }

        if self.storage_path.exists() && !self.storage_path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.storage_path.clone(),
            });
        }

        for path in [&self.catalog_path, &self.vectors_path].into_iter().flatten() {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        Ok(())
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_f32_from_env(var_name: &'static str, default: f32) -> Result<f32, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or(ConfigError::InvalidNumber {
                    name: var_name,
                    value,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_u64_from_env(var_name: &'static str) -> Result<Option<u64>, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidNumber {
                    name: var_name,
                    value,
                }),
            Err(_) => Ok(None),
        }
    }

    fn parse_bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match env::var(var_name) {
            Ok(value) => match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidBool {
                    name: var_name,
                    value,
                }),
            },
            Err(_) => Ok(default),
        }
    }
}
