//! Session coordinator: per-user state behind a per-user lock.
//!
//! - [`SessionRegistry`] maps user ids to sessions. Its lock is coarse but only
//!   held to look up or insert a session, never across an operation.
//! - [`UserSession`] owns the user's [`Pool`] behind a `tokio::sync::RwLock`.
//!   Mutations take the write half for their whole duration; reads such as
//!   picking the next word or reading history share the read half.
//! - [`SessionReaper`] drops sessions that have been idle too long.
//!
//! No operation ever takes more than one user's lock.

mod reaper;
mod registry;


pub use reaper::{DEFAULT_REAPER_INTERVAL_SECS, SessionReaper};
pub use registry::SessionRegistry;

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::hashing::user_seed;
use crate::pool::{Pool, PoolError};
use crate::scoring::Tier;
use crate::store::WordPair;

/// One accepted response, as kept in a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub pair: WordPair,
    pub similarity: f32,
    pub tier: Tier,
    pub points: i32,
    /// Whether `points` were added to the running score.
    pub counted: bool,
    pub round: u32,
}

/// Everything a session mutates under its lock.
#[derive(Debug)]
pub struct SessionState {
    pub pool: Pool,
    pub total_score: f32,
    pub history: Vec<HistoryEntry>,
}

impl SessionState {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            total_score: 0.0,
            history: Vec::new(),
        }
    }
}

/// Word selection state: the RNG and the last word it handed out.
struct Presenter {
    rng: StdRng,
    last: Option<String>,
}

/// A single user's session.
pub struct UserSession {
    user_id: String,
    state: RwLock<SessionState>,
    presenter: Mutex<Presenter>,
    last_activity: Mutex<Instant>,
}

impl UserSession {
    /// Creates a session. With `seed`, word selection is reproducible per user.
    pub fn new(user_id: &str, pool: Pool, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(user_seed(seed, user_id)),
            None => StdRng::from_entropy(),
        };
        Self {
            user_id: user_id.to_string(),
            state: RwLock::new(SessionState::new(pool)),
            presenter: Mutex::new(Presenter { rng, last: None }),
            last_activity: Mutex::new(Instant::now()),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Shared access: concurrent with other readers, excluded by any mutation.
    pub async fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.touch();
        self.state.read().await
    }

    /// Exclusive access for one mutating operation.
    pub async fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.touch();
        self.state.write().await
    }

    /// Returns `true` if some operation currently holds the write lock.
    pub fn is_busy(&self) -> bool {
        self.state.try_read().is_err()
    }

    /// Picks the next word from `state` and remembers it as the presented word.
    pub fn pick_word(&self, state: &SessionState) -> Result<String, PoolError> {
        let mut presenter = self.presenter.lock();
        let word = state.pool.pick(&mut presenter.rng)?.to_string();
        presenter.last = Some(word.clone());
        Ok(word)
    }

    /// The word most recently returned by [`UserSession::pick_word`], if still open.
    pub fn presented(&self) -> Option<String> {
        self.presenter.lock().last.clone()
    }

    /// Closes the presented word once a response for it has been accepted.
    pub fn clear_presented(&self) {
        self.presenter.lock().last = None;
    }

    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }
}

impl std::fmt::Debug for UserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSession")
            .field("user_id", &self.user_id)
            .field("idle_for", &self.idle_for())
            .finish()
    }
}
