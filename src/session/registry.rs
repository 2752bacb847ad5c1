use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::UserSession;
use crate::pool::Pool;

/// Map of live sessions keyed by user id.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<UserSession>>>,
    seed: Option<u64>,
}

impl SessionRegistry {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            seed,
        }
    }

    pub fn get(&self, user_id: &str) -> Option<Arc<UserSession>> {
        self.sessions.read().get(user_id).cloned()
    }

    /// Returns the user's session, creating it with `make_pool` on first contact.
    ///
    /// `make_pool` runs at most once per new session and only under the
    /// registry's write lock.
    pub fn get_or_create<F>(&self, user_id: &str, make_pool: F) -> Arc<UserSession>
    where
        F: FnOnce() -> Pool,
    {
        if let Some(existing) = self.get(user_id) {
            return existing;
        }

        let mut sessions = self.sessions.write();
        let session = sessions.entry(user_id.to_string()).or_insert_with(|| {
            debug!(user_id, "Creating session");
            Arc::new(UserSession::new(user_id, make_pool(), self.seed))
        });
        Arc::clone(session)
    }

    /// Drops a session. In-flight operations keep their own reference and finish.
    pub fn remove(&self, user_id: &str) -> bool {
        self.sessions.write().remove(user_id).is_some()
    }

    /// Removes sessions idle for at least `idle_timeout` that nobody is using.
    ///
    /// A session is in use while any operation holds a clone of its `Arc`;
    /// new clones are only handed out under this lock, so the count is stable here.
    pub fn reap_idle(&self, idle_timeout: Duration) -> Vec<String> {
        let mut sessions = self.sessions.write();
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| {
                Arc::strong_count(s) == 1 && !s.is_busy() && s.idle_for() >= idle_timeout
            })
            .map(|(id, _)| id.clone())
            .collect();

        for user_id in &expired {
            sessions.remove(user_id);
        }

        if !expired.is_empty() {
            info!(reaped = expired.len(), remaining = sessions.len(), "Reaped idle sessions");
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn user_ids(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }
}
