use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::response::normalize_response;
use super::retry::{lookup_call, store_call};
use super::types::{PlayResult, ReloadOutcome, SessionSummary, SubmitOutcome};
use crate::catalog::{Catalog, CatalogHandle, CatalogLoader};
use crate::config::Config;
use crate::embedding::{CachedVectorLookup, VectorLookup};
use crate::error::{GameError, GameResult, InvalidResponseReason};
use crate::pool::{Pool, PoolSnapshot, PoolState};
use crate::scoring::{ScoreResult, SimilarityEngine};
use crate::session::{HistoryEntry, SessionReaper, SessionRegistry, SessionState, UserSession};
use crate::store::{UsedPairStore, WordPair};

struct EngineInner<L: VectorLookup, S: UsedPairStore> {
    config: Config,
    lookup: CachedVectorLookup<L>,
    store: S,
    catalog: CatalogHandle,
    sessions: Arc<SessionRegistry>,
    scorer: SimilarityEngine,
    reaper: Mutex<Option<SessionReaper>>,
}

/// Game facade shared by every request.
///
/// Cloning is cheap. Mutating operations (`submit_response`, `reload`) run on
/// their own task: dropping the returned future does not cancel them, so a
/// caller that gives up can never leave a session half-updated.
pub struct GameEngine<L: VectorLookup, S: UsedPairStore> {
    inner: Arc<EngineInner<L, S>>,
}

impl<L: VectorLookup, S: UsedPairStore> Clone for GameEngine<L, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: VectorLookup, S: UsedPairStore> GameEngine<L, S> {
    pub fn new(config: Config, lookup: L, store: S, catalog: Catalog) -> Self {
        let lookup = CachedVectorLookup::with_capacity(lookup, config.vector_cache_capacity);
        let scorer = SimilarityEngine::new(config.thresholds);
        let sessions = Arc::new(SessionRegistry::new(config.seed));

        info!(
            words = catalog.len(),
            t_low = config.thresholds.t_low,
            t_high = config.thresholds.t_high,
            pair_policy = ?config.pair_policy,
            "Game engine ready"
        );

        Self {
            inner: Arc::new(EngineInner {
                config,
                lookup,
                store,
                catalog: CatalogHandle::new(catalog),
                sessions,
                scorer,
                reaper: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn lookup(&self) -> &CachedVectorLookup<L> {
        &self.inner.lookup
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.inner.catalog.snapshot()
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.inner.sessions
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }

    /// Picks the next word to present. Creates the session on first contact.
    pub async fn next_word(&self, user_id: &str) -> GameResult<String> {
        self.inner.next_word(user_id).await
    }

    /// Scores `response` against `presented` and advances the user's pool.
    ///
    /// `presented` must be the word the last `next_word` call returned to this
    /// user; anything else is [`GameError::WordNotInPool`].
    pub async fn submit_response(
        &self,
        user_id: &str,
        presented: &str,
        response: &str,
    ) -> GameResult<SubmitOutcome> {
        let inner = Arc::clone(&self.inner);
        let user_id = user_id.to_string();
        let presented = presented.to_string();
        let response = response.to_string();

        tokio::spawn(async move { inner.submit(&user_id, &presented, &response).await }).await?
    }

    /// Repopulates an exhausted pool, excluding the user's used pairs.
    pub async fn reload(&self, user_id: &str) -> GameResult<ReloadOutcome> {
        let inner = Arc::clone(&self.inner);
        let user_id = user_id.to_string();

        tokio::spawn(async move { inner.reload(&user_id).await }).await?
    }

    /// Single entry point for a serving layer.
    ///
    /// Without a response, returns a word to present. With both words, scores
    /// the response and returns the next word (or `None` once exhausted, unless
    /// auto reload is on). A response without a presented word is rejected.
    pub async fn play(
        &self,
        user_id: &str,
        presented: Option<&str>,
        response: Option<&str>,
    ) -> GameResult<PlayResult> {
        match (presented, response) {
            (Some(presented), Some(response)) => {
                let outcome = self.submit_response(user_id, presented, response).await?;
                let next_word = match self.next_word_or_reload(user_id).await {
                    Ok(word) => Some(word),
                    Err(GameError::PoolExhausted) => None,
                    Err(err) => return Err(err),
                };
                Ok(PlayResult::Scored { outcome, next_word })
            }
            (None, Some(_)) => Err(GameError::MissingPresentedWord),
            (_, None) => Ok(PlayResult::Next {
                word: self.next_word_or_reload(user_id).await?,
            }),
        }
    }

    async fn next_word_or_reload(&self, user_id: &str) -> GameResult<String> {
        match self.next_word(user_id).await {
            Err(GameError::PoolExhausted) if self.inner.config.auto_reload => {
                match self.reload(user_id).await {
                    // Another request reloaded first.
                    Ok(_) | Err(GameError::ReloadState { state: PoolState::Active }) => {}
                    Err(err) => return Err(err),
                }
                self.next_word(user_id).await
            }
            other => other,
        }
    }

    /// Scores two arbitrary words without touching any session.
    pub async fn score_pair(&self, word_a: &str, word_b: &str) -> GameResult<ScoreResult> {
        let timeout = self.inner.config.lookup_timeout;
        let vec_a = lookup_call(&self.inner.lookup, word_a, timeout).await?;
        let vec_b = lookup_call(&self.inner.lookup, word_b, timeout).await?;
        Ok(self
            .inner
            .scorer
            .score_vectors(word_a, &vec_a, word_b, &vec_b)?)
    }

    pub async fn history(&self, user_id: &str) -> GameResult<Vec<HistoryEntry>> {
        let session = self.inner.existing_session(user_id)?;
        let state = session.read().await;
        Ok(state.history.clone())
    }

    pub async fn pool_snapshot(&self, user_id: &str) -> GameResult<PoolSnapshot> {
        let session = self.inner.existing_session(user_id)?;
        let state = session.read().await;
        Ok(state.pool.snapshot())
    }

    pub async fn summary(&self, user_id: &str) -> GameResult<SessionSummary> {
        let session = self.inner.existing_session(user_id)?;
        let state = session.read().await;
        Ok(summarize(user_id, &state))
    }

    /// Drops the user's in-memory session. Used pairs stay in the store.
    pub async fn end_session(&self, user_id: &str) -> GameResult<SessionSummary> {
        let session = self.inner.existing_session(user_id)?;
        let summary = {
            let state = session.read().await;
            summarize(user_id, &state)
        };
        self.inner.sessions.remove(user_id);
        info!(user_id, total_score = summary.total_score, "Session ended");
        Ok(summary)
    }

    /// Swaps the shared catalog. Sessions pick it up on their next reload.
    pub fn replace_catalog(&self, catalog: Catalog) -> u64 {
        self.inner.catalog.replace(catalog)
    }

    pub async fn replace_catalog_from<C: CatalogLoader>(&self, loader: &C) -> GameResult<u64> {
        let catalog = loader.load().await?;
        Ok(self.replace_catalog(catalog))
    }

    /// Starts the idle-session reaper if an idle timeout is configured.
    pub fn start_reaper(&self) -> Option<JoinHandle<()>> {
        let idle_timeout = self.inner.config.session_idle_timeout?;
        let mut slot = self.inner.reaper.lock();
        let reaper = slot
            .get_or_insert_with(|| SessionReaper::new(Arc::clone(&self.inner.sessions), idle_timeout));
        Some(reaper.start())
    }

    pub fn stop_reaper(&self) {
        if let Some(reaper) = self.inner.reaper.lock().take() {
            reaper.stop();
        }
    }
}

impl<L: VectorLookup, S: UsedPairStore> EngineInner<L, S> {
    fn session(&self, user_id: &str) -> Arc<UserSession> {
        self.sessions
            .get_or_create(user_id, || Pool::new(self.catalog.snapshot()))
    }

    fn existing_session(&self, user_id: &str) -> GameResult<Arc<UserSession>> {
        self.sessions
            .get(user_id)
            .ok_or_else(|| GameError::SessionNotFound {
                user_id: user_id.to_string(),
            })
    }

    async fn next_word(&self, user_id: &str) -> GameResult<String> {
        let session = self.session(user_id);
        let state = session.read().await;
        let word = session.pick_word(&state)?;
        debug!(user_id, word = %word, remaining = state.pool.remaining(), "Presenting word");
        Ok(word)
    }

    /// Every fallible step runs before the first mutation of `state`.
    #[instrument(skip(self, raw_response))]
    async fn submit(
        &self,
        user_id: &str,
        presented: &str,
        raw_response: &str,
    ) -> GameResult<SubmitOutcome> {
        let response = normalize_response(raw_response)
            .map_err(|reason| GameError::invalid_response(raw_response, reason))?;
        let presented = presented.trim().to_lowercase();
        if response == presented {
            return Err(GameError::invalid_response(
                raw_response,
                InvalidResponseReason::SameAsPresented,
            ));
        }

        // Only a word handed out by `next_word` can be answered.
        let session = self
            .sessions
            .get(user_id)
            .ok_or_else(|| GameError::WordNotInPool {
                word: presented.clone(),
            })?;
        let mut state = session.write().await;

        if session.presented().as_deref() != Some(presented.as_str()) {
            debug!(presented = %presented, "Rejected a word that was not presented");
            return Err(GameError::WordNotInPool { word: presented });
        }
        let presented_vector = state.pool.presentable_word(&presented)?.vector().clone();
        let response_vector = lookup_call(&self.lookup, &response, self.config.lookup_timeout)
            .await
            .map_err(|err| match err {
                GameError::Lookup { .. } => {
                    GameError::invalid_response(raw_response, InvalidResponseReason::UnknownWord)
                }
                other => other,
            })?;
        let score =
            self.scorer
                .score_vectors(&presented, &presented_vector, &response, &response_vector)?;

        let pair = WordPair::new(&presented, &response);
        let key = pair.key(self.config.pair_policy);
        let timeout = self.config.storage_timeout;

        let already_used = state.pool.is_excluded(&key)
            || store_call("is_used", timeout, || self.store.is_used(user_id, &key)).await?;
        if already_used {
            debug!(pair = %pair, "Rejected repeated pair");
            return Err(GameError::PairAlreadyUsed { pair });
        }

        store_call("record_used", timeout, || self.store.record_used(user_id, &key)).await?;

        // Commit. The word was validated above under this same write lock.
        let migration = state.pool.apply_score(&presented, score.tier)?;
        state.pool.note_used(key);
        session.clear_presented();

        let counted = score.points as f32 >= self.config.score_threshold;
        if counted {
            state.total_score += score.points as f32;
        }
        let round = state.pool.round();
        state.history.push(HistoryEntry {
            pair: pair.clone(),
            similarity: score.similarity,
            tier: score.tier,
            points: score.points,
            counted,
            round,
        });

        info!(
            pair = %pair,
            similarity = score.similarity,
            tier = %score.tier,
            points = score.points,
            exhausted = migration.exhausted,
            "Response scored"
        );

        Ok(SubmitOutcome {
            pair,
            similarity: score.similarity,
            tier: score.tier,
            points: score.points,
            counted,
            total_score: state.total_score,
            previous_tier: migration.from,
            pool_exhausted: migration.exhausted,
            round,
        })
    }

    #[instrument(skip(self))]
    async fn reload(&self, user_id: &str) -> GameResult<ReloadOutcome> {
        let session = self.session(user_id);
        let mut state = session.write().await;

        state.pool.begin_reload()?;

        let used = match store_call("all_used", self.config.storage_timeout, || {
            self.store.all_used(user_id)
        })
        .await
        {
            Ok(used) => used,
            Err(err) => {
                warn!(error = %err, "Reload aborted");
                state.pool.abort_reload();
                return Err(err);
            }
        };

        let policy = self.config.pair_policy;
        let excluded = used.into_iter().map(|pair| pair.key(policy)).collect();
        state.pool.finish_reload(self.catalog.snapshot(), excluded)?;
        session.clear_presented();

        Ok(ReloadOutcome {
            round: state.pool.round(),
            words: state.pool.remaining(),
            excluded_pairs: state.pool.excluded_len(),
        })
    }
}

fn summarize(user_id: &str, state: &SessionState) -> SessionSummary {
    SessionSummary {
        user_id: user_id.to_string(),
        state: state.pool.state(),
        round: state.pool.round(),
        remaining: state.pool.remaining(),
        accepted: state.history.len(),
        total_score: state.total_score,
    }
}

impl<L: VectorLookup, S: UsedPairStore> std::fmt::Debug for GameEngine<L, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("sessions", &self.inner.sessions.len())
            .field("catalog_version", &self.inner.catalog.snapshot().version())
            .finish()
    }
}
