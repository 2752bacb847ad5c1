use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::catalog::{Catalog, Word};
use crate::config::Config;
use crate::embedding::{FlakyLookup, StaticVectorTable, VectorLookup};
use crate::error::{GameError, InvalidResponseReason};
use crate::pool::PoolState;
use crate::scoring::Tier;
use crate::store::{FlakyStore, InMemoryUsedPairStore, PairPolicy, UsedPairStore, WordPair};

const WORDS: [&str; 6] = ["sky", "star", "ocean", "wave", "mountain", "hill"];

fn table() -> StaticVectorTable {
    StaticVectorTable::from_pairs(vec![
        ("sky", vec![1.0, 0.0]),
        ("star", vec![0.92, (1.0f32 - 0.92 * 0.92).sqrt()]),
        ("ocean", vec![0.0, 1.0]),
        ("wave", vec![0.5, 0.866]),
        ("mountain", vec![-1.0, 0.0]),
        ("hill", vec![-0.9, 0.436]),
        ("cloud", vec![0.6, 0.8]),
        ("rock", vec![0.0, -1.0]),
        ("river", vec![0.3, 0.954]),
    ])
    .expect("fixture vectors")
}

fn catalog(words: &[&str]) -> Catalog {
    let table = table();
    let words = words
        .iter()
        .map(|w| Word::new(w, table.get_sync(w).expect("fixture word")))
        .collect();
    Catalog::from_words(words).expect("catalog")
}

fn seeded_config() -> Config {
    Config {
        seed: Some(7),
        ..Config::default()
    }
}

type MemEngine = GameEngine<StaticVectorTable, Arc<InMemoryUsedPairStore>>;
type FlakyEngine = GameEngine<StaticVectorTable, Arc<FlakyStore<InMemoryUsedPairStore>>>;

fn engine() -> MemEngine {
    engine_with(seeded_config())
}

fn engine_with(config: Config) -> MemEngine {
    GameEngine::new(
        config,
        table(),
        Arc::new(InMemoryUsedPairStore::new()),
        catalog(&WORDS),
    )
}

fn flaky_engine() -> FlakyEngine {
    GameEngine::new(
        seeded_config(),
        table(),
        Arc::new(FlakyStore::new(InMemoryUsedPairStore::new())),
        catalog(&WORDS),
    )
}

async fn exhaust<L: VectorLookup, S: UsedPairStore>(
    engine: &GameEngine<L, S>,
    user: &str,
    response: &str,
) {
    loop {
        match engine.next_word(user).await {
            Ok(word) => {
                engine
                    .submit_response(user, &word, response)
                    .await
                    .expect("scored");
            }
            Err(GameError::PoolExhausted) => break,
            Err(err) => panic!("unexpected error: {err}"),
        }
    }
}

/// Calls `next_word` until it hands out `word`.
async fn present<L: VectorLookup, S: UsedPairStore>(
    engine: &GameEngine<L, S>,
    user: &str,
    word: &str,
) {
    for _ in 0..500 {
        if engine.next_word(user).await.expect("active") == word {
            return;
        }
    }
    panic!("'{word}' was never presented");
}

#[tokio::test]
async fn test_submit_moves_word_to_scored_tier() {
    let engine = engine();

    present(&engine, "alice", "sky").await;
    let outcome = engine
        .submit_response("alice", "sky", "star")
        .await
        .expect("scored");

    assert!((outcome.similarity - 0.92).abs() < 1e-4);
    assert_eq!(outcome.tier, Tier::Tier3);
    assert_eq!(outcome.previous_tier, Tier::Tier1);
    assert_eq!(outcome.points, 9);
    assert!(outcome.counted);
    assert_eq!(outcome.total_score, 9.0);
    assert!(!outcome.pool_exhausted);

    let snapshot = engine.pool_snapshot("alice").await.expect("session");
    assert_eq!(snapshot.tier_of("sky"), Some(Tier::Tier3));
    assert_eq!(snapshot.remaining(), 5);

    let used = engine
        .store()
        .is_used("alice", &WordPair::new("sky", "star"))
        .await
        .expect("store");
    assert!(used);
}

#[tokio::test]
async fn test_low_scores_do_not_count() {
    let engine = engine();

    present(&engine, "alice", "sky").await;
    let outcome = engine
        .submit_response("alice", "sky", "rock")
        .await
        .expect("scored");

    assert_eq!(outcome.tier, Tier::Tier1);
    assert_eq!(outcome.points, 0);
    assert!(!outcome.counted);
    assert_eq!(outcome.total_score, 0.0);

    let history = engine.history("alice").await.expect("session");
    assert_eq!(history.len(), 1);
    assert!(!history[0].counted);
}

#[tokio::test]
async fn test_invalid_responses_leave_pool_unchanged() {
    let engine = engine();
    present(&engine, "alice", "sky").await;
    let before = engine.pool_snapshot("alice").await.expect("session");

    let cases = [
        ("", InvalidResponseReason::Empty),
        ("shooting star", InvalidResponseReason::MultipleWords),
        ("???", InvalidResponseReason::NoAlphanumeric),
        ("SKY", InvalidResponseReason::SameAsPresented),
        ("volcano", InvalidResponseReason::UnknownWord),
    ];
    for (response, expected) in cases {
        let err = engine
            .submit_response("alice", "sky", response)
            .await
            .expect_err("rejected");
        assert!(
            matches!(&err, GameError::InvalidResponse { reason, .. } if *reason == expected),
            "{response:?}: {err}"
        );
    }

    assert_eq!(engine.pool_snapshot("alice").await.expect("session"), before);
    assert!(engine.store().records("alice").is_empty());
}

#[tokio::test]
async fn test_response_is_normalized_before_scoring() {
    let engine = engine();

    present(&engine, "alice", "sky").await;
    let outcome = engine
        .submit_response("alice", "Sky", "\"Star!\"")
        .await
        .expect("scored");

    assert_eq!(outcome.pair, WordPair::new("sky", "star"));
}

#[tokio::test]
async fn test_word_must_be_presentable() {
    let engine = engine();
    present(&engine, "alice", "sky").await;
    engine
        .submit_response("alice", "sky", "star")
        .await
        .expect("scored");

    let again = engine.submit_response("alice", "sky", "cloud").await;
    assert!(matches!(again, Err(GameError::WordNotInPool { word }) if word == "sky"));

    let unknown = engine.submit_response("alice", "volcano", "star").await;
    assert!(matches!(unknown, Err(GameError::WordNotInPool { .. })));
}

#[tokio::test]
async fn test_exhaustion_then_reload_excludes_used_pair() {
    let engine = engine();
    present(&engine, "alice", "sky").await;
    engine
        .submit_response("alice", "sky", "star")
        .await
        .expect("scored");
    exhaust(&engine, "alice", "rock").await;

    assert!(matches!(
        engine.next_word("alice").await,
        Err(GameError::PoolExhausted)
    ));

    let reloaded = engine.reload("alice").await.expect("reload");
    assert_eq!(reloaded.round, 2);
    assert_eq!(reloaded.words, 6);
    assert_eq!(reloaded.excluded_pairs, 6);

    let snapshot = engine.pool_snapshot("alice").await.expect("session");
    assert_eq!(snapshot.state, PoolState::Active);
    assert_eq!(snapshot.buckets[&Tier::Tier1].pending.len(), 6);

    present(&engine, "alice", "sky").await;
    let repeat = engine.submit_response("alice", "sky", "star").await;
    assert!(matches!(repeat, Err(GameError::PairAlreadyUsed { .. })));

    let fresh = engine
        .submit_response("alice", "sky", "cloud")
        .await
        .expect("new partner");
    assert_eq!(fresh.round, 2);
}

#[tokio::test]
async fn test_reload_requires_exhausted_pool() {
    let engine = engine();
    engine.next_word("alice").await.expect("active");

    let result = engine.reload("alice").await;

    assert!(matches!(
        result,
        Err(GameError::ReloadState {
            state: PoolState::Active
        })
    ));
}

#[tokio::test]
async fn test_unordered_policy_blocks_reversed_pair() {
    let engine = engine_with(Config {
        pair_policy: PairPolicy::Unordered,
        ..seeded_config()
    });
    present(&engine, "alice", "sky").await;
    engine
        .submit_response("alice", "sky", "star")
        .await
        .expect("scored");

    present(&engine, "alice", "star").await;
    let reversed = engine.submit_response("alice", "star", "sky").await;

    assert!(matches!(reversed, Err(GameError::PairAlreadyUsed { .. })));
}

#[tokio::test]
async fn test_ordered_policy_allows_reversed_pair() {
    let engine = engine();
    present(&engine, "alice", "sky").await;
    engine
        .submit_response("alice", "sky", "star")
        .await
        .expect("scored");

    present(&engine, "alice", "star").await;
    let reversed = engine
        .submit_response("alice", "star", "sky")
        .await
        .expect("direction matters");

    assert_eq!(reversed.tier, Tier::Tier3);
}

#[tokio::test]
async fn test_store_failure_is_retried_once() {
    let engine = flaky_engine();
    present(&engine, "alice", "sky").await;
    engine.store().fail_next(1);

    let outcome = engine.submit_response("alice", "sky", "star").await;

    assert!(outcome.is_ok());
}

#[tokio::test]
async fn test_store_outage_surfaces_without_mutation() {
    let engine = flaky_engine();
    present(&engine, "alice", "sky").await;
    let before = engine.pool_snapshot("alice").await.expect("session");
    engine.store().fail_next(2);

    let err = engine
        .submit_response("alice", "sky", "star")
        .await
        .expect_err("store down");

    assert!(matches!(err, GameError::StorageUnavailable { operation: "is_used", .. }));
    assert!(err.is_retryable());
    assert_eq!(engine.pool_snapshot("alice").await.expect("session"), before);
    assert!(engine.history("alice").await.expect("session").is_empty());
}

#[tokio::test]
async fn test_failed_reload_stays_exhausted() {
    let engine = flaky_engine();
    exhaust(&engine, "alice", "rock").await;
    engine.store().fail_next(2);

    let err = engine.reload("alice").await.expect_err("store down");
    assert_eq!(err.kind(), "storage_unavailable");

    let snapshot = engine.pool_snapshot("alice").await.expect("session");
    assert_eq!(snapshot.state, PoolState::Exhausted);
    assert_eq!(snapshot.round, 1);

    engine.reload("alice").await.expect("store back");
}

#[tokio::test]
async fn test_lookup_outage_surfaces_as_timeout() {
    let lookup = Arc::new(FlakyLookup::new(table()));
    let engine = GameEngine::new(
        seeded_config(),
        Arc::clone(&lookup),
        Arc::new(InMemoryUsedPairStore::new()),
        catalog(&WORDS),
    );
    present(&engine, "alice", "sky").await;
    lookup.fail_next(2);

    let err = engine
        .submit_response("alice", "sky", "star")
        .await
        .expect_err("lookup down");

    assert!(matches!(err, GameError::LookupTimeout { .. }));
    assert_eq!(lookup.calls(), 2);
    let snapshot = engine.pool_snapshot("alice").await.expect("session");
    assert_eq!(snapshot.tier_of("sky"), Some(Tier::Tier1));
}

#[tokio::test]
async fn test_response_vectors_are_cached() {
    let lookup = Arc::new(FlakyLookup::new(table()));
    let engine = GameEngine::new(
        seeded_config(),
        Arc::clone(&lookup),
        Arc::new(InMemoryUsedPairStore::new()),
        catalog(&WORDS),
    );

    present(&engine, "alice", "sky").await;
    engine
        .submit_response("alice", "sky", "cloud")
        .await
        .expect("scored");
    present(&engine, "alice", "ocean").await;
    engine
        .submit_response("alice", "ocean", "cloud")
        .await
        .expect("scored");

    assert_eq!(lookup.calls(), 1);
}

#[tokio::test]
async fn test_cancelled_submit_still_commits() {
    let engine = flaky_engine();
    present(&engine, "alice", "sky").await;
    engine.store().set_delay(Duration::from_millis(50));

    let cancelled = tokio::time::timeout(
        Duration::from_millis(5),
        engine.submit_response("alice", "sky", "star"),
    )
    .await;
    assert!(cancelled.is_err());

    tokio::time::sleep(Duration::from_millis(300)).await;

    let snapshot = engine.pool_snapshot("alice").await.expect("session");
    assert_eq!(snapshot.tier_of("sky"), Some(Tier::Tier3));
    assert_eq!(engine.store().inner().records("alice").len(), 1);
    assert_eq!(engine.history("alice").await.expect("session").len(), 1);
}

#[tokio::test]
async fn test_play_round_trip() {
    let engine = engine();

    let first = engine.play("alice", None, None).await.expect("word");
    let word = first.next_word().expect("word").to_string();

    let scored = engine
        .play("alice", Some(&word), Some("rock"))
        .await
        .expect("scored");

    match scored {
        PlayResult::Scored { outcome, next_word } => {
            assert_eq!(outcome.pair.presented, word);
            let next = next_word.expect("five words left");
            assert_ne!(next, word);
        }
        other => panic!("expected a scored result, got {other:?}"),
    }

    let orphan = engine.play("alice", None, Some("star")).await;
    assert!(matches!(orphan, Err(GameError::MissingPresentedWord)));
}

#[tokio::test]
async fn test_play_reports_exhaustion() {
    let engine = GameEngine::new(
        seeded_config(),
        table(),
        Arc::new(InMemoryUsedPairStore::new()),
        catalog(&["sky"]),
    );

    present(&engine, "alice", "sky").await;
    let result = engine
        .play("alice", Some("sky"), Some("star"))
        .await
        .expect("scored");

    match result {
        PlayResult::Scored { outcome, next_word } => {
            assert!(outcome.pool_exhausted);
            assert!(next_word.is_none());
        }
        other => panic!("expected a scored result, got {other:?}"),
    }
    assert!(matches!(
        engine.play("alice", None, None).await,
        Err(GameError::PoolExhausted)
    ));
}

#[tokio::test]
async fn test_play_auto_reload() {
    let engine = GameEngine::new(
        Config {
            auto_reload: true,
            ..seeded_config()
        },
        table(),
        Arc::new(InMemoryUsedPairStore::new()),
        catalog(&["sky"]),
    );

    present(&engine, "alice", "sky").await;
    let result = engine
        .play("alice", Some("sky"), Some("star"))
        .await
        .expect("scored");

    assert_eq!(result.next_word(), Some("sky"));
    let summary = engine.summary("alice").await.expect("session");
    assert_eq!(summary.round, 2);
    assert_eq!(summary.state, PoolState::Active);
}

#[tokio::test]
async fn test_end_session_keeps_used_pairs() {
    let engine = engine();
    present(&engine, "alice", "sky").await;
    engine
        .submit_response("alice", "sky", "star")
        .await
        .expect("scored");

    let summary = engine.end_session("alice").await.expect("session");
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.total_score, 9.0);
    assert!(matches!(
        engine.history("alice").await,
        Err(GameError::SessionNotFound { .. })
    ));

    present(&engine, "alice", "sky").await;
    let repeat = engine.submit_response("alice", "sky", "star").await;
    assert!(matches!(repeat, Err(GameError::PairAlreadyUsed { .. })));
}

#[tokio::test]
async fn test_replace_catalog_applies_on_reload() {
    let engine = GameEngine::new(
        seeded_config(),
        table(),
        Arc::new(InMemoryUsedPairStore::new()),
        catalog(&["sky"]),
    );
    engine.next_word("alice").await.expect("active");

    let version = engine.replace_catalog(catalog(&["ocean", "wave"]));
    assert_eq!(version, 2);

    assert_eq!(engine.next_word("alice").await.expect("old catalog"), "sky");
    let alice = engine.pool_snapshot("alice").await.expect("session");
    assert_eq!(alice.catalog_version, 1);

    engine
        .submit_response("alice", "sky", "star")
        .await
        .expect("scored");
    let reloaded = engine.reload("alice").await.expect("reload");
    assert_eq!(reloaded.words, 2);

    engine.next_word("bob").await.expect("new catalog");
    let snapshot = engine.pool_snapshot("bob").await.expect("session");
    assert_eq!(snapshot.catalog_version, 2);
    assert_eq!(snapshot.remaining(), 2);
}

#[tokio::test]
async fn test_score_pair_is_stateless() {
    let engine = engine();

    let score = engine.score_pair("ocean", "wave").await.expect("scored");

    assert_eq!(score.tier, Tier::Tier3);
    assert_eq!(engine.session_count(), 0);
    assert!(matches!(
        engine.score_pair("ocean", "volcano").await,
        Err(GameError::Lookup { .. })
    ));
}

#[tokio::test]
async fn test_reaper_requires_idle_timeout() {
    let engine = engine_with(Config {
        session_idle_timeout: None,
        ..seeded_config()
    });
    assert!(engine.start_reaper().is_none());

    let engine = engine_with(Config {
        session_idle_timeout: Some(Duration::from_millis(20)),
        ..seeded_config()
    });
    engine.next_word("alice").await.expect("active");
    let handle = engine.start_reaper().expect("reaper");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(engine.session_count(), 0);

    engine.stop_reaper();
    handle.abort();
}

#[tokio::test]
async fn test_submit_requires_the_presented_word() {
    let engine = engine();
    let shown = engine.next_word("alice").await.expect("active");
    let other = WORDS
        .iter()
        .find(|w| **w != shown)
        .expect("another pending word");
    let before = engine.pool_snapshot("alice").await.expect("session");

    let err = engine
        .submit_response("alice", other, "rock")
        .await
        .expect_err("never presented");

    assert!(matches!(&err, GameError::WordNotInPool { word } if word == other));
    assert_eq!(engine.pool_snapshot("alice").await.expect("session"), before);
    assert!(engine.store().records("alice").is_empty());

    engine
        .submit_response("alice", &shown, "rock")
        .await
        .expect("presented word is accepted");
}

#[tokio::test]
async fn test_submit_without_next_word_is_rejected() {
    let engine = engine();

    let err = engine
        .submit_response("bob", "sky", "star")
        .await
        .expect_err("nothing presented");

    assert!(matches!(err, GameError::WordNotInPool { .. }));
    assert_eq!(engine.session_count(), 0);
    assert!(engine.store().records("bob").is_empty());
}

#[tokio::test]
async fn test_presented_word_closes_after_scoring() {
    let engine = engine();
    present(&engine, "alice", "sky").await;
    engine
        .submit_response("alice", "sky", "star")
        .await
        .expect("scored");

    let again = engine.submit_response("alice", "sky", "cloud").await;

    assert!(matches!(again, Err(GameError::WordNotInPool { .. })));
    assert_eq!(engine.history("alice").await.expect("session").len(), 1);
}

#[tokio::test]
async fn test_zero_vector_response_is_degenerate() {
    let mut vectors = table();
    vectors
        .insert("void", vec![0.0, 0.0])
        .expect("zero vector is storable");
    let lookup = Arc::new(FlakyLookup::new(vectors));
    let engine = GameEngine::new(
        seeded_config(),
        Arc::clone(&lookup),
        Arc::new(InMemoryUsedPairStore::new()),
        catalog(&WORDS),
    );
    present(&engine, "alice", "sky").await;
    let before = engine.pool_snapshot("alice").await.expect("session");

    let err = engine
        .submit_response("alice", "sky", "void")
        .await
        .expect_err("degenerate");

    assert!(matches!(&err, GameError::DegenerateVector { word } if word == "void"));
    assert!(!err.is_retryable());
    assert_eq!(lookup.calls(), 1);
    assert_eq!(engine.pool_snapshot("alice").await.expect("session"), before);
    assert!(engine.store().records("alice").is_empty());
    assert!(engine.history("alice").await.expect("session").is_empty());
}
