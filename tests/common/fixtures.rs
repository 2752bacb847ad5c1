//! Test fixtures for integration tests.
//!
//! Every fixture word is a unit vector in the plane, so the cosine similarity of
//! two words is `cos(angle_a - angle_b)` and easy to reason about.

use std::sync::Arc;

use wordgame::catalog::{Catalog, Word};
use wordgame::config::Config;
use wordgame::embedding::{StaticVectorTable, VectorLookup};
use wordgame::game::GameEngine;
use wordgame::store::{InMemoryUsedPairStore, UsedPairStore};

pub const SCENARIO_WORDS: [&str; 6] = ["sky", "star", "ocean", "wave", "mountain", "hill"];

pub const FIXED_SEED: u64 = 0x5eed;

/// Similarity between `sky` and `star`.
pub const SKY_STAR_SIMILARITY: f32 = 0.92;

/// `(word, angle in radians)`.
pub fn fixture_angles() -> Vec<(&'static str, f32)> {
    vec![
        ("sky", 0.0),
        ("star", SKY_STAR_SIMILARITY.acos()),
        ("cloud", 0.9),
        ("ocean", 1.6),
        ("wave", 1.9),
        ("river", 2.1),
        ("mountain", 3.1),
        ("hill", 2.8),
        ("rock", 4.7),
        ("sand", 5.5),
    ]
}

pub fn unit_vector(angle: f32) -> Vec<f32> {
    vec![angle.cos(), angle.sin()]
}

pub fn fixture_table() -> StaticVectorTable {
    StaticVectorTable::from_pairs(
        fixture_angles()
            .into_iter()
            .map(|(word, angle)| (word, unit_vector(angle))),
    )
    .expect("fixture vectors are valid")
}

pub fn fixture_catalog(words: &[&str]) -> Catalog {
    let table = fixture_table();
    let words = words
        .iter()
        .map(|w| Word::new(w, table.get_sync(w).expect("fixture word has a vector")))
        .collect();
    Catalog::from_words(words).expect("fixture catalog is valid")
}

pub fn seeded_config() -> Config {
    Config {
        seed: Some(FIXED_SEED),
        session_idle_timeout: None,
        ..Config::default()
    }
}

pub fn engine_with_store<S: UsedPairStore>(
    config: Config,
    store: S,
) -> GameEngine<StaticVectorTable, S> {
    GameEngine::new(
        config,
        fixture_table(),
        store,
        fixture_catalog(&SCENARIO_WORDS),
    )
}

pub fn memory_engine() -> GameEngine<StaticVectorTable, Arc<InMemoryUsedPairStore>> {
    engine_with_store(seeded_config(), Arc::new(InMemoryUsedPairStore::new()))
}

/// Response used for every word in a given round, so pairs never repeat across rounds.
pub fn response_for_round(round: u32) -> &'static str {
    match round % 3 {
        1 => "rock",
        2 => "sand",
        _ => "cloud",
    }
}

/// Calls `next_word` until the engine hands `word` to `user`.
pub async fn present<L: VectorLookup, S: UsedPairStore>(
    engine: &GameEngine<L, S>,
    user: &str,
    word: &str,
) {
    for _ in 0..500 {
        let shown = engine
            .next_word(user)
            .await
            .expect("Pool should be active");
        if shown == word {
            return;
        }
    }
    panic!("'{word}' was never presented to {user}");
}
