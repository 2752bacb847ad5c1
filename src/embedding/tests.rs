use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

struct CountingLookup {
    table: StaticVectorTable,
    calls: AtomicUsize,
}

impl VectorLookup for CountingLookup {
    async fn get(&self, word: &str) -> Result<Embedding, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.table.get(word).await
    }
}

fn sample_table() -> StaticVectorTable {
    StaticVectorTable::from_pairs([
        ("sky", vec![1.0, 0.0, 0.0]),
        ("star", vec![0.9, 0.1, 0.0]),
        ("Ocean", vec![0.0, 1.0, 0.0]),
    ])
    .expect("valid table")
}

#[test]
fn test_table_keys_are_case_insensitive() {
    let table = sample_table();

    assert!(table.contains("ocean"));
    assert!(table.contains("  SKY "));
    assert_eq!(table.len(), 3);
    assert_eq!(table.dim(), Some(3));
}

#[test]
fn test_table_rejects_dimension_mismatch() {
    let mut table = sample_table();
    let result = table.insert("wave", vec![1.0, 2.0]);

    assert!(matches!(
        result,
        Err(EmbeddingError::DimensionMismatch {
            expected: 3,
            actual: 2,
            ..
        })
    ));
    assert!(!table.contains("wave"));
}

#[test]
fn test_table_rejects_empty_and_non_finite_vectors() {
    let mut table = StaticVectorTable::new();

    assert!(matches!(
        table.insert("hill", vec![]),
        Err(EmbeddingError::InvalidVector { .. })
    ));
    assert!(matches!(
        table.insert("hill", vec![1.0, f32::NAN]),
        Err(EmbeddingError::InvalidVector { .. })
    ));
    assert!(matches!(
        table.insert("   ", vec![1.0]),
        Err(EmbeddingError::InvalidVector { .. })
    ));
    assert!(table.is_empty());
}

#[test]
fn test_table_from_json() {
    let table = StaticVectorTable::from_json_str(r#"{"mountain": [0.5, 0.5], "hill": [0.4, 0.6]}"#)
        .expect("valid json");

    assert_eq!(table.len(), 2);
    assert_eq!(table.dim(), Some(2));
}

#[test]
fn test_table_from_bad_json() {
    let result = StaticVectorTable::from_json_str(r#"["not", "a", "map"]"#);
    assert!(matches!(result, Err(EmbeddingError::Parse(_))));
}

#[test]
fn test_table_from_missing_file() {
    let result = StaticVectorTable::from_json_file(std::path::Path::new("/no/such/vectors.json"));
    assert!(matches!(result, Err(EmbeddingError::Io { .. })));
}

#[tokio::test]
async fn test_table_lookup_not_found() {
    let table = sample_table();
    let result = table.get("volcano").await;

    assert!(matches!(result, Err(EmbeddingError::NotFound { word }) if word == "volcano"));
}

#[tokio::test]
async fn test_cached_lookup_hits_inner_once() {
    let inner = CountingLookup {
        table: sample_table(),
        calls: AtomicUsize::new(0),
    };
    let cached = CachedVectorLookup::with_capacity(inner, 16);

    let first = cached.get("star").await.expect("known word");
    let second = cached.get("STAR").await.expect("known word");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cached_lookup_does_not_cache_misses() {
    let inner = CountingLookup {
        table: sample_table(),
        calls: AtomicUsize::new(0),
    };
    let cached = CachedVectorLookup::with_capacity(inner, 16);

    assert!(cached.get("volcano").await.is_err());
    assert!(cached.get("volcano").await.is_err());

    cached.run_pending_tasks();
    assert_eq!(cached.cached_len(), 0);
    assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_arc_lookup_delegates() {
    let shared = Arc::new(sample_table());
    let vector = shared.get("sky").await.expect("known word");

    assert_eq!(&*vector, &[1.0, 0.0, 0.0]);
}
