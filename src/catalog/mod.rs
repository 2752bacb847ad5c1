//! Word catalog: the full set of presentable words with their cached vectors.
//!
//! A [`Catalog`] is immutable once built. Sessions hold an `Arc<Catalog>` and the
//! shared [`CatalogHandle`] swaps in a new snapshot on replace, so nothing ever
//! observes a half-replaced catalog.

mod error;
mod loader;


pub use error::CatalogError;
pub use loader::{CatalogLoader, WordListLoader};

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::info;

use crate::embedding::Embedding;

/// A catalog word and its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    text: String,
    vector: Embedding,
}

impl Word {
    /// Builds a word. The text is trimmed and lowercased.
    pub fn new(text: &str, vector: Embedding) -> Self {
        Self {
            text: text.trim().to_lowercase(),
            vector,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn vector(&self) -> &Embedding {
        &self.vector
    }
}

/// Immutable snapshot of the word catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    words: Vec<Word>,
    index: HashMap<String, usize>,
    version: u64,
}

impl Catalog {
    /// Builds a catalog from resolved words.
    ///
    /// Duplicate texts keep their first occurrence. Every vector must be
    /// non-empty, non-zero, and share one dimension.
    pub fn from_words(words: Vec<Word>) -> Result<Self, CatalogError> {
        let mut unique = Vec::with_capacity(words.len());
        let mut index = HashMap::with_capacity(words.len());
        let mut dim = None;

        for word in words {
            if word.text.is_empty() || index.contains_key(&word.text) {
                continue;
            }
            if word.vector.is_empty() || word.vector.iter().all(|v| *v == 0.0) {
                return Err(CatalogError::DegenerateWord { word: word.text });
            }
            match dim {
                Some(expected) if expected != word.vector.len() => {
                    return Err(CatalogError::DimensionMismatch {
                        word: word.text,
                        expected,
                        actual: word.vector.len(),
                    });
                }
                Some(_) => {}
                None => dim = Some(word.vector.len()),
            }
            index.insert(word.text.clone(), unique.len());
            unique.push(word);
        }

        if unique.is_empty() {
            return Err(CatalogError::Empty);
        }

        Ok(Self {
            words: unique,
            index,
            version: 0,
        })
    }

    pub fn get(&self, word: &str) -> Option<&Word> {
        self.index
            .get(&word.trim().to_lowercase())
            .map(|&i| &self.words[i])
    }

    pub fn contains(&self, word: &str) -> bool {
        self.get(word).is_some()
    }

    /// Words in load order.
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.words.iter()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(Word::text)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn dim(&self) -> Option<usize> {
        self.words.first().map(|w| w.vector.len())
    }

    /// Monotonic number assigned by [`CatalogHandle`]. `0` for a detached catalog.
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Shared, atomically replaceable reference to the current [`Catalog`].
#[derive(Debug)]
pub struct CatalogHandle {
    current: RwLock<Arc<Catalog>>,
    next_version: AtomicU64,
}

impl CatalogHandle {
    pub fn new(mut catalog: Catalog) -> Self {
        catalog.version = 1;
        Self {
            current: RwLock::new(Arc::new(catalog)),
            next_version: AtomicU64::new(2),
        }
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&self.current.read())
    }

    /// Swaps in a new catalog and returns its version.
    pub fn replace(&self, mut catalog: Catalog) -> u64 {
        let version = self.next_version.fetch_add(1, Ordering::Relaxed);
        catalog.version = version;
        let words = catalog.len();
        *self.current.write() = Arc::new(catalog);
        info!(version, words, "Catalog replaced");
        version
    }
}
