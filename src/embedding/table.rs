use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::error::EmbeddingError;
use super::{Embedding, VectorLookup};

/// In-memory word → vector table.
///
/// Keys are stored lowercased and trimmed; every vector must share the same
/// non-zero dimension and contain only finite values.
#[derive(Debug, Clone, Default)]
pub struct StaticVectorTable {
    vectors: HashMap<String, Embedding>,
    dim: Option<usize>,
}

impl StaticVectorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(word, vector)` pairs.
    pub fn from_pairs<I, W>(pairs: I) -> Result<Self, EmbeddingError>
    where
        I: IntoIterator<Item = (W, Vec<f32>)>,
        W: AsRef<str>,
    {
        let mut table = Self::new();
        for (word, vector) in pairs {
            table.insert(word.as_ref(), vector)?;
        }
        Ok(table)
    }

    /// Parses a JSON object of the form `{"word": [0.1, 0.2, ...], ...}`.
    pub fn from_json_str(json: &str) -> Result<Self, EmbeddingError> {
        let raw: HashMap<String, Vec<f32>> = serde_json::from_str(json)?;
        Self::from_pairs(raw)
    }

    /// Reads and parses a JSON vector table from disk.
    pub fn from_json_file(path: &Path) -> Result<Self, EmbeddingError> {
        let json = std::fs::read_to_string(path).map_err(|source| EmbeddingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            words = table.len(),
            dim = table.dim().unwrap_or(0),
            "Vector table loaded"
        );
        Ok(table)
    }

    /// Inserts (or replaces) a vector, enforcing a consistent dimension.
    pub fn insert(&mut self, word: &str, vector: Vec<f32>) -> Result<(), EmbeddingError> {
        let key = normalize_key(word);
        if key.is_empty() {
            return Err(EmbeddingError::InvalidVector {
                word: word.to_string(),
                reason: "empty word".to_string(),
            });
        }
        if vector.is_empty() {
            return Err(EmbeddingError::InvalidVector {
                word: key,
                reason: "zero-length vector".to_string(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(EmbeddingError::InvalidVector {
                word: key,
                reason: "non-finite component".to_string(),
            });
        }

        match self.dim {
            Some(expected) if expected != vector.len() => {
                return Err(EmbeddingError::DimensionMismatch {
                    word: key,
                    expected,
                    actual: vector.len(),
                });
            }
            Some(_) => {}
            None => self.dim = Some(vector.len()),
        }

        self.vectors.insert(key, Arc::from(vector));
        Ok(())
    }

    pub fn get_sync(&self, word: &str) -> Option<Embedding> {
        self.vectors.get(&normalize_key(word)).cloned()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.vectors.contains_key(&normalize_key(word))
    }

    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl VectorLookup for StaticVectorTable {
    async fn get(&self, word: &str) -> Result<Embedding, EmbeddingError> {
        self.get_sync(word).ok_or_else(|| EmbeddingError::NotFound {
            word: word.to_string(),
        })
    }
}

#[inline]
fn normalize_key(word: &str) -> String {
    word.trim().to_lowercase()
}
