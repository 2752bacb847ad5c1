use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use super::error::CatalogError;
use super::{Catalog, Word};
use crate::embedding::VectorLookup;

/// Produces a fully resolved [`Catalog`].
pub trait CatalogLoader: Send + Sync {
    fn load(&self) -> impl Future<Output = Result<Catalog, CatalogError>> + Send;
}

/// Resolves a plain word list through a [`VectorLookup`].
pub struct WordListLoader<L: VectorLookup> {
    words: Vec<String>,
    lookup: Arc<L>,
}

impl<L: VectorLookup> WordListLoader<L> {
    pub fn new<I, W>(words: I, lookup: Arc<L>) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
            lookup,
        }
    }

    /// Reads a JSON array of words, e.g. `["sky", "star", "ocean"]`.
    pub fn from_json_file(path: &Path, lookup: Arc<L>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let words: Vec<String> = serde_json::from_str(&json)?;
        Ok(Self::new(words, lookup))
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

impl<L: VectorLookup> CatalogLoader for WordListLoader<L> {
    async fn load(&self) -> Result<Catalog, CatalogError> {
        let mut resolved = Vec::with_capacity(self.words.len());

        for raw in &self.words {
            let text = raw.trim();
            if text.is_empty() {
                warn!("Skipping blank catalog entry");
                continue;
            }
            let vector = self
                .lookup
                .get(text)
                .await
                .map_err(|source| CatalogError::Embedding {
                    word: text.to_string(),
                    source,
                })?;
            resolved.push(Word::new(text, vector));
        }

        let catalog = Catalog::from_words(resolved)?;
        info!(
            words = catalog.len(),
            dim = catalog.dim().unwrap_or(0),
            "Catalog loaded"
        );
        Ok(catalog)
    }
}
