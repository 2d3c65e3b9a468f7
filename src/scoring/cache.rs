//! Keyword embedding cache.
//!
//! Questions are usually asked many times with the same expected keywords,
//! so the keyword half of the encoding work is memoized per keyword list.
//! The key is the exact ordered list; `["a", "b"]` and `["b", "a"]` are
//! separate entries. Cached values are pure functions of their key, so a
//! racing miss simply computes twice and the last insert wins.

use moka::sync::Cache;
use std::sync::Arc;

use super::oracle::Embedding;
use crate::error::OracleError;

pub type KeywordEmbeddings = Arc<Vec<Embedding>>;

pub type ComputeFn<'a> = &'a dyn Fn(&[String]) -> Result<Vec<Embedding>, OracleError>;

pub trait KeywordCache: Send + Sync {
    /// Returns one embedding per key, computing and storing them on a miss.
    fn get_or_compute(
        &self,
        keys: &[String],
        compute: ComputeFn<'_>,
    ) -> Result<KeywordEmbeddings, OracleError>;
}

fn compute_checked(keys: &[String], compute: ComputeFn<'_>) -> Result<Vec<Embedding>, OracleError> {
    let embeddings = compute(keys)?;
    if embeddings.len() != keys.len() {
        return Err(OracleError::ShapeMismatch {
            expected: keys.len(),
            actual: embeddings.len(),
        });
    }
    Ok(embeddings)
}

/// Bounded in-memory cache with LRU-style eviction.
pub struct LruKeywordCache {
    entries: Cache<Vec<String>, KeywordEmbeddings>,
}

impl LruKeywordCache {
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, keys: &[String]) -> bool {
        self.entries.contains_key(keys)
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl KeywordCache for LruKeywordCache {
    fn get_or_compute(
        &self,
        keys: &[String],
        compute: ComputeFn<'_>,
    ) -> Result<KeywordEmbeddings, OracleError> {
        if let Some(hit) = self.entries.get(keys) {
            tracing::trace!(keywords = keys.len(), "keyword embedding cache hit");
            return Ok(hit);
        }

        tracing::debug!(keywords = keys.len(), "keyword embedding cache miss");
        let embeddings = Arc::new(compute_checked(keys, compute)?);
        self.entries.insert(keys.to_vec(), Arc::clone(&embeddings));
        Ok(embeddings)
    }
}

/// Pass-through policy: always recomputes.
pub struct NoCache;

impl KeywordCache for NoCache {
    fn get_or_compute(
        &self,
        keys: &[String],
        compute: ComputeFn<'_>,
    ) -> Result<KeywordEmbeddings, OracleError> {
        compute_checked(keys, compute).map(Arc::new)
    }
}
