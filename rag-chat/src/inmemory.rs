//! In-memory vector index using cosine similarity.
//!
//! This module provides [`InMemoryVectorIndex`], a brute-force index backed by
//! a `Vec` protected by a `tokio::sync::RwLock`. It is suitable for
//! development, testing, and the small document sets a single conversation
//! works over.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{EntryId, IndexEntry, VectorIndex};

#[derive(Debug, Default)]
struct IndexState {
    entries: Vec<IndexEntry>,
    dimensions: Option<usize>,
    next_id: u64,
}

/// An in-memory vector index that scores every entry on each search.
///
/// Entries are kept in insertion order, so a stable sort by descending score
/// breaks ties in favour of the earlier entry. The write lock serializes
/// inserts; searches share the read lock.
///
/// # Example
///
/// ```rust,ignore
/// use rag_chat::{InMemoryVectorIndex, VectorIndex};
///
/// let index = InMemoryVectorIndex::new();
/// index.insert(entries).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    state: RwLock<IndexState>,
}

impl InMemoryVectorIndex {
    /// Create a new empty in-memory index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every stored entry in insertion order.
    pub async fn entries(&self) -> Vec<IndexEntry> {
        self.state.read().await.entries.clone()
    }
}

/// Compute cosine similarity between two vectors of equal length.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn is_finite(vector: &[f32]) -> bool {
    vector.iter().all(|x| x.is_finite())
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn insert(&self, entries: Vec<(Chunk, Vec<f32>)>) -> Result<Vec<EntryId>> {
        let mut state = self.state.write().await;

        let Some((_, first)) = entries.first() else {
            return Ok(Vec::new());
        };
        let expected = state.dimensions.unwrap_or(first.len());
        if expected == 0 {
            return Err(RagError::InvalidConfig("vectors must not be empty".to_string()));
        }
        if let Some((_, bad)) = entries.iter().find(|(_, vector)| vector.len() != expected) {
            return Err(RagError::DimensionMismatch { expected, actual: bad.len() });
        }
        if let Some((chunk, _)) = entries.iter().find(|(_, vector)| !is_finite(vector)) {
            return Err(RagError::InvalidConfig(format!(
                "vector for chunk {} has non-finite components",
                chunk.id
            )));
        }

        state.dimensions = Some(expected);
        let mut ids = Vec::with_capacity(entries.len());
        for (chunk, vector) in entries {
            let id = EntryId(state.next_id);
            state.next_id += 1;
            state.entries.push(IndexEntry { id, chunk, vector });
            ids.push(id);
        }

        debug!(inserted = ids.len(), total = state.entries.len(), "inserted index entries");
        Ok(ids)
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(RagError::InvalidConfig("k must be greater than zero".to_string()));
        }

        let state = self.state.read().await;
        let Some(expected) = state.dimensions.filter(|_| !state.entries.is_empty()) else {
            return Err(RagError::EmptyIndex);
        };
        if query.len() != expected {
            return Err(RagError::DimensionMismatch { expected, actual: query.len() });
        }
        if !is_finite(query) {
            return Err(RagError::InvalidConfig(
                "query vector has non-finite components".to_string(),
            ));
        }

        let mut scored: Vec<SearchResult> = state
            .entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.vector, query),
            })
            .collect();

        // stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }

    async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    async fn dimensions(&self) -> Option<usize> {
        self.state.read().await.dimensions
    }

    async fn clear(&self) {
        let mut state = self.state.write().await;
        state.entries.clear();
        state.dimensions = None;
    }
}
