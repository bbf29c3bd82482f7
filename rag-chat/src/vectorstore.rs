//! Vector index trait for storing and searching chunk embeddings.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// Identifier assigned to an entry when it is inserted.
///
/// Ids increase monotonically in insertion order within one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A chunk stored together with its vector.
///
/// Entries are immutable once inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// The id assigned at insertion.
    pub id: EntryId,
    /// The chunk the vector was computed from.
    pub chunk: Chunk,
    /// The chunk's embedding.
    pub vector: Vec<f32>,
}

/// A storage backend for chunk vectors with similarity search.
///
/// All vectors in one index share a dimension, fixed by the first vector ever
/// inserted. `search` ranks entries by cosine similarity, highest first, with
/// ties broken by insertion order. Implementations must serialize `insert`
/// calls against each other; `search` may run concurrently with anything.
///
/// # Example
///
/// ```rust,ignore
/// use rag_chat::{InMemoryVectorIndex, VectorIndex};
///
/// let index = InMemoryVectorIndex::new();
/// let ids = index.insert(vec![(chunk, vector)]).await?;
/// let results = index.search(&query, 4).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert chunks with their vectors, returning the assigned ids in input order.
    ///
    /// The batch is all-or-nothing: if any vector has the wrong dimension,
    /// nothing is inserted and [`RagError::DimensionMismatch`](crate::RagError::DimensionMismatch)
    /// is returned. Vectors with NaN or infinite components are rejected with
    /// [`RagError::InvalidConfig`](crate::RagError::InvalidConfig).
    async fn insert(&self, entries: Vec<(Chunk, Vec<f32>)>) -> Result<Vec<EntryId>>;

    /// Return the `min(k, len)` entries most similar to `query`.
    ///
    /// Fails with [`RagError::EmptyIndex`](crate::RagError::EmptyIndex) when
    /// the index has no entries, and with
    /// [`RagError::DimensionMismatch`](crate::RagError::DimensionMismatch) when
    /// `query` has the wrong length. A non-finite query is
    /// [`RagError::InvalidConfig`](crate::RagError::InvalidConfig).
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Number of stored entries.
    async fn len(&self) -> usize;

    /// Whether the index holds no entries.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// The dimension fixed by the first insert, if any.
    async fn dimensions(&self) -> Option<usize>;

    /// Drop every entry and forget the dimension so the index can be rebuilt.
    async fn clear(&self);
}
