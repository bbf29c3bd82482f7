//! Top-k retrieval over a [`VectorIndex`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use crate::config::RagConfig;
use crate::deadline::with_deadline;
use crate::document::{Chunk, SearchResult};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorIndex;

/// Embeds a question and returns the `k` most similar chunks.
///
/// Failures from the embedder or the index are returned unchanged.
///
/// # Example
///
/// ```rust,ignore
/// use rag_chat::Retriever;
///
/// let retriever = Retriever::new(index, embedder, 4)?;
/// let chunks = retriever.retrieve("When was Apple founded?").await?;
/// ```
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    k: usize,
    similarity_threshold: Option<f32>,
    embed_timeout: Duration,
}

impl Retriever {
    /// Create a retriever returning at most `k` chunks per question.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if `k == 0`.
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(RagError::InvalidConfig("k must be greater than zero".to_string()));
        }
        let defaults = RagConfig::default();
        Ok(Self {
            index,
            embedder,
            k,
            similarity_threshold: defaults.similarity_threshold,
            embed_timeout: defaults.embed_timeout(),
        })
    }

    /// Create a retriever using `top_k`, the threshold, and the embed timeout from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if `config` does not validate.
    pub fn from_config(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        config: &RagConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            index,
            embedder,
            k: config.top_k,
            similarity_threshold: config.similarity_threshold,
            embed_timeout: config.embed_timeout(),
        })
    }

    /// Drop results scoring below `threshold`.
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }

    /// Bound each embedder call by `timeout`.
    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    /// The number of chunks requested per question.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Retrieve the most similar chunks for `question`, most similar first.
    ///
    /// # Errors
    ///
    /// Propagates embedder failures, [`RagError::Timeout`] if the embedder
    /// misses its deadline, and index failures such as
    /// [`RagError::EmptyIndex`] or [`RagError::DimensionMismatch`].
    pub async fn retrieve(&self, question: &str) -> Result<Vec<Chunk>> {
        let results = self.retrieve_scored(question).await?;
        Ok(results.into_iter().map(|result| result.chunk).collect())
    }

    /// Like [`retrieve`](Retriever::retrieve), keeping the similarity scores.
    pub async fn retrieve_scored(&self, question: &str) -> Result<Vec<SearchResult>> {
        let query = with_deadline("embed query", self.embed_timeout, self.embedder.embed(question))
            .await
            .inspect_err(|e| {
                error!(embedder = self.embedder.name(), error = %e, "query embedding failed");
            })?;

        let results = self.index.search(&query, self.k).await.inspect_err(|e| {
            error!(error = %e, "vector index search failed");
        })?;

        let results: Vec<SearchResult> = match self.similarity_threshold {
            Some(threshold) => results.into_iter().filter(|r| r.score >= threshold).collect(),
            None => results,
        };

        debug!(k = self.k, result_count = results.len(), "retrieved context");
        Ok(results)
    }
}
