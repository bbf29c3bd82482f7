//! Embedder trait for turning text into vectors.

use async_trait::async_trait;

use crate::error::Result;

/// A capability that converts text into a fixed-length vector.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface and report failures as
/// [`RagError::EmbeddingServiceError`](crate::RagError::EmbeddingServiceError).
/// The default [`embed_batch`](Embedder::embed_batch) implementation calls
/// [`embed`](Embedder::embed) sequentially; backends that support native
/// batching should override it.
///
/// Calls may be slow. Callers bound them with a timeout and cancel them by
/// dropping the returned future, so implementations must not rely on running
/// to completion.
///
/// # Example
///
/// ```rust,ignore
/// use rag_chat::Embedder;
///
/// let embedder = MyEmbedder::new();
/// let vector = embedder.embed("hello world").await?;
/// assert_eq!(vector.len(), embedder.dimensions());
/// ```
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this embedder.
    fn dimensions(&self) -> usize;

    /// A short name used in logs and error context.
    fn name(&self) -> &str {
        "embedder"
    }
}
