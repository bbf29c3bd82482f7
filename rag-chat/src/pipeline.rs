//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates ingestion by composing a [`Chunker`], an
//! [`Embedder`], and a [`VectorIndex`], and hands out [`Retriever`]s and
//! [`ConversationSession`]s that query the same index.
//!
//! # Example
//!
//! ```rust,ignore
//! use rag_chat::{RagPipeline, RagConfig, InMemoryVectorIndex, FixedSizeChunker};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedder(Arc::new(my_embedder))
//!     .vector_index(Arc::new(InMemoryVectorIndex::new()))
//!     .build()?;
//!
//! pipeline.ingest_source(&FileSource::new("apple.txt")).await?;
//! let session = pipeline.session(Arc::new(my_answerer))?;
//! let answer = session.ask("When was Apple founded?").await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::answerer::Answerer;
use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::RagConfig;
use crate::deadline::with_deadline;
use crate::document::Document;
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::retriever::Retriever;
use crate::session::ConversationSession;
use crate::source::DocumentSource;
use crate::vectorstore::{EntryId, VectorIndex};

/// The RAG pipeline orchestrator.
///
/// Ingestion runs chunk → embed → insert. Failures are logged and returned
/// unchanged. Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedder: Arc<dyn Embedder>,
    vector_index: Arc<dyn VectorIndex>,
    chunker: Arc<dyn Chunker>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedder.
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Return a reference to the vector index.
    pub fn vector_index(&self) -> &Arc<dyn VectorIndex> {
        &self.vector_index
    }

    /// Ingest a single document: chunk → embed → insert.
    ///
    /// Returns the ids assigned to the document's chunks, in document order.
    ///
    /// # Errors
    ///
    /// Returns the embedder's error, [`RagError::Timeout`] if embedding
    /// misses its deadline (`embed_timeout` per chunk), or the index's error (e.g.
    /// [`RagError::DimensionMismatch`]). Nothing from the document is
    /// inserted on failure.
    pub async fn ingest(&self, document: &Document) -> Result<Vec<EntryId>> {
        let chunks = self.chunker.chunk(document);
        if chunks.is_empty() {
            info!(document.id = %document.id, chunk_count = 0, "ingested document (empty)");
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = with_deadline(
            "embed chunks",
            batch_deadline(self.config.embed_timeout(), texts.len()),
            self.embedder.embed_batch(&texts),
        )
        .await
        .inspect_err(|e| {
            error!(document.id = %document.id, error = %e, "embedding failed during ingestion");
        })?;

        if vectors.len() != chunks.len() {
            let e = RagError::EmbeddingServiceError {
                provider: self.embedder.name().to_string(),
                message: format!("expected {} vectors, got {}", chunks.len(), vectors.len()),
            };
            error!(document.id = %document.id, error = %e, "embedder returned a short batch");
            return Err(e);
        }

        let ids = self
            .vector_index
            .insert(chunks.into_iter().zip(vectors).collect())
            .await
            .inspect_err(|e| {
                error!(document.id = %document.id, error = %e, "insert failed during ingestion");
            })?;

        info!(document.id = %document.id, chunk_count = ids.len(), "ingested document");
        Ok(ids)
    }

    /// Ingest multiple documents in order.
    ///
    /// # Errors
    ///
    /// Stops at the first document that fails and returns its error; earlier
    /// documents stay indexed.
    pub async fn ingest_batch(&self, documents: &[Document]) -> Result<Vec<EntryId>> {
        let mut all_ids = Vec::new();
        for document in documents {
            all_ids.extend(self.ingest(document).await?);
        }
        Ok(all_ids)
    }

    /// Load every document from `source` and ingest it.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::SourceUnavailable`] if loading fails, otherwise as
    /// [`ingest_batch`](RagPipeline::ingest_batch).
    pub async fn ingest_source(&self, source: &dyn DocumentSource) -> Result<Vec<EntryId>> {
        let documents = source.load().await.inspect_err(|e| {
            error!(source = source.name(), error = %e, "document source failed");
        })?;
        info!(source = source.name(), document_count = documents.len(), "loaded documents");
        self.ingest_batch(&documents).await
    }

    /// A retriever over this pipeline's index using the configured `top_k`.
    pub fn retriever(&self) -> Result<Retriever> {
        Retriever::from_config(self.vector_index.clone(), self.embedder.clone(), &self.config)
    }

    /// Start a new conversation answered by `answerer`.
    pub fn session(&self, answerer: Arc<dyn Answerer>) -> Result<ConversationSession> {
        Ok(ConversationSession::from_config(self.retriever()?, answerer, &self.config))
    }
}

/// Deadline for embedding `count` texts in one batch: one embedder call's
/// budget per text, since the default `embed_batch` embeds them one by one.
fn batch_deadline(per_call: Duration, count: usize) -> Duration {
    per_call.saturating_mul(u32::try_from(count).unwrap_or(u32::MAX))
}

/// Builder for constructing a [`RagPipeline`].
///
/// `embedder` and `vector_index` are required. The config defaults to
/// [`RagConfig::default()`] and the chunker to a [`FixedSizeChunker`] built
/// from the config's `chunk_size` and `chunk_overlap`.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RagPipeline::builder()
///     .config(config)
///     .embedder(Arc::new(embedder))
///     .vector_index(Arc::new(index))
///     .chunker(Arc::new(RecursiveChunker::new(512, 64)?))  // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedder: Option<Arc<dyn Embedder>>,
    vector_index: Option<Arc<dyn VectorIndex>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedder.
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector index.
    pub fn vector_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.vector_index = Some(index);
        self
    }

    /// Override the chunking strategy.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagPipeline`], validating the config and required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if a required field is missing or
    /// the config does not validate.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedder = self
            .embedder
            .ok_or_else(|| RagError::InvalidConfig("embedder is required".to_string()))?;
        let vector_index = self
            .vector_index
            .ok_or_else(|| RagError::InvalidConfig("vector_index is required".to_string()))?;
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)?),
        };

        Ok(RagPipeline { config, embedder, vector_index, chunker })
    }
}
