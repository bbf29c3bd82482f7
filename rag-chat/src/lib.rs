//! # rag-chat
//!
//! Retrieval-augmented question answering over documents a language model
//! was never trained on.
//!
//! Documents are split into chunks by a [`Chunker`], each chunk is turned
//! into a vector by an [`Embedder`], and the vectors are stored in a
//! [`VectorIndex`]. A [`ConversationSession`] answers questions by retrieving
//! the most similar chunks through a [`Retriever`] and handing them, with the
//! conversation so far, to an [`Answerer`].
//!
//! The embedding and answer-generation backends are capabilities behind
//! traits; enable the `openai` feature for HTTP adapters.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rag_chat::{FileSource, InMemoryVectorIndex, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::builder().chunk_size(512).chunk_overlap(0).build()?)
//!     .embedder(Arc::new(embedder))
//!     .vector_index(Arc::new(InMemoryVectorIndex::new()))
//!     .build()?;
//! pipeline.ingest_source(&FileSource::new("apple.txt")).await?;
//!
//! let session = pipeline.session(Arc::new(answerer))?;
//! println!("{}", session.ask("When was Apple founded?").await?);
//! ```

pub mod answerer;
pub mod chunking;
pub mod config;
mod deadline;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod session;
pub mod source;
pub mod vectorstore;

pub use answerer::Answerer;
pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker, split_documents};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, ConversationTurn, Document, SearchResult};
pub use embedding::Embedder;
pub use error::{RagError, Result};
pub use inmemory::{InMemoryVectorIndex, cosine_similarity};
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use prompt::{ChatMessage, ChatRole, PromptBuilder};
pub use retriever::Retriever;
pub use session::{ConversationSession, SessionState};
pub use source::{DocumentSource, FileSource, StaticSource};
pub use vectorstore::{EntryId, IndexEntry, VectorIndex};
