//! Error types for the `rag-chat` crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while chunking, indexing, retrieving, or answering.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid chunking, retrieval, or session parameters.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A vector's length does not match the dimension fixed by the index.
    #[error("Dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimension established by the first inserted vector.
        expected: usize,
        /// The length of the offending vector.
        actual: usize,
    },

    /// A search was issued against an index with no entries.
    #[error("Vector index is empty")]
    EmptyIndex,

    /// A conversation turn is already in progress on this session.
    #[error("Session is busy answering another question")]
    SessionBusy,

    /// A document source could not produce its documents.
    #[error("Source unavailable ({source_name}): {message}")]
    SourceUnavailable {
        /// The document source that failed.
        source_name: String,
        /// A description of the failure.
        message: String,
    },

    /// The embedding backend failed (quota, network, malformed input).
    #[error("Embedding service error ({provider}): {message}")]
    EmbeddingServiceError {
        /// The embedder that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The answer-generation backend failed.
    #[error("Generation service error ({provider}): {message}")]
    GenerationServiceError {
        /// The answerer that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A collaborator call did not complete within its deadline.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        /// The operation that was abandoned.
        operation: String,
        /// The deadline that elapsed.
        timeout: Duration,
    },
}

impl RagError {
    /// Whether a caller may reasonably retry the failed operation with backoff.
    ///
    /// Only external collaborator failures are transient. The core itself
    /// never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. }
                | Self::EmbeddingServiceError { .. }
                | Self::GenerationServiceError { .. }
                | Self::Timeout { .. }
        )
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
