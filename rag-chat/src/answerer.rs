//! Answerer trait for generating grounded answers.

use async_trait::async_trait;

use crate::document::{Chunk, ConversationTurn};
use crate::error::Result;

/// A capability that answers a question from retrieved context and prior turns.
///
/// Implementations wrap a chat-completion backend and report failures as
/// [`RagError::GenerationServiceError`](crate::RagError::GenerationServiceError).
/// Like [`Embedder`](crate::Embedder) calls, answer calls are bounded by a
/// timeout and cancelled by dropping the future.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Produce an answer to `question`.
    ///
    /// `context` is ordered most similar first; `history` is every earlier
    /// turn of the conversation, oldest first.
    async fn answer(
        &self,
        question: &str,
        context: &[Chunk],
        history: &[ConversationTurn],
    ) -> Result<String>;

    /// A short name used in logs and error context.
    fn name(&self) -> &str {
        "answerer"
    }
}
