//! Conversational question answering over a [`Retriever`].
//!
//! A [`ConversationSession`] owns the history of one conversation. Each
//! [`ask`](ConversationSession::ask) retrieves context, calls the
//! [`Answerer`] with the full history, and records the turn only once an
//! answer exists. At most one `ask` is outstanding per session: a second
//! concurrent call fails fast with [`RagError::SessionBusy`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::answerer::Answerer;
use crate::config::RagConfig;
use crate::deadline::with_deadline;
use crate::document::ConversationTurn;
use crate::error::{RagError, Result};
use crate::retriever::Retriever;

/// Whether a session has a turn in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No turn in progress; `ask` will be accepted.
    Idle,
    /// A retrieval and answer call is outstanding.
    AwaitingAnswer,
}

/// Returns the session to [`SessionState::Idle`] when the turn ends, including
/// when the `ask` future is dropped mid-flight.
struct TurnGuard<'a> {
    busy: &'a AtomicBool,
}

impl<'a> TurnGuard<'a> {
    fn acquire(busy: &'a AtomicBool) -> Result<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RagError::SessionBusy)?;
        Ok(Self { busy })
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// A single conversation grounded in a vector index.
///
/// Share it behind an `Arc` to ask from several tasks; calls never
/// interleave.
///
/// # Example
///
/// ```rust,ignore
/// use rag_chat::ConversationSession;
///
/// let session = ConversationSession::new(retriever, Arc::new(my_answerer));
/// let answer = session.ask("When was Apple founded?").await?;
/// assert_eq!(session.history().await.len(), 1);
/// ```
pub struct ConversationSession {
    retriever: Retriever,
    answerer: Arc<dyn Answerer>,
    history: RwLock<Vec<ConversationTurn>>,
    busy: AtomicBool,
    answer_timeout: Duration,
}

impl ConversationSession {
    /// Create an idle session with empty history.
    pub fn new(retriever: Retriever, answerer: Arc<dyn Answerer>) -> Self {
        Self {
            retriever,
            answerer,
            history: RwLock::new(Vec::new()),
            busy: AtomicBool::new(false),
            answer_timeout: RagConfig::default().answer_timeout(),
        }
    }

    /// Create a session using the answer timeout from `config`.
    pub fn from_config(
        retriever: Retriever,
        answerer: Arc<dyn Answerer>,
        config: &RagConfig,
    ) -> Self {
        Self::new(retriever, answerer).with_answer_timeout(config.answer_timeout())
    }

    /// Bound each answerer call by `timeout`.
    pub fn with_answer_timeout(mut self, timeout: Duration) -> Self {
        self.answer_timeout = timeout;
        self
    }

    /// The current state of the session.
    pub fn state(&self) -> SessionState {
        if self.busy.load(Ordering::Acquire) {
            SessionState::AwaitingAnswer
        } else {
            SessionState::Idle
        }
    }

    /// A snapshot of every completed turn, oldest first.
    pub async fn history(&self) -> Vec<ConversationTurn> {
        self.history.read().await.clone()
    }

    /// Forget every completed turn.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::SessionBusy`] while a turn is in progress.
    pub async fn clear_history(&self) -> Result<()> {
        let _turn = TurnGuard::acquire(&self.busy)?;
        self.history.write().await.clear();
        info!("conversation history cleared");
        Ok(())
    }

    /// Answer `question` using retrieved context and the conversation so far.
    ///
    /// On success the `(question, answer)` turn is appended to the history.
    /// On failure, or if the returned future is dropped before completion, the
    /// history is left untouched and the session returns to idle.
    ///
    /// # Errors
    ///
    /// - [`RagError::SessionBusy`] if another `ask` is outstanding
    /// - any retrieval failure, unchanged
    /// - any answerer failure, unchanged, or [`RagError::Timeout`]
    pub async fn ask(&self, question: &str) -> Result<String> {
        let _turn = TurnGuard::acquire(&self.busy).inspect_err(|_| {
            debug!("rejected question while another is outstanding");
        })?;

        let context = self.retriever.retrieve(question).await.inspect_err(|e| {
            error!(error = %e, "retrieval failed; turn discarded");
        })?;

        let history = self.history.read().await.clone();
        debug!(context_chunks = context.len(), history_len = history.len(), "awaiting answer");

        let answer = with_deadline(
            "answer question",
            self.answer_timeout,
            self.answerer.answer(question, &context, &history),
        )
        .await
        .inspect_err(|e| {
            error!(
                answerer = self.answerer.name(),
                error = %e,
                "answer generation failed; turn discarded"
            );
        })?;

        let mut history = self.history.write().await;
        history.push(ConversationTurn::new(question, answer.clone()));
        info!(history_len = history.len(), "recorded conversation turn");

        Ok(answer)
    }
}
