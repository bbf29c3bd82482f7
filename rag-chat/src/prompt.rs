//! Prompt assembly for chat-completion answerers.

use serde::{Deserialize, Serialize};

use crate::document::{Chunk, ConversationTurn};

const SYSTEM_PROMPT: &str = "You answer questions about the documents provided as context. \
Use only the context below and the conversation so far. If the answer is not in the context, \
say that you don't know.";

/// The author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions and retrieved context.
    System,
    /// A question from the user.
    User,
    /// An earlier answer.
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the message.
    pub role: ChatRole,
    /// The message text.
    pub content: String,
}

impl ChatMessage {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

/// Builds chat messages from a question, retrieved chunks, and history.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Render chunks as a numbered context block, most similar first.
    pub fn build_context(context: &[Chunk]) -> String {
        let mut rendered = String::new();
        for (i, chunk) in context.iter().enumerate() {
            let source = chunk.metadata.get("source").unwrap_or(&chunk.document_id);
            rendered.push_str(&format!("[{}] ({source})\n{}\n\n", i + 1, chunk.text.trim()));
        }
        rendered
    }

    /// The full message list: system prompt with context, then each prior
    /// turn as a user/assistant pair, then the new question.
    pub fn build_messages(
        question: &str,
        context: &[Chunk],
        history: &[ConversationTurn],
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() * 2 + 2);

        let system = if context.is_empty() {
            format!("{SYSTEM_PROMPT}\n\nContext: (no relevant documents found)")
        } else {
            format!("{SYSTEM_PROMPT}\n\nContext:\n\n{}", Self::build_context(context))
        };
        messages.push(ChatMessage::new(ChatRole::System, system.trim_end()));

        for turn in history {
            messages.push(ChatMessage::new(ChatRole::User, turn.question.as_str()));
            messages.push(ChatMessage::new(ChatRole::Assistant, turn.answer.as_str()));
        }

        messages.push(ChatMessage::new(ChatRole::User, question));
        messages
    }
}
