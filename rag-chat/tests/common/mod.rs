//! Scripted collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rag_chat::{
    Answerer, Chunk, Chunker, ConversationTurn, Document, Embedder, InMemoryVectorIndex, RagError,
    RecursiveChunker, Result, VectorIndex,
};
use tokio::sync::Notify;

/// Bag-of-words embedder over a fixed vocabulary; one dimension per word.
pub struct KeywordEmbedder {
    vocabulary: Vec<&'static str>,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: &[&'static str]) -> Self {
        Self { vocabulary: vocabulary.to_vec() }
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lowered = text.to_lowercase();
        Ok(self.vocabulary.iter().map(|word| lowered.matches(word).count() as f32).collect())
    }

    fn dimensions(&self) -> usize {
        self.vocabulary.len()
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// Returns the same vector for every input.
pub struct ConstantEmbedder(pub Vec<f32>);

#[async_trait]
impl Embedder for ConstantEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(self.0.clone())
    }

    fn dimensions(&self) -> usize {
        self.0.len()
    }
}

/// Always fails like an exhausted quota.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::EmbeddingServiceError {
            provider: "failing".into(),
            message: "quota exceeded".into(),
        })
    }

    fn dimensions(&self) -> usize {
        3
    }
}

/// Never answers within any reasonable deadline.
pub struct SlowEmbedder;

#[async_trait]
impl Embedder for SlowEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(vec![1.0, 0.0, 0.0])
    }

    fn dimensions(&self) -> usize {
        3
    }
}

/// What an answerer was called with.
#[derive(Debug, Clone)]
pub struct AnswerCall {
    pub question: String,
    pub context: Vec<Chunk>,
    pub history: Vec<ConversationTurn>,
}

/// Answers with a canned reply and records every call.
#[derive(Default)]
pub struct RecordingAnswerer {
    pub calls: Mutex<Vec<AnswerCall>>,
}

impl RecordingAnswerer {
    pub fn calls(&self) -> Vec<AnswerCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Answerer for RecordingAnswerer {
    async fn answer(
        &self,
        question: &str,
        context: &[Chunk],
        history: &[ConversationTurn],
    ) -> Result<String> {
        self.calls.lock().unwrap().push(AnswerCall {
            question: question.to_string(),
            context: context.to_vec(),
            history: history.to_vec(),
        });
        Ok(format!("answer #{} to: {question}", history.len() + 1))
    }
}

/// Fails every call like an unreachable chat service.
pub struct FailingAnswerer;

#[async_trait]
impl Answerer for FailingAnswerer {
    async fn answer(
        &self,
        _question: &str,
        _context: &[Chunk],
        _history: &[ConversationTurn],
    ) -> Result<String> {
        Err(RagError::GenerationServiceError {
            provider: "failing".into(),
            message: "service unavailable".into(),
        })
    }
}

/// Signals `entered` when called, then waits for `release` before answering.
#[derive(Default)]
pub struct GatedAnswerer {
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl Answerer for GatedAnswerer {
    async fn answer(
        &self,
        question: &str,
        _context: &[Chunk],
        _history: &[ConversationTurn],
    ) -> Result<String> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(format!("gated: {question}"))
    }
}

/// Sleeps far past any deadline used in the tests.
pub struct SlowAnswerer;

#[async_trait]
impl Answerer for SlowAnswerer {
    async fn answer(
        &self,
        _question: &str,
        _context: &[Chunk],
        _history: &[ConversationTurn],
    ) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("too late".into())
    }
}

/// A chunk with the given text and no metadata.
pub fn chunk(id: &str, text: &str) -> Chunk {
    Chunk {
        id: id.to_string(),
        text: text.to_string(),
        metadata: HashMap::new(),
        document_id: "doc".to_string(),
        offset: 0,
    }
}

pub const APPLE_VOCABULARY: [&str; 6] = ["apple", "founded", "iphone", "cupertino", "jobs", "mac"];

/// A few paragraphs about Apple, one topic per paragraph.
pub fn apple_article() -> String {
    [
        "Apple Inc. was founded on April 1, 1976 by Steve Jobs, Steve Wozniak and Ronald Wayne.",
        "The company is headquartered in Cupertino, California, at Apple Park.",
        "The iPhone, introduced in 2007, became the company's best selling product.",
        "The Mac line of personal computers moved to Apple silicon in 2020.",
    ]
    .join("\n\n")
}

/// An index holding [`apple_article`], one paragraph per entry.
pub async fn apple_index(embedder: &dyn Embedder) -> Arc<InMemoryVectorIndex> {
    let index = Arc::new(InMemoryVectorIndex::new());
    let document = Document::new(apple_article()).with_id("apple");
    let chunks = RecursiveChunker::new(100, 0).unwrap().chunk(&document);
    let mut entries = Vec::new();
    for chunk in chunks {
        let vector = embedder.embed(&chunk.text).await.unwrap();
        entries.push((chunk, vector));
    }
    index.insert(entries).await.unwrap();
    index
}
