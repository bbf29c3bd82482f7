//! # Wiki Q&A
//!
//! Loads a text article, indexes it, and answers questions typed on stdin,
//! remembering earlier turns of the conversation.
//!
//! Runs with deterministic local collaborators by default. Build with
//! `--features openai` and set `OPENAI_API_KEY` to use OpenAI embeddings
//! and chat completions instead.
//!
//! Run: `cargo run -p rag-chat-demos --bin wiki_qa -- [article.txt] [config.json]`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use rag_chat::{
    Answerer, Chunk, ConversationTurn, Embedder, FileSource, InMemoryVectorIndex, RagConfig,
    RagPipeline, RecursiveChunker,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_ARTICLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/apple.txt");

// ---------------------------------------------------------------------------
// Local collaborators: hashed bag-of-words embeddings, extractive answers
// ---------------------------------------------------------------------------

struct HashingEmbedder {
    dimensions: usize,
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> rag_chat::Result<Vec<f32>> {
        // Each lowercase word lands in one bucket so shared words mean
        // similar vectors.
        let mut emb = vec![0.0f32; self.dimensions];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| w.len() > 2) {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            emb[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

/// Answers by quoting the best matching passage.
struct ExtractiveAnswerer;

#[async_trait]
impl Answerer for ExtractiveAnswerer {
    async fn answer(
        &self,
        _question: &str,
        context: &[Chunk],
        history: &[ConversationTurn],
    ) -> rag_chat::Result<String> {
        let Some(best) = context.first() else {
            return Ok("I don't know.".to_string());
        };
        Ok(format!("(turn {}) From the article: {}", history.len() + 1, best.text.trim()))
    }

    fn name(&self) -> &str {
        "extractive"
    }
}

#[cfg(feature = "openai")]
fn collaborators() -> anyhow::Result<(Arc<dyn Embedder>, Arc<dyn Answerer>)> {
    if std::env::var("OPENAI_API_KEY").is_ok() {
        let embedder = rag_chat::openai::OpenAIEmbedder::from_env()?;
        let answerer = rag_chat::openai::OpenAIAnswerer::from_env()?;
        tracing::info!("using OpenAI embeddings and chat completions");
        return Ok((Arc::new(embedder), Arc::new(answerer)));
    }
    tracing::warn!("OPENAI_API_KEY not set, falling back to local collaborators");
    Ok(local_collaborators())
}

#[cfg(not(feature = "openai"))]
fn collaborators() -> anyhow::Result<(Arc<dyn Embedder>, Arc<dyn Answerer>)> {
    Ok(local_collaborators())
}

fn local_collaborators() -> (Arc<dyn Embedder>, Arc<dyn Answerer>) {
    (Arc::new(HashingEmbedder { dimensions: 256 }), Arc::new(ExtractiveAnswerer))
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let article = args.next().map(PathBuf::from).unwrap_or_else(|| DEFAULT_ARTICLE.into());
    let config = match args.next() {
        Some(path) => {
            let json = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading config {path}"))?;
            RagConfig::from_json_str(&json)?
        }
        None => RagConfig::default(),
    };

    let (embedder, answerer) = collaborators()?;
    let pipeline = RagPipeline::builder()
        .chunker(Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap)?))
        .config(config)
        .embedder(embedder)
        .vector_index(Arc::new(InMemoryVectorIndex::new()))
        .build()?;

    let ids = pipeline
        .ingest_source(&FileSource::new(&article))
        .await
        .with_context(|| format!("indexing {}", article.display()))?;
    println!("Indexed {} chunk(s) from {}", ids.len(), article.display());

    let session = pipeline.session(answerer)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\nQuestion> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else { break };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "/quit" {
            break;
        }

        match session.ask(question).await {
            Ok(answer) => println!("{answer}"),
            Err(e) if e.is_retryable() => println!("Temporary failure, try again: {e}"),
            Err(e) => return Err(e.into()),
        }
    }

    println!("\n{} question(s) answered.", session.history().await.len());
    Ok(())
}
