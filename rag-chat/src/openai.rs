//! OpenAI adapters for the [`Embedder`] and [`Answerer`] roles.
//!
//! This module is only available when the `openai` feature is enabled. Both
//! adapters call the HTTP API directly with `reqwest` and never retry.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::answerer::Answerer;
use crate::document::{Chunk, ConversationTurn};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::prompt::{ChatMessage, PromptBuilder};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// The default model for OpenAI embeddings.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// The dimensionality of `text-embedding-ada-002`.
const DEFAULT_DIMENSIONS: usize = 1536;

/// The default chat model.
const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

fn api_key_from_env() -> std::result::Result<String, String> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err("OPENAI_API_KEY environment variable not set".to_string()),
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Send a JSON POST and decode the response, mapping every failure through `fail`.
async fn post_json<Req: Serialize + ?Sized, Resp: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &Req,
    fail: impl Fn(String) -> RagError,
) -> Result<Resp> {
    let response =
        client.post(url).bearer_auth(api_key).json(body).send().await.map_err(|e| {
            error!(%url, error = %e, "request failed");
            fail(format!("request failed: {e}"))
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail =
            serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);

        error!(%url, %status, "API error");
        return Err(fail(format!("API returned {status}: {detail}")));
    }

    response.json().await.map_err(|e| {
        error!(%url, error = %e, "failed to parse response");
        fail(format!("failed to parse response: {e}"))
    })
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`Embedder`] backed by the OpenAI embeddings API.
///
/// # Configuration
///
/// - `model` – defaults to `text-embedding-ada-002`.
/// - `dimensions` – optional dimension override for models that support it.
/// - `api_key` – from the constructor or the `OPENAI_API_KEY` environment variable.
///
/// # Example
///
/// ```rust,ignore
/// use rag_chat::openai::OpenAIEmbedder;
///
/// let embedder = OpenAIEmbedder::from_env()?;
/// let vector = embedder.embed("hello world").await?;
/// ```
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
    /// If set, passed to the API to truncate the returned vectors.
    request_dimensions: Option<usize>,
}

impl OpenAIEmbedder {
    /// Create a new embedder with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Self::error("API key must not be empty"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            request_dimensions: None,
        })
    }

    /// Create a new embedder using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(api_key_from_env().map_err(Self::error)?)
    }

    /// Set the model name (e.g. `text-embedding-3-small`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the output dimensions.
    ///
    /// This also updates the value returned by [`dimensions()`](Embedder::dimensions).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }

    /// Point at an OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a preconfigured HTTP client (proxies, timeouts, TLS roots).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn error(message: impl Into<String>) -> RagError {
        RagError::EmbeddingServiceError { provider: "OpenAI".into(), message: message.into() }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "OpenAI", text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| Self::error("API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "OpenAI",
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.request_dimensions,
        };
        let url = format!("{}/embeddings", self.base_url);
        let mut response: EmbeddingResponse =
            post_json(&self.client, &url, &self.api_key, &request, Self::error).await?;

        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}

// ── Chat completions ───────────────────────────────────────────────

/// An [`Answerer`] backed by the OpenAI chat completions API.
///
/// Retrieved chunks go into the system message; each earlier turn is replayed
/// as a user/assistant pair ahead of the new question.
///
/// # Example
///
/// ```rust,ignore
/// use rag_chat::openai::OpenAIAnswerer;
///
/// let answerer = OpenAIAnswerer::from_env()?.with_temperature(0.0);
/// ```
pub struct OpenAIAnswerer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: Option<f32>,
}

impl OpenAIAnswerer {
    /// Create a new answerer with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Self::error("API key must not be empty"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_CHAT_MODEL.into(),
            temperature: None,
        })
    }

    /// Create a new answerer using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(api_key_from_env().map_err(Self::error)?)
    }

    /// Set the chat model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Point at an OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a preconfigured HTTP client (proxies, timeouts, TLS roots).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn error(message: impl Into<String>) -> RagError {
        RagError::GenerationServiceError { provider: "OpenAI".into(), message: message.into() }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl Answerer for OpenAIAnswerer {
    async fn answer(
        &self,
        question: &str,
        context: &[Chunk],
        history: &[ConversationTurn],
    ) -> Result<String> {
        let messages = PromptBuilder::build_messages(question, context, history);
        debug!(
            provider = "OpenAI",
            model = %self.model,
            message_count = messages.len(),
            "requesting chat completion"
        );

        let request =
            ChatRequest { model: &self.model, messages: &messages, temperature: self.temperature };
        let url = format!("{}/chat/completions", self.base_url);
        let response: ChatResponse =
            post_json(&self.client, &url, &self.api_key, &request, Self::error).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Self::error("API returned no answer"))
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}
