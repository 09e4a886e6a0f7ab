//! OpenAI client implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::debug;

use askdocs_core::{
    ChatMessage, EmbedPurpose, Error, GenerationOptions, LlmProvider, Result,
};

use crate::config::OpenAiConfig;

/// OpenAI client serving both the embedding and generation roles
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
    embedding_model: String,
    embedding_dimension: usize,
    generation_model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ApiMessage,
}

impl OpenAiClient {
    /// Model constants
    pub const TEXT_EMBEDDING_3_SMALL: &'static str = "text-embedding-3-small";
    pub const GPT_4O_MINI: &'static str = "gpt-4o-mini";

    /// Dimensionality of `text-embedding-3-small`
    pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;

    /// Create a new OpenAI client from configuration
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::provider(e.to_string()))?;

        Ok(Self {
            config,
            client,
            embedding_model: Self::TEXT_EMBEDDING_3_SMALL.to_string(),
            embedding_dimension: Self::DEFAULT_EMBEDDING_DIMENSION,
            generation_model: Self::GPT_4O_MINI.to_string(),
            timeout: Duration::from_secs(60),
        })
    }

    /// Create a new OpenAI client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = OpenAiConfig::from_env()?;
        Self::new(config)
    }

    /// Set the embedding model and its vector dimensionality
    pub fn with_embedding_model(mut self, model_id: impl Into<String>, dimension: usize) -> Self {
        self.embedding_model = model_id.into();
        self.embedding_dimension = dimension;
        self
    }

    /// Set the generation model
    pub fn with_generation_model(mut self, model_id: impl Into<String>) -> Self {
        self.generation_model = model_id.into();
        self
    }

    /// Set the per-call deadline for embedding requests
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        deadline: Duration,
    ) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.config.api_url.trim_end_matches('/'), path);

        let response = timeout(
            deadline,
            self.client
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(body)
                .send(),
        )
        .await
        .map_err(|_| Error::ProviderTimeout(deadline))?
        .map_err(|e| Error::provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unreadable error body".to_string());
            return Err(Error::provider(format!(
                "openai request to {path} failed with status {status}: {body}"
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn embedding_dimension(&self) -> usize {
        self.embedding_dimension
    }

    async fn embed_text(&self, text: &str, purpose: EmbedPurpose) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()], purpose).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::provider("empty embedding response"))
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        _purpose: EmbedPurpose,
    ) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = texts.len(), model = %self.embedding_model, "embedding batch");

        let request = EmbeddingsRequest {
            model: &self.embedding_model,
            input: texts,
        };

        let response = self
            .post_json("embeddings", &request, self.timeout)
            .await?;

        let body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("malformed embeddings response: {e}")))?;

        // The API tags each vector with its input index; realign so the
        // output is 1:1 with the input and surface the first hole.
        let mut vectors: Vec<Option<Vec<f32>>> = (0..texts.len()).map(|_| None).collect();
        for item in body.data {
            if item.index < vectors.len() {
                vectors[item.index] = Some(item.embedding);
            }
        }

        vectors
            .into_iter()
            .enumerate()
            .map(|(i, v)| v.ok_or_else(|| Error::provider_at(i, "missing embedding in response")))
            .collect()
    }

    async fn generate_text(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String> {
        debug!(
            model = %self.generation_model,
            messages = messages.len(),
            "requesting chat completion"
        );

        let request = ChatRequest {
            model: &self.generation_model,
            messages: messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: options.max_output_tokens,
            temperature: options.temperature,
        };

        let response = self
            .post_json("chat/completions", &request, options.timeout)
            .await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("malformed chat response: {e}")))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::provider("empty completion from openai"));
        }

        Ok(text)
    }
}
