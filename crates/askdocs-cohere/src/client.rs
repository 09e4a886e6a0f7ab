//! Cohere client implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::debug;

use askdocs_core::{
    ChatMessage, EmbedPurpose, Error, GenerationOptions, LlmProvider, Result,
};

use crate::config::CohereConfig;

/// Cohere client serving both the embedding and generation roles
pub struct CohereClient {
    config: CohereConfig,
    client: Client,
    embedding_model: String,
    embedding_dimension: usize,
    generation_model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    texts: &'a [String],
    input_type: &'a str,
    embedding_types: [&'a str; 1],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: EmbedVariants,
}

#[derive(Deserialize)]
struct EmbedVariants {
    float: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl CohereClient {
    /// Model constants
    pub const EMBED_V4: &'static str = "embed-v4.0";
    pub const COMMAND_R7B: &'static str = "command-r7b-12-2024";

    /// Dimensionality of `embed-v4.0` at its default output size
    pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;

    /// Create a new Cohere client from configuration
    pub fn new(config: CohereConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::provider(e.to_string()))?;

        Ok(Self {
            config,
            client,
            embedding_model: Self::EMBED_V4.to_string(),
            embedding_dimension: Self::DEFAULT_EMBEDDING_DIMENSION,
            generation_model: Self::COMMAND_R7B.to_string(),
            timeout: Duration::from_secs(60),
        })
    }

    /// Create a new Cohere client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = CohereConfig::from_env()?;
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

    fn input_type(purpose: EmbedPurpose) -> &'static str {
        match purpose {
            EmbedPurpose::Document => "search_document",
            EmbedPurpose::Query => "search_query",
        }
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
                "cohere request to {path} failed with status {status}: {body}"
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for CohereClient {
    fn provider_name(&self) -> &'static str {
        "cohere"
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
        purpose: EmbedPurpose,
    ) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            count = texts.len(),
            model = %self.embedding_model,
            input_type = Self::input_type(purpose),
            "embedding batch"
        );

        let request = EmbedRequest {
            model: &self.embedding_model,
            texts,
            input_type: Self::input_type(purpose),
            embedding_types: ["float"],
        };

        let response = self.post_json("v2/embed", &request, self.timeout).await?;

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("malformed embed response: {e}")))?;

        let vectors = body.embeddings.float;
        if vectors.len() != texts.len() {
            // The response is index-aligned, so the first missing position
            // is the first item the provider failed on.
            return Err(Error::provider_at(
                vectors.len().min(texts.len()),
                format!(
                    "embed returned {} vectors for {} inputs",
                    vectors.len(),
                    texts.len()
                ),
            ));
        }

        Ok(vectors)
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
            .post_json("v2/chat", &request, options.timeout)
            .await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("malformed chat response: {e}")))?;

        let text = body
            .message
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(Error::provider("empty completion from cohere"));
        }

        Ok(text)
    }
}
