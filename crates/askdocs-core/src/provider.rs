//! LLM provider capability shared by the embedding and generation roles

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::types::ChatMessage;

/// How an embedding will be used.
///
/// Some providers encode documents and queries differently (Cohere's
/// `search_document` vs `search_query` input types); providers without the
/// distinction ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedPurpose {
    Document,
    Query,
}

/// Knobs for one generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_output_tokens: 512,
            temperature: 0.1,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Trait for LLM providers (OpenAI, Cohere, ...).
///
/// One implementation per provider, selected once at startup via
/// configuration. The same capability serves two roles: the embedding
/// provider and the generation provider, which may be different variants.
///
/// Contract notes:
/// - `embed_batch` preserves input order 1:1 with output and never silently
///   drops an item; a failure on any item fails the whole call with a
///   provider error carrying the first failing index when identifiable.
/// - Embedding calls are idempotent up to provider-side nondeterminism.
/// - `generate_text` is synchronous request/response; partial tokens are
///   never streamed back to the caller. Generation is not auto-retried
///   because sampling is nondeterministic.
/// - Every call runs under the caller-supplied or default timeout and
///   surfaces a timeout error rather than hanging.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short identifier for logs and diagnostics.
    fn provider_name(&self) -> &'static str;

    /// Dimensionality of vectors produced by the configured embedding
    /// model. Fixed for the lifetime of a collection.
    fn embedding_dimension(&self) -> usize;

    /// Embed a single text.
    async fn embed_text(&self, text: &str, purpose: EmbedPurpose) -> Result<Vec<f32>>;

    /// Embed a batch of texts, output index-aligned with input.
    async fn embed_batch(&self, texts: &[String], purpose: EmbedPurpose)
    -> Result<Vec<Vec<f32>>>;

    /// Generate a completion for an assembled prompt.
    async fn generate_text(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String>;
}
