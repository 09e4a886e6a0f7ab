//! Environment-driven configuration

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vector_index::DistanceMetric;

/// Which provider backend fills a role (embedding or generation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Cohere,
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "cohere" => Ok(Self::Cohere),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown provider backend: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAi => f.write_str("openai"),
            ProviderKind::Cohere => f.write_str("cohere"),
        }
    }
}

/// Immutable application configuration, constructed once at startup and
/// passed into each component. No component reads ambient global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub embedding_backend: ProviderKind,
    pub generation_backend: ProviderKind,
    pub embedding_model_id: String,
    pub embedding_dimension: usize,
    pub generation_model_id: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub distance_metric: DistanceMetric,
    pub primary_locale: String,
    pub default_locale: String,
    pub default_top_k: usize,
    pub provider_timeout: Duration,
    pub embed_batch_size: usize,
    pub max_input_characters: usize,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub qdrant_url: String,
}

impl AppConfig {
    /// Create configuration from environment variables (a `.env` file is
    /// honored when present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            embedding_backend: env::var("EMBEDDING_BACKEND")
                .unwrap_or_else(|_| "openai".to_string())
                .parse()?,
            generation_backend: env::var("GENERATION_BACKEND")
                .unwrap_or_else(|_| "openai".to_string())
                .parse()?,
            embedding_model_id: env::var("EMBEDDING_MODEL_ID")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            embedding_dimension: parse_var("EMBEDDING_MODEL_SIZE", 1536)?,
            generation_model_id: env::var("GENERATION_MODEL_ID")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            chunk_size: parse_var("FILE_DEFAULT_CHUNK_SIZE", 1000)?,
            chunk_overlap: parse_var("CHUNK_OVERLAP", 100)?,
            distance_metric: env::var("VECTOR_DB_DISTANCE_METHOD")
                .unwrap_or_else(|_| "cosine".to_string())
                .parse()?,
            primary_locale: env::var("PRIMARY_LANG").unwrap_or_else(|_| "en".to_string()),
            default_locale: env::var("DEFAULT_LANG").unwrap_or_else(|_| "en".to_string()),
            default_top_k: parse_var("DEFAULT_TOP_K", 5)?,
            provider_timeout: Duration::from_secs(parse_var("PROVIDER_TIMEOUT_SECONDS", 60)?),
            embed_batch_size: parse_var("EMBED_BATCH_SIZE", 32)?,
            max_input_characters: parse_var("INPUT_DEFAULT_MAX_CHARACTERS", 4096)?,
            max_output_tokens: parse_var("GENERATION_DEFAULT_MAX_OUTPUT_TOKENS", 512)?,
            temperature: parse_var("GENERATION_DEFAULT_TEMPERATURE", 0.1)?,
            qdrant_url: env::var("QDRANT_URL")
                .unwrap_or_else(|_| "http://localhost:6334".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfiguration(
                "chunk size must be at least 1".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfiguration(format!(
                "chunk overlap {} must be smaller than chunk size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.embedding_dimension == 0 {
            return Err(Error::InvalidConfiguration(
                "embedding dimension must be at least 1".to_string(),
            ));
        }
        if self.default_top_k == 0 {
            return Err(Error::InvalidConfiguration(
                "default top-k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| Error::InvalidConfiguration(format!("{key}: {e}"))),
        Err(_) => Ok(default),
    }
}
