//! Error types for the askdocs pipeline

use std::time::Duration;

use thiserror::Error;

use crate::vector_index::DistanceMetric;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared across the pipeline.
///
/// Kinds cross component boundaries intact so the orchestrator and its
/// caller can choose retry vs. abort vs. user message per kind.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller-fixable misconfiguration (bad chunk sizing, template variable
    /// mismatch). Surfaced immediately, never retried.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Upstream embedding or generation failure, carrying the provider's
    /// raw diagnostic. `failed_index` names the first failing item of a
    /// batch call when the provider response identifies one, so the caller
    /// can retry the whole batch or split it.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        failed_index: Option<usize>,
    },

    /// A provider call exceeded its deadline.
    #[error("provider call timed out after {0:?}")]
    ProviderTimeout(Duration),

    /// An existing collection was requested with a different dimension or
    /// metric. Fatal: delete and recreate the collection to change the
    /// embedding model.
    #[error(
        "collection {collection} holds {existing_dimension}-dim {existing_metric} vectors, \
         requested {requested_dimension}-dim {requested_metric}"
    )]
    SchemaConflict {
        collection: String,
        existing_dimension: usize,
        requested_dimension: usize,
        existing_metric: DistanceMetric,
        requested_metric: DistanceMetric,
    },

    /// Search or answer issued before the project was ever indexed.
    #[error("collection not found: {0}; index the project before searching")]
    CollectionNotFound(String),

    /// Template missing in the requested locale and every fallback locale.
    #[error("template {name} not found in locales {tried:?}")]
    TemplateNotFound { name: String, tried: Vec<String> },

    #[error("vector index error: {0}")]
    VectorIndex(String),

    #[error("document store error: {0}")]
    DocumentStore(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Provider failure with no batch position attached.
    pub fn provider(message: impl Into<String>) -> Self {
        Error::Provider {
            message: message.into(),
            failed_index: None,
        }
    }

    /// Provider failure pinned to the first failing batch index.
    pub fn provider_at(index: usize, message: impl Into<String>) -> Self {
        Error::Provider {
            message: message.into(),
            failed_index: Some(index),
        }
    }

    /// Timeouts are provider errors for retry purposes; everything else in
    /// the taxonomy is either caller-fixable or fatal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Provider { .. } | Error::ProviderTimeout(_))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::provider(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_retryable_like_a_provider_error() {
        assert!(Error::ProviderTimeout(Duration::from_secs(30)).is_retryable());
        assert!(Error::provider("rate limited").is_retryable());
        assert!(!Error::InvalidConfiguration("overlap too large".into()).is_retryable());
        assert!(!Error::CollectionNotFound("collection_p1".into()).is_retryable());
    }

    #[test]
    fn provider_error_keeps_first_failing_index() {
        let err = Error::provider_at(3, "embedding rejected");
        match err {
            Error::Provider { failed_index, .. } => assert_eq!(failed_index, Some(3)),
            other => panic!("unexpected error kind: {other}"),
        }
    }

    #[test]
    fn schema_conflict_names_both_sides() {
        let err = Error::SchemaConflict {
            collection: "collection_p1".into(),
            existing_dimension: 1536,
            requested_dimension: 1024,
            existing_metric: DistanceMetric::Cosine,
            requested_metric: DistanceMetric::Dot,
        };
        let msg = err.to_string();
        assert!(msg.contains("1536"));
        assert!(msg.contains("1024"));
        assert!(msg.contains("cosine"));
    }
}
