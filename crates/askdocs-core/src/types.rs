//! Common types used across the askdocs pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An isolated namespace for documents, chunks, and one vector collection.
///
/// Created on first reference by the document store; never merged with
/// another project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
        }
    }
}

/// A contiguous span of normalized text extracted from a source document.
///
/// Immutable once created. `(document_id, ordinal)` is unique within a
/// project and defines retrieval-display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub project_id: String,
    pub document_id: String,
    pub ordinal: usize,
    pub text: String,
}

impl Chunk {
    pub fn new(
        project_id: impl Into<String>,
        document_id: impl Into<String>,
        ordinal: usize,
        text: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            document_id: document_id.into(),
            ordinal,
            text: text.into(),
        }
    }

    /// Deterministic vector-point id for this chunk.
    ///
    /// Derived from the chunk's coordinates, not its text, so re-chunking a
    /// document reuses ids per ordinal and a later upsert overwrites the
    /// old vector instead of duplicating it.
    pub fn stable_id(&self) -> String {
        let digest = md5::compute(format!(
            "{}:{}:{}",
            self.project_id, self.document_id, self.ordinal
        ));
        uuid::Uuid::from_bytes(digest.0).to_string()
    }
}

/// Role tag for one prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => f.write_str("system"),
            MessageRole::User => f.write_str("user"),
            MessageRole::Assistant => f.write_str("assistant"),
        }
    }
}

/// One role-tagged message of an assembled prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// One retrieval hit: chunk text plus its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub score: f32,
}

/// Generated answer together with the prompt and retrieved chunks that
/// produced it, surfaced for debuggability and evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub prompt_used: String,
    pub retrieved_chunks: Vec<RetrievedChunk>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_id_is_deterministic_per_coordinates() {
        let a = Chunk::new("p1", "doc-1", 0, "Paris is the capital of France.");
        let b = Chunk::new("p1", "doc-1", 0, "completely different text");
        let c = Chunk::new("p1", "doc-1", 1, "Paris is the capital of France.");

        assert_eq!(a.stable_id(), b.stable_id());
        assert_ne!(a.stable_id(), c.stable_id());
    }

    #[test]
    fn stable_id_is_a_valid_uuid() {
        let chunk = Chunk::new("p1", "doc-1", 7, "text");
        let id = chunk.stable_id();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn stable_id_separates_projects() {
        let a = Chunk::new("p1", "doc-1", 0, "text");
        let b = Chunk::new("p2", "doc-1", 0, "text");
        assert_ne!(a.stable_id(), b.stable_id());
    }
}
