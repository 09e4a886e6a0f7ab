//! RAG pipeline for askdocs
//!
//! This crate implements the retrieval-augmented generation pipeline:
//! chunking, prompt templates with locale fallback, vector index
//! implementations (Qdrant and in-memory), the in-memory document store,
//! and the orchestrator composing them into index-push, search, and answer.

mod chunker;
mod document_store;
mod engine;
mod templates;
mod vector_index;

#[cfg(test)]
mod tests;

pub use chunker::{ChunkSplitter, split_text};
pub use document_store::InMemoryDocumentStore;
pub use engine::{EngineOptions, RagEngine, collection_name};
pub use templates::{
    TEMPLATE_RAG_DOCUMENT, TEMPLATE_RAG_FOOTER, TEMPLATE_RAG_SYSTEM, TemplateCatalog,
};
pub use vector_index::{InMemoryVectorIndex, QdrantVectorIndex};

// Re-export core types for convenience
pub use askdocs_core::{
    Answer, ChatMessage, Chunk, ChunkPayload, CollectionInfo, DistanceMetric, DocumentStore,
    EmbedPurpose, Error, GenerationOptions, LlmProvider, MessageRole, Project, Result,
    RetrievedChunk, ScoredChunk, VectorIndex, VectorRecord,
};
