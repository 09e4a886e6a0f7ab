//! Core traits and types for askdocs
//!
//! This crate defines the fundamental contracts the RAG pipeline is built
//! from: LLM providers (embedding and generation), the vector index, and the
//! document store, together with the shared error taxonomy and the
//! environment-driven configuration. Everything here is capability-facing so
//! the orchestration layer never branches on a concrete backend.

pub mod config;
pub mod document_store;
pub mod error;
pub mod provider;
pub mod types;
pub mod vector_index;

pub use config::{AppConfig, ProviderKind};
pub use document_store::DocumentStore;
pub use error::{Error, Result};
pub use provider::{EmbedPurpose, GenerationOptions, LlmProvider};
pub use types::{Answer, ChatMessage, Chunk, MessageRole, Project, RetrievedChunk};
pub use vector_index::{
    ChunkPayload, CollectionInfo, DistanceMetric, ScoredChunk, VectorIndex, VectorRecord,
};
