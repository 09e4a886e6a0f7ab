//! Cohere integration for askdocs
//!
//! This crate provides the Cohere implementation of the LlmProvider trait.
//! Cohere encodes documents and queries with distinct input types, so the
//! embed purpose passed by the orchestrator matters here.

mod client;
mod config;

#[cfg(test)]
mod tests;

pub use client::CohereClient;
pub use config::CohereConfig;

// Re-export core types for convenience
pub use askdocs_core::{
    EmbedPurpose, Error, GenerationOptions, LlmProvider, Result,
};
