//! OpenAI integration for askdocs
//!
//! This crate provides the OpenAI implementation of the LlmProvider trait,
//! covering both the embedding role (`/embeddings`) and the generation role
//! (`/chat/completions`).

mod client;
mod config;

#[cfg(test)]
mod tests;

pub use client::OpenAiClient;
pub use config::OpenAiConfig;

// Re-export core types for convenience
pub use askdocs_core::{
    EmbedPurpose, Error, GenerationOptions, LlmProvider, Result,
};
