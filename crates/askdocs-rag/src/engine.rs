//! RAG orchestrator

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use askdocs_core::{
    Answer, AppConfig, ChatMessage, ChunkPayload, CollectionInfo, DistanceMetric, DocumentStore,
    EmbedPurpose, GenerationOptions, LlmProvider, Result, RetrievedChunk, VectorIndex,
    VectorRecord,
};

use crate::templates::{
    TEMPLATE_RAG_DOCUMENT, TEMPLATE_RAG_FOOTER, TEMPLATE_RAG_SYSTEM, TemplateCatalog,
};

/// Deterministic collection name for a project, so index-push and search
/// always agree without a lookup table.
pub fn collection_name(project_id: &str) -> String {
    format!("collection_{project_id}")
}

/// Orchestrator tunables, fixed at construction.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub distance_metric: DistanceMetric,
    pub embed_batch_size: usize,
    pub default_locale: String,
    pub default_top_k: usize,
    pub max_input_characters: usize,
    pub generation: GenerationOptions,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            distance_metric: DistanceMetric::Cosine,
            embed_batch_size: 32,
            default_locale: "en".to_string(),
            default_top_k: 5,
            max_input_characters: 4096,
            generation: GenerationOptions::default(),
        }
    }
}

impl EngineOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            distance_metric: config.distance_metric,
            embed_batch_size: config.embed_batch_size,
            default_locale: config.default_locale.clone(),
            default_top_k: config.default_top_k,
            max_input_characters: config.max_input_characters,
            generation: GenerationOptions {
                max_output_tokens: config.max_output_tokens,
                temperature: config.temperature,
                timeout: config.provider_timeout,
            },
        }
    }
}

/// Composes the chunk store, embedding provider, vector index, templates,
/// and generation provider into the three pipeline operations: index-push,
/// search, and answer.
///
/// The provider and index handles are stateless from the engine's
/// perspective and shared across concurrent invocations; the engine itself
/// holds no per-request state.
pub struct RagEngine {
    embedder: Arc<dyn LlmProvider>,
    generator: Arc<dyn LlmProvider>,
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn DocumentStore>,
    templates: TemplateCatalog,
    options: EngineOptions,
    collection_guard: Mutex<()>,
}

impl RagEngine {
    pub fn new(
        embedder: Arc<dyn LlmProvider>,
        generator: Arc<dyn LlmProvider>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn DocumentStore>,
        templates: TemplateCatalog,
        options: EngineOptions,
    ) -> Self {
        Self {
            embedder,
            generator,
            index,
            store,
            templates,
            options,
            collection_guard: Mutex::new(()),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Embed and upsert every chunk of the project. Returns the number of
    /// vectors indexed.
    ///
    /// Re-running after chunks changed leaves the collection consistent for
    /// the current chunk ids; ids from an earlier chunking pass that no
    /// longer exist are not pruned. Use [`RagEngine::reset_project`] before
    /// a full re-chunk. A failing batch aborts the push and leaves the
    /// vectors upserted so far in place, which is safe to retry because
    /// upsert is idempotent per id.
    pub async fn index_project(&self, project_id: &str) -> Result<usize> {
        let chunks = self.store.get_chunks(project_id).await?;
        let collection = collection_name(project_id);
        let dimension = self.embedder.embedding_dimension();

        {
            // Creation is idempotent, but serializing it keeps two
            // concurrent pushes for the same project from interleaving
            // creation with the first upsert.
            let _guard = self.collection_guard.lock().await;
            self.index
                .ensure_collection(&collection, dimension, self.options.distance_metric)
                .await?;
        }

        let mut indexed = 0usize;
        for batch in chunks.chunks(self.options.embed_batch_size.max(1)) {
            let texts: Vec<String> = batch
                .iter()
                .map(|c| truncate_chars(&c.text, self.options.max_input_characters))
                .collect();

            let vectors = self
                .embedder
                .embed_batch(&texts, EmbedPurpose::Document)
                .await?;

            let records: Vec<VectorRecord> = batch
                .iter()
                .zip(vectors)
                .map(|(chunk, vector)| VectorRecord {
                    id: chunk.stable_id(),
                    vector,
                    payload: ChunkPayload {
                        text: chunk.text.clone(),
                        document_id: chunk.document_id.clone(),
                        ordinal: chunk.ordinal,
                    },
                })
                .collect();

            let count = records.len();
            self.index.upsert(&collection, records).await?;
            indexed += count;
            debug!(project = project_id, indexed, "batch upserted");
        }

        info!(project = project_id, vectors = indexed, "index push complete");
        Ok(indexed)
    }

    /// Embed the query and return the `top_k` most similar chunks.
    pub async fn search(
        &self,
        project_id: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let query_text = truncate_chars(query, self.options.max_input_characters);
        let vector = self
            .embedder
            .embed_text(&query_text, EmbedPurpose::Query)
            .await?;

        let hits = self
            .index
            .search(&collection_name(project_id), &vector, top_k)
            .await?;

        Ok(hits
            .into_iter()
            .map(|hit| RetrievedChunk {
                text: hit.text,
                score: hit.score,
            })
            .collect())
    }

    /// Search, assemble the RAG prompt, and generate an answer.
    ///
    /// Zero retrieved chunks still renders the prompt; the model is free to
    /// answer from its own knowledge or decline. Generation is never
    /// auto-retried.
    pub async fn answer(
        &self,
        project_id: &str,
        question: &str,
        top_k: usize,
        locale: &str,
    ) -> Result<Answer> {
        let retrieved = self.search(project_id, question, top_k).await?;
        let messages = self.build_prompt(locale, question, &retrieved)?;
        let prompt_used = flatten_prompt(&messages);

        let text = self
            .generator
            .generate_text(&messages, &self.options.generation)
            .await?;

        Ok(Answer {
            text,
            prompt_used,
            retrieved_chunks: retrieved,
        })
    }

    /// Delete the project's collection. The explicit recovery path before a
    /// full re-chunk.
    pub async fn reset_project(&self, project_id: &str) -> Result<()> {
        self.index
            .delete_collection(&collection_name(project_id))
            .await
    }

    /// Facts about the project's collection.
    pub async fn project_info(&self, project_id: &str) -> Result<CollectionInfo> {
        self.index
            .collection_info(&collection_name(project_id))
            .await
    }

    /// System instruction, ranked chunk blocks, then the question. The
    /// order is a contract; generation providers are sensitive to it.
    fn build_prompt(
        &self,
        locale: &str,
        question: &str,
        retrieved: &[RetrievedChunk],
    ) -> Result<Vec<ChatMessage>> {
        let system = self
            .templates
            .render(locale, TEMPLATE_RAG_SYSTEM, &HashMap::new())?;

        let mut blocks = Vec::with_capacity(retrieved.len() + 1);
        for (rank, chunk) in retrieved.iter().enumerate() {
            let mut vars = HashMap::new();
            vars.insert("rank", (rank + 1).to_string());
            vars.insert("chunk_text", chunk.text.clone());
            blocks.push(self.templates.render(locale, TEMPLATE_RAG_DOCUMENT, &vars)?);
        }

        let mut vars = HashMap::new();
        vars.insert("question", question.to_string());
        blocks.push(self.templates.render(locale, TEMPLATE_RAG_FOOTER, &vars)?);

        Ok(vec![
            ChatMessage::system(system),
            ChatMessage::user(blocks.join("\n\n")),
        ])
    }
}

/// Readable one-string form of the prompt, surfaced on every answer.
fn flatten_prompt(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Cut at a character count without splitting a code point.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => text[..byte].to_string(),
        None => text.to_string(),
    }
}
