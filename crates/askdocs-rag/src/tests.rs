//! End-to-end pipeline tests over the in-memory backends

use std::sync::Arc;

use async_trait::async_trait;

use askdocs_core::{
    ChatMessage, Chunk, DocumentStore, EmbedPurpose, Error, GenerationOptions, LlmProvider,
    Result,
};

use crate::document_store::InMemoryDocumentStore;
use crate::engine::{EngineOptions, RagEngine};
use crate::templates::TemplateCatalog;
use crate::vector_index::InMemoryVectorIndex;

const DIM: usize = 32;

/// Deterministic offline provider: embeddings are a hashed bag of words, so
/// texts sharing vocabulary land close under cosine similarity, and
/// generation returns a canned answer.
struct StubProvider;

fn bag_of_words(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIM];
    let lowered = text.to_lowercase();
    for word in lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut hash = 7usize;
        for byte in word.bytes() {
            hash = hash.wrapping_mul(31).wrapping_add(byte as usize);
        }
        vector[hash % DIM] += 1.0;
    }
    vector
}

#[async_trait]
impl LlmProvider for StubProvider {
    fn provider_name(&self) -> &'static str {
        "stub"
    }

    fn embedding_dimension(&self) -> usize {
        DIM
    }

    async fn embed_text(&self, text: &str, _purpose: EmbedPurpose) -> Result<Vec<f32>> {
        Ok(bag_of_words(text))
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        _purpose: EmbedPurpose,
    ) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| bag_of_words(t)).collect())
    }

    async fn generate_text(
        &self,
        _messages: &[ChatMessage],
        _options: &GenerationOptions,
    ) -> Result<String> {
        Ok("The capital of France is Paris.".to_string())
    }
}

/// Provider that rejects any batch item containing a marker string,
/// reporting the item's in-batch index like a real provider diagnostic.
struct FailingProvider {
    marker: &'static str,
}

#[async_trait]
impl LlmProvider for FailingProvider {
    fn provider_name(&self) -> &'static str {
        "failing-stub"
    }

    fn embedding_dimension(&self) -> usize {
        DIM
    }

    async fn embed_text(&self, text: &str, purpose: EmbedPurpose) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()], purpose).await?;
        Ok(vectors.pop().expect("one vector for one text"))
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        _purpose: EmbedPurpose,
    ) -> Result<Vec<Vec<f32>>> {
        if let Some(position) = texts.iter().position(|t| t.contains(self.marker)) {
            return Err(Error::provider_at(position, "embedding model rejected input"));
        }
        Ok(texts.iter().map(|t| bag_of_words(t)).collect())
    }

    async fn generate_text(
        &self,
        _messages: &[ChatMessage],
        _options: &GenerationOptions,
    ) -> Result<String> {
        Err(Error::provider("generation unavailable"))
    }
}

fn paris_chunks() -> Vec<Chunk> {
    vec![
        Chunk::new("p1", "doc-1", 0, "Paris is the capital of France."),
        Chunk::new("p1", "doc-1", 1, "It has the Eiffel Tower."),
        Chunk::new("p1", "doc-1", 2, "Population is about 2 million."),
    ]
}

fn engine_with(
    store: Arc<InMemoryDocumentStore>,
    provider: Arc<dyn LlmProvider>,
) -> RagEngine {
    RagEngine::new(
        provider.clone(),
        provider,
        Arc::new(InMemoryVectorIndex::new()),
        store,
        TemplateCatalog::builtin("en"),
        EngineOptions {
            embed_batch_size: 2,
            ..EngineOptions::default()
        },
    )
}

#[tokio::test]
async fn index_push_reports_the_vector_count() {
    let store = Arc::new(InMemoryDocumentStore::new());
    store
        .replace_chunks("p1", "doc-1", paris_chunks())
        .await
        .unwrap();

    let engine = engine_with(store, Arc::new(StubProvider));
    assert_eq!(engine.index_project("p1").await.unwrap(), 3);

    let info = engine.project_info("p1").await.unwrap();
    assert_eq!(info.vector_count, 3);
    assert_eq!(info.dimension, DIM);
}

#[tokio::test]
async fn search_finds_the_capital_chunk_first() {
    let store = Arc::new(InMemoryDocumentStore::new());
    store
        .replace_chunks("p1", "doc-1", paris_chunks())
        .await
        .unwrap();

    let engine = engine_with(store, Arc::new(StubProvider));
    engine.index_project("p1").await.unwrap();

    let results = engine
        .search("p1", "What is the capital of France?", 1)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text, "Paris is the capital of France.");
}

#[tokio::test]
async fn over_asking_top_k_is_clamped_not_an_error() {
    let store = Arc::new(InMemoryDocumentStore::new());
    store
        .replace_chunks("p1", "doc-1", paris_chunks())
        .await
        .unwrap();

    let engine = engine_with(store, Arc::new(StubProvider));
    engine.index_project("p1").await.unwrap();

    let results = engine.search("p1", "Paris", 50).await.unwrap();
    assert_eq!(results.len(), 3);
}

#[tokio::test]
async fn answer_surfaces_the_prompt_with_chunk_and_question() {
    let store = Arc::new(InMemoryDocumentStore::new());
    store
        .replace_chunks("p1", "doc-1", paris_chunks())
        .await
        .unwrap();

    let engine = engine_with(store, Arc::new(StubProvider));
    engine.index_project("p1").await.unwrap();

    let answer = engine
        .answer("p1", "What is the capital of France?", 1, "en")
        .await
        .unwrap();

    assert!(!answer.text.is_empty());
    assert!(answer.prompt_used.contains("Paris is the capital of France."));
    assert!(answer.prompt_used.contains("What is the capital of France?"));
    assert_eq!(answer.retrieved_chunks.len(), 1);

    // System instruction precedes the documents, which precede the question.
    let system_at = answer.prompt_used.find("provided documents").unwrap();
    let chunk_at = answer.prompt_used.find("Paris is the capital").unwrap();
    let question_at = answer
        .prompt_used
        .find("What is the capital of France?")
        .unwrap();
    assert!(system_at < chunk_at);
    assert!(chunk_at < question_at);
}

#[tokio::test]
async fn search_before_index_push_is_collection_not_found() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let engine = engine_with(store, Arc::new(StubProvider));

    let err = engine.search("never-indexed", "anything", 5).await.unwrap_err();
    assert!(matches!(err, Error::CollectionNotFound(_)));

    let err = engine
        .answer("never-indexed", "anything", 5, "en")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CollectionNotFound(_)));
}

#[tokio::test]
async fn empty_project_still_answers_without_documents() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let engine = engine_with(store, Arc::new(StubProvider));

    // No chunks stored; the push still creates the collection.
    assert_eq!(engine.index_project("p-empty").await.unwrap(), 0);

    let answer = engine
        .answer("p-empty", "What is the capital of France?", 5, "en")
        .await
        .unwrap();
    assert!(!answer.text.is_empty());
    assert!(answer.retrieved_chunks.is_empty());
    assert!(answer.prompt_used.contains("What is the capital of France?"));
}

#[tokio::test]
async fn failing_batch_aborts_the_push_and_keeps_earlier_vectors() {
    let store = Arc::new(InMemoryDocumentStore::new());
    store
        .replace_chunks(
            "p1",
            "doc-1",
            vec![
                Chunk::new("p1", "doc-1", 0, "first fine chunk"),
                Chunk::new("p1", "doc-1", 1, "second fine chunk"),
                Chunk::new("p1", "doc-1", 2, "BOOM chunk the provider rejects"),
            ],
        )
        .await
        .unwrap();

    let engine = engine_with(store, Arc::new(FailingProvider { marker: "BOOM" }));

    let err = engine.index_project("p1").await.unwrap_err();
    match err {
        Error::Provider { failed_index, .. } => assert_eq!(failed_index, Some(0)),
        other => panic!("unexpected error kind: {other}"),
    }

    // Batch size is 2: the first batch was upserted before the failure and
    // stays in place; retrying the push is safe because upsert is
    // idempotent per chunk id.
    let info = engine.project_info("p1").await.unwrap();
    assert_eq!(info.vector_count, 2);
}

#[tokio::test]
async fn re_pushing_unchanged_chunks_does_not_duplicate() {
    let store = Arc::new(InMemoryDocumentStore::new());
    store
        .replace_chunks("p1", "doc-1", paris_chunks())
        .await
        .unwrap();

    let engine = engine_with(store, Arc::new(StubProvider));
    engine.index_project("p1").await.unwrap();
    engine.index_project("p1").await.unwrap();

    assert_eq!(engine.project_info("p1").await.unwrap().vector_count, 3);
}

#[tokio::test]
async fn stale_ids_survive_a_shrinking_rechunk_until_reset() {
    let store = Arc::new(InMemoryDocumentStore::new());
    store
        .replace_chunks("p1", "doc-1", paris_chunks())
        .await
        .unwrap();

    let engine = engine_with(store.clone(), Arc::new(StubProvider));
    engine.index_project("p1").await.unwrap();

    // Re-chunk down to two chunks; ordinal 2 from the first pass lingers.
    store
        .replace_chunks(
            "p1",
            "doc-1",
            vec![
                Chunk::new("p1", "doc-1", 0, "Paris is the capital of France."),
                Chunk::new("p1", "doc-1", 1, "It has the Eiffel Tower."),
            ],
        )
        .await
        .unwrap();
    engine.index_project("p1").await.unwrap();
    assert_eq!(engine.project_info("p1").await.unwrap().vector_count, 3);

    // Explicit reset then re-push is the supported recovery.
    engine.reset_project("p1").await.unwrap();
    engine.index_project("p1").await.unwrap();
    assert_eq!(engine.project_info("p1").await.unwrap().vector_count, 2);
}

#[tokio::test]
async fn concurrent_pushes_for_one_project_agree() {
    let store = Arc::new(InMemoryDocumentStore::new());
    store
        .replace_chunks("p1", "doc-1", paris_chunks())
        .await
        .unwrap();

    let engine = Arc::new(engine_with(store, Arc::new(StubProvider)));

    let (a, b) = tokio::join!(
        {
            let engine = Arc::clone(&engine);
            async move { engine.index_project("p1").await }
        },
        {
            let engine = Arc::clone(&engine);
            async move { engine.index_project("p1").await }
        }
    );

    assert_eq!(a.unwrap(), 3);
    assert_eq!(b.unwrap(), 3);
    assert_eq!(engine.project_info("p1").await.unwrap().vector_count, 3);
}

#[tokio::test]
async fn answers_render_in_the_requested_locale_with_fallback() {
    let store = Arc::new(InMemoryDocumentStore::new());
    store
        .replace_chunks("p1", "doc-1", paris_chunks())
        .await
        .unwrap();

    let engine = engine_with(store, Arc::new(StubProvider));
    engine.index_project("p1").await.unwrap();

    let arabic = engine
        .answer("p1", "ما هي عاصمة فرنسا؟", 1, "ar")
        .await
        .unwrap();
    assert!(arabic.prompt_used.contains("السؤال"));

    // A locale with no templates falls back to the default catalog.
    let fallback = engine
        .answer("p1", "What is the capital of France?", 1, "de")
        .await
        .unwrap();
    assert!(fallback.prompt_used.contains("## Question:"));
}
