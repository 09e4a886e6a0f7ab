//! Vector index capability and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Similarity metric for a collection.
///
/// Fixed per collection for its lifetime; cosine is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Cosine,
    Dot,
    Euclid,
}

impl std::str::FromStr for DistanceMetric {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "dot" => Ok(Self::Dot),
            "euclid" | "euclidean" => Ok(Self::Euclid),
            other => Err(crate::Error::InvalidConfiguration(format!(
                "unknown distance metric: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceMetric::Cosine => f.write_str("cosine"),
            DistanceMetric::Dot => f.write_str("dot"),
            DistanceMetric::Euclid => f.write_str("euclid"),
        }
    }
}

/// Payload stored alongside each chunk vector, enough to reconstruct the
/// retrieval result without consulting the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub text: String,
    pub document_id: String,
    pub ordinal: usize,
}

/// One vector ready for upsert, keyed by the chunk's stable id.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

/// One search hit with its payload reconstructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: String,
    pub text: String,
    pub document_id: String,
    pub ordinal: usize,
    pub score: f32,
}

/// Aggregate facts about a collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub vector_count: usize,
    pub dimension: usize,
    pub metric: DistanceMetric,
}

/// Trait for vector indexes (Qdrant, in-memory, ...).
///
/// One implementation is active at a time, selected at startup. Contract
/// notes:
/// - `ensure_collection` is idempotent: re-creating with the same
///   dimension/metric is a no-op; a different dimension or metric is a
///   fatal schema conflict requiring explicit delete-and-recreate.
/// - `upsert` is idempotent per id: re-upserting a chunk id overwrites its
///   vector and payload. This is what makes re-indexing after re-chunking
///   safe.
/// - `search` returns hits ordered by descending similarity under the
///   collection's metric, ties broken by first-insertion order of the ids.
///   `top_k` larger than the collection is clamped, never an error.
/// - Searching a collection that does not exist is an error, never an
///   empty result.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
        metric: DistanceMetric,
    ) -> Result<()>;

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()>;

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>>;

    async fn collection_info(&self, collection: &str) -> Result<CollectionInfo>;

    async fn delete_collection(&self, name: &str) -> Result<()>;
}
