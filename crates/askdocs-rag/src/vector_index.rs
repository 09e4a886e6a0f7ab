//! Vector index implementations

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use qdrant_client::Payload;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    Value, VectorParamsBuilder,
};
use tracing::debug;

use askdocs_core::{
    ChunkPayload, CollectionInfo, DistanceMetric, Error, Result, ScoredChunk, VectorIndex,
    VectorRecord,
};

/// In-memory vector index.
///
/// Serves as the zero-infrastructure backend and as the test double for the
/// Qdrant implementation; both honor the same collection semantics.
pub struct InMemoryVectorIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

struct Collection {
    dimension: usize,
    metric: DistanceMetric,
    points: HashMap<String, StoredPoint>,
    insert_counter: u64,
}

struct StoredPoint {
    vector: Vec<f32>,
    payload: ChunkPayload,
    // First-insert sequence number; survives overwrites so search ties
    // break by insertion order of the id, not by last write.
    inserted_at: u64,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    fn similarity(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
        match metric {
            DistanceMetric::Cosine => Self::cosine_similarity(a, b),
            DistanceMetric::Dot => Self::dot_product(a, b),
            // Negated distance keeps descending order uniform across metrics.
            DistanceMetric::Euclid => -Self::euclidean_distance(a, b),
        }
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot_product = Self::dot_product(a, b);
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }

    fn dot_product(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }

    fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt()
    }
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
        metric: DistanceMetric,
    ) -> Result<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| Error::VectorIndex(format!("lock error: {e}")))?;

        if let Some(existing) = collections.get(name) {
            if existing.dimension != dimension || existing.metric != metric {
                return Err(Error::SchemaConflict {
                    collection: name.to_string(),
                    existing_dimension: existing.dimension,
                    requested_dimension: dimension,
                    existing_metric: existing.metric,
                    requested_metric: metric,
                });
            }
            return Ok(());
        }

        collections.insert(
            name.to_string(),
            Collection {
                dimension,
                metric,
                points: HashMap::new(),
                insert_counter: 0,
            },
        );
        Ok(())
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| Error::VectorIndex(format!("lock error: {e}")))?;

        let state = collections
            .get_mut(collection)
            .ok_or_else(|| Error::CollectionNotFound(collection.to_string()))?;

        for record in records {
            if record.vector.len() != state.dimension {
                return Err(Error::VectorIndex(format!(
                    "vector for id {} has dimension {}, collection {} expects {}",
                    record.id,
                    record.vector.len(),
                    collection,
                    state.dimension
                )));
            }

            match state.points.get_mut(&record.id) {
                Some(existing) => {
                    existing.vector = record.vector;
                    existing.payload = record.payload;
                }
                None => {
                    let inserted_at = state.insert_counter;
                    state.insert_counter += 1;
                    state.points.insert(
                        record.id,
                        StoredPoint {
                            vector: record.vector,
                            payload: record.payload,
                            inserted_at,
                        },
                    );
                }
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let collections = self
            .collections
            .read()
            .map_err(|e| Error::VectorIndex(format!("lock error: {e}")))?;

        let state = collections
            .get(collection)
            .ok_or_else(|| Error::CollectionNotFound(collection.to_string()))?;

        if query.len() != state.dimension {
            return Err(Error::VectorIndex(format!(
                "query has dimension {}, collection {} expects {}",
                query.len(),
                collection,
                state.dimension
            )));
        }

        let mut hits: Vec<(f32, u64, ScoredChunk)> = state
            .points
            .iter()
            .map(|(id, point)| {
                let score = Self::similarity(state.metric, query, &point.vector);
                (
                    score,
                    point.inserted_at,
                    ScoredChunk {
                        id: id.clone(),
                        text: point.payload.text.clone(),
                        document_id: point.payload.document_id.clone(),
                        ordinal: point.payload.ordinal,
                        score,
                    },
                )
            })
            .collect();

        hits.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
        });
        hits.truncate(top_k.min(state.points.len()));

        Ok(hits.into_iter().map(|(_, _, chunk)| chunk).collect())
    }

    async fn collection_info(&self, collection: &str) -> Result<CollectionInfo> {
        let collections = self
            .collections
            .read()
            .map_err(|e| Error::VectorIndex(format!("lock error: {e}")))?;

        let state = collections
            .get(collection)
            .ok_or_else(|| Error::CollectionNotFound(collection.to_string()))?;

        Ok(CollectionInfo {
            vector_count: state.points.len(),
            dimension: state.dimension,
            metric: state.metric,
        })
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| Error::VectorIndex(format!("lock error: {e}")))?;

        collections.remove(name);
        Ok(())
    }
}

/// Qdrant-backed vector index, one gRPC client held for the process
/// lifetime and shared across requests.
pub struct QdrantVectorIndex {
    client: Qdrant,
}

impl QdrantVectorIndex {
    /// Connect to a Qdrant instance at the given URL.
    pub fn connect(url: &str) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| Error::VectorIndex(e.to_string()))?;
        Ok(Self { client })
    }

    fn to_distance(metric: DistanceMetric) -> Distance {
        match metric {
            DistanceMetric::Cosine => Distance::Cosine,
            DistanceMetric::Dot => Distance::Dot,
            DistanceMetric::Euclid => Distance::Euclid,
        }
    }

    fn from_distance(distance: Distance) -> Result<DistanceMetric> {
        match distance {
            Distance::Cosine => Ok(DistanceMetric::Cosine),
            Distance::Dot => Ok(DistanceMetric::Dot),
            Distance::Euclid => Ok(DistanceMetric::Euclid),
            other => Err(Error::VectorIndex(format!(
                "unsupported distance metric on existing collection: {other:?}"
            ))),
        }
    }

    async fn exists(&self, collection: &str) -> Result<bool> {
        self.client
            .collection_exists(collection)
            .await
            .map_err(|e| Error::VectorIndex(e.to_string()))
    }

    async fn describe(&self, collection: &str) -> Result<CollectionInfo> {
        let response = self
            .client
            .collection_info(collection)
            .await
            .map_err(|e| Error::VectorIndex(e.to_string()))?;

        let info = response
            .result
            .ok_or_else(|| Error::VectorIndex("collection info missing from response".into()))?;

        let params = info
            .config
            .and_then(|c| c.params)
            .ok_or_else(|| Error::VectorIndex("collection params missing from response".into()))?;

        let vector_params = match params.vectors_config.and_then(|v| v.config) {
            Some(VectorsConfigKind::Params(p)) => p,
            _ => {
                return Err(Error::VectorIndex(
                    "collection vector config missing from response".into(),
                ));
            }
        };

        let distance = Distance::try_from(vector_params.distance)
            .map_err(|_| Error::VectorIndex("unknown distance in collection config".into()))?;

        Ok(CollectionInfo {
            vector_count: info.points_count.unwrap_or(0) as usize,
            dimension: vector_params.size as usize,
            metric: Self::from_distance(distance)?,
        })
    }
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
        metric: DistanceMetric,
    ) -> Result<()> {
        if self.exists(name).await? {
            let info = self.describe(name).await?;
            if info.dimension != dimension || info.metric != metric {
                return Err(Error::SchemaConflict {
                    collection: name.to_string(),
                    existing_dimension: info.dimension,
                    requested_dimension: dimension,
                    existing_metric: info.metric,
                    requested_metric: metric,
                });
            }
            return Ok(());
        }

        debug!(collection = name, dimension, %metric, "creating collection");

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name).vectors_config(VectorParamsBuilder::new(
                    dimension as u64,
                    Self::to_distance(metric),
                )),
            )
            .await
            .map_err(|e| Error::VectorIndex(e.to_string()))?;

        Ok(())
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let points = records
            .into_iter()
            .map(|record| {
                let payload = Payload::try_from(serde_json::json!({
                    "text": record.payload.text,
                    "document_id": record.payload.document_id,
                    "ordinal": record.payload.ordinal as i64,
                }))
                .map_err(|e| Error::VectorIndex(e.to_string()))?;
                Ok(PointStruct::new(record.id, record.vector, payload))
            })
            .collect::<Result<Vec<_>>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(|e| Error::VectorIndex(e.to_string()))?;

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        if !self.exists(collection).await? {
            return Err(Error::CollectionNotFound(collection.to_string()));
        }

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, query.to_vec(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| Error::VectorIndex(e.to_string()))?;

        response
            .result
            .into_iter()
            .map(|point| {
                let id = match point.id.and_then(|p| p.point_id_options) {
                    Some(PointIdOptions::Uuid(uuid)) => uuid,
                    Some(PointIdOptions::Num(num)) => num.to_string(),
                    None => String::new(),
                };
                let text = payload_str(&point.payload, "text").ok_or_else(|| {
                    Error::VectorIndex(format!("point {id} is missing its text payload"))
                })?;
                let document_id =
                    payload_str(&point.payload, "document_id").unwrap_or_default();
                let ordinal = payload_int(&point.payload, "ordinal").unwrap_or(0) as usize;

                Ok(ScoredChunk {
                    id,
                    text,
                    document_id,
                    ordinal,
                    score: point.score,
                })
            })
            .collect()
    }

    async fn collection_info(&self, collection: &str) -> Result<CollectionInfo> {
        if !self.exists(collection).await? {
            return Err(Error::CollectionNotFound(collection.to_string()));
        }
        self.describe(collection).await
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        if !self.exists(name).await? {
            return Ok(());
        }
        self.client
            .delete_collection(name)
            .await
            .map_err(|e| Error::VectorIndex(e.to_string()))?;
        Ok(())
    }
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    }
}

fn payload_int(payload: &HashMap<String, Value>, key: &str) -> Option<i64> {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::IntegerValue(i)) => Some(*i),
        _ => None,
    }
}
