//! Document store contract (external collaborator)

use async_trait::async_trait;

use crate::Result;
use crate::types::Chunk;

/// Durable record of chunks per project.
///
/// The pipeline treats this as an already-durable CRUD collection store and
/// does not re-implement persistence. Ordering and idempotency are part of
/// the contract: `get_chunks` returns chunks ordered by document then
/// ordinal, and `replace_chunks` is a full idempotent replace of one
/// document's chunks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All chunks for a project, ordered by document id then ordinal.
    async fn get_chunks(&self, project_id: &str) -> Result<Vec<Chunk>>;

    /// Replace one document's chunks wholesale. Returns the stored count.
    async fn replace_chunks(
        &self,
        project_id: &str,
        document_id: &str,
        chunks: Vec<Chunk>,
    ) -> Result<usize>;
}
