//! In-memory document store

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use askdocs_core::{Chunk, DocumentStore, Error, Project, Result};

/// In-memory implementation of the document store contract.
///
/// Projects are created on first reference. Chunks are kept per document in
/// ordinal order; a BTreeMap keys documents so `get_chunks` is ordered by
/// document id then ordinal without a sort at read time.
pub struct InMemoryDocumentStore {
    state: RwLock<StoreState>,
}

struct StoreState {
    projects: HashMap<String, Project>,
    chunks: HashMap<String, BTreeMap<String, Vec<Chunk>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState {
                projects: HashMap::new(),
                chunks: HashMap::new(),
            }),
        }
    }

    /// The project record, if it has ever been referenced.
    pub fn project(&self, project_id: &str) -> Option<Project> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.projects.get(project_id).cloned())
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_chunks(&self, project_id: &str) -> Result<Vec<Chunk>> {
        let state = self
            .state
            .read()
            .map_err(|e| Error::DocumentStore(format!("lock error: {e}")))?;

        Ok(state
            .chunks
            .get(project_id)
            .map(|documents| documents.values().flatten().cloned().collect())
            .unwrap_or_default())
    }

    async fn replace_chunks(
        &self,
        project_id: &str,
        document_id: &str,
        mut chunks: Vec<Chunk>,
    ) -> Result<usize> {
        for chunk in &chunks {
            if chunk.project_id != project_id || chunk.document_id != document_id {
                return Err(Error::DocumentStore(format!(
                    "chunk {}:{} does not belong to {project_id}:{document_id}",
                    chunk.project_id, chunk.document_id
                )));
            }
        }

        chunks.sort_by_key(|c| c.ordinal);
        for pair in chunks.windows(2) {
            if pair[0].ordinal == pair[1].ordinal {
                return Err(Error::DocumentStore(format!(
                    "duplicate ordinal {} in document {document_id}",
                    pair[0].ordinal
                )));
            }
        }

        let mut state = self
            .state
            .write()
            .map_err(|e| Error::DocumentStore(format!("lock error: {e}")))?;

        state
            .projects
            .entry(project_id.to_string())
            .or_insert_with(|| Project::new(project_id));

        let count = chunks.len();
        state
            .chunks
            .entry(project_id.to_string())
            .or_default()
            .insert(document_id.to_string(), chunks);

        Ok(count)
    }
}
