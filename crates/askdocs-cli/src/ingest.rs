//! File ingestion: read, chunk, and store documents

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use askdocs_core::{Chunk, DocumentStore, Error, Result};
use askdocs_rag::split_text;

/// Reads text files, chunks them, and replaces the document's chunks in the
/// store. The file name becomes the document id, so re-ingesting the same
/// file replaces its chunks rather than accumulating duplicates.
pub struct DocumentIngestor {
    store: Arc<dyn DocumentStore>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl DocumentIngestor {
    pub fn new(store: Arc<dyn DocumentStore>, chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            store,
            chunk_size,
            chunk_overlap,
        }
    }

    /// Ingest one file. Returns the number of chunks stored.
    pub async fn ingest_file(&self, project_id: &str, path: &Path) -> Result<usize> {
        let text = std::fs::read_to_string(path)?;
        let document_id = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .ok_or_else(|| {
                Error::InvalidConfiguration(format!("unusable file name: {}", path.display()))
            })?;

        self.ingest_text(project_id, &document_id, &text).await
    }

    /// Chunk raw text and replace the document's chunks.
    pub async fn ingest_text(
        &self,
        project_id: &str,
        document_id: &str,
        text: &str,
    ) -> Result<usize> {
        let chunks: Vec<Chunk> = split_text(text, self.chunk_size, self.chunk_overlap)?
            .enumerate()
            .map(|(ordinal, piece)| Chunk::new(project_id, document_id, ordinal, piece))
            .collect();

        let count = self
            .store
            .replace_chunks(project_id, document_id, chunks)
            .await?;

        info!(
            project = project_id,
            document = document_id,
            chunks = count,
            "document ingested"
        );
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use askdocs_rag::InMemoryDocumentStore;

    #[tokio::test]
    async fn ingesting_a_file_stores_ordered_chunks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "Paris is the capital of France. It has the Eiffel Tower. Population is about 2 million."
        )
        .unwrap();

        let store = Arc::new(InMemoryDocumentStore::new());
        let ingestor = DocumentIngestor::new(store.clone(), 40, 0);

        let count = ingestor.ingest_file("p1", file.path()).await.unwrap();
        assert!(count > 1);

        let chunks = store.get_chunks("p1").await.unwrap();
        assert_eq!(chunks.len(), count);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.ordinal, i);
        }
    }

    #[tokio::test]
    async fn re_ingesting_replaces_instead_of_accumulating() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let ingestor = DocumentIngestor::new(store.clone(), 40, 0);

        ingestor
            .ingest_text("p1", "notes.txt", "A first version of the notes. With two sentences.")
            .await
            .unwrap();
        let count = ingestor
            .ingest_text("p1", "notes.txt", "Shorter now.")
            .await
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(store.get_chunks("p1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn whitespace_only_files_store_nothing() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let ingestor = DocumentIngestor::new(store.clone(), 40, 0);

        let count = ingestor
            .ingest_text("p1", "empty.txt", "   \n\n  ")
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(store.get_chunks("p1").await.unwrap().is_empty());
    }
}
