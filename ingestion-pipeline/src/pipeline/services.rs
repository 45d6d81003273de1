use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use common::{
    error::AppError,
    storage::{shared::SharedStore, types::document_chunk::DocumentChunk},
};

use crate::{chunker::TextChunker, fingerprint::chunk_fingerprint, utils::pdf_ingestion};

/// The per-file side effects a worker drives, kept behind a trait so the
/// pool can be exercised without a store or a filesystem.
#[async_trait]
pub trait PipelineServices: Send + Sync {
    /// Best-effort check whether this source was ingested by an earlier run.
    async fn source_already_ingested(&self, source: &str) -> Result<bool, AppError>;

    async fn load_document_text(&self, path: &Path) -> Result<String, AppError>;

    fn chunk_document(&self, source: &str, text: &str) -> Vec<DocumentChunk>;

    /// Fingerprints and writes `chunks`, returning how many were persisted.
    async fn persist_chunks(&self, chunks: &[DocumentChunk]) -> Result<usize, AppError>;
}

pub struct DefaultPipelineServices {
    store: Arc<SharedStore>,
    chunker: TextChunker,
    upsert_batch_size: usize,
}

impl DefaultPipelineServices {
    pub fn new(store: Arc<SharedStore>, chunker: TextChunker, upsert_batch_size: usize) -> Self {
        Self {
            store,
            chunker,
            upsert_batch_size: upsert_batch_size.max(1),
        }
    }
}

#[async_trait]
impl PipelineServices for DefaultPipelineServices {
    async fn source_already_ingested(&self, source: &str) -> Result<bool, AppError> {
        let store = self.store.get().await?;
        store.contains_source(source).await
    }

    async fn load_document_text(&self, path: &Path) -> Result<String, AppError> {
        pdf_ingestion::extract_pdf_text(path).await
    }

    fn chunk_document(&self, source: &str, text: &str) -> Vec<DocumentChunk> {
        self.chunker
            .split(text)
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| DocumentChunk::new(chunk, source.to_string(), index))
            .collect()
    }

    async fn persist_chunks(&self, chunks: &[DocumentChunk]) -> Result<usize, AppError> {
        let store = self.store.get().await?;
        // Batch-by-batch so a large document never holds all its vectors
        // in memory at once.
        for batch in chunks.chunks(self.upsert_batch_size) {
            let ids: Vec<String> = batch
                .iter()
                .map(|chunk| chunk_fingerprint(&chunk.source, &chunk.text))
                .collect();
            store.upsert(batch, &ids).await?;
        }
        Ok(chunks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::storage::shared::StoreConfig;
    use common::utils::embedding::EmbeddingProvider;
    use std::time::Duration;

    fn services() -> DefaultPipelineServices {
        let provider = Arc::new(EmbeddingProvider::new_remote(
            "http://localhost:1",
            16,
            Duration::from_secs(1),
        ));
        let store = Arc::new(SharedStore::new(
            StoreConfig {
                base_url: "http://localhost:1".to_string(),
                collection_name: "documents".to_string(),
                metadata: None,
            },
            provider,
        ));
        let chunker = TextChunker::new(10, 2).expect("valid chunker");
        DefaultPipelineServices::new(store, chunker, 64)
    }

    #[test]
    fn chunk_document_attaches_source_and_sequence_index() {
        let chunks = services().chunk_document("a.pdf", "abcdefghijklmnopqrstuvwxyz");

        assert!(chunks.len() > 1);
        for (index, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.source, "a.pdf");
            assert_eq!(chunk.chunk_index, index);
        }
    }

    #[test]
    fn chunk_document_on_empty_text_yields_nothing() {
        assert!(services().chunk_document("a.pdf", "").is_empty());
    }
}
