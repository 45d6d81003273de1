use serde::{Deserialize, Serialize};

/// A bounded-length contiguous slice of one document's extracted text.
///
/// Chunks are immutable once produced: the ingestion run that created them
/// owns them until they are persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChunk {
    pub text: String,
    pub source: String,
    pub chunk_index: usize,
}

impl DocumentChunk {
    pub fn new(text: String, source: String, chunk_index: usize) -> Self {
        Self {
            text,
            source,
            chunk_index,
        }
    }
}

/// The metadata stored next to each chunk in the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub chunk_index: usize,
}

/// A retrieval match: the stored chunk plus its ranking distance
/// (smaller is closer).
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub distance: f32,
}
