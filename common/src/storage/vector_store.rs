use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    storage::types::document_chunk::{ChunkMetadata, DocumentChunk, ScoredChunk},
    utils::embedding::EmbeddingProvider,
};

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    id: String,
}

/// A handle bound to one collection of a Chroma-style vector store.
///
/// The handle wraps the collection by name: which process created the
/// collection is irrelevant once `open` returns.
pub struct StoreHandle {
    http: reqwest::Client,
    base_url: String,
    collection_id: String,
    collection_name: String,
    embedding: Arc<EmbeddingProvider>,
}

impl StoreHandle {
    /// Binds to `collection_name`, creating it when it does not exist yet.
    ///
    /// A failed creation is treated as a lost race against another process:
    /// it is logged and the collection is re-fetched by name instead of
    /// erroring out.
    pub async fn open(
        base_url: &str,
        collection_name: &str,
        embedding: Arc<EmbeddingProvider>,
        metadata: Option<Value>,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::new();
        let base_url = base_url.trim_end_matches('/').to_string();

        let collection = match fetch_collection(&http, &base_url, collection_name).await {
            Ok(info) => info,
            Err(fetch_err) => {
                debug!(
                    collection = collection_name,
                    error = %fetch_err,
                    "collection not found, creating it"
                );
                let metadata = metadata.unwrap_or_else(|| json!({ "created_by": "cli" }));
                match create_collection(&http, &base_url, collection_name, &metadata).await {
                    Ok(info) => {
                        info!(collection = collection_name, "created collection");
                        info
                    }
                    Err(create_err) => {
                        warn!(
                            collection = collection_name,
                            error = %create_err,
                            "collection creation failed, binding to the existing collection"
                        );
                        fetch_collection(&http, &base_url, collection_name).await?
                    }
                }
            }
        };

        Ok(Self {
            http,
            base_url,
            collection_id: collection.id,
            collection_name: collection_name.to_string(),
            embedding,
        })
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Embeds `chunks` and writes text, metadata, and vectors keyed by
    /// `ids`. An id already present in the collection is overwritten, so
    /// re-ingesting unchanged content is a no-op rather than a duplicate.
    pub async fn upsert(&self, chunks: &[DocumentChunk], ids: &[String]) -> Result<(), AppError> {
        if chunks.is_empty() {
            return Ok(());
        }
        if chunks.len() != ids.len() {
            return Err(AppError::Validation(format!(
                "upsert called with {} chunks but {} ids",
                chunks.len(),
                ids.len()
            )));
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = self.embedding.embed_batch(&texts).await?;
        let metadatas: Vec<ChunkMetadata> = chunks
            .iter()
            .map(|chunk| ChunkMetadata {
                source: chunk.source.clone(),
                chunk_index: chunk.chunk_index,
            })
            .collect();

        let response = self
            .http
            .post(format!(
                "{}/api/v1/collections/{}/upsert",
                self.base_url, self.collection_id
            ))
            .json(&json!({
                "ids": ids,
                "documents": texts,
                "metadatas": metadatas,
                "embeddings": embeddings,
            }))
            .send()
            .await?;
        ensure_success(response, "upsert").await?;

        debug!(
            collection = %self.collection_name,
            chunks = chunks.len(),
            "upserted chunk batch"
        );
        Ok(())
    }

    /// Exact existence check: does any stored chunk carry this source name
    /// in its metadata? Uses a filtered `get` with limit 1, not a
    /// similarity query, so there are no approximate-search false results.
    pub async fn contains_source(&self, source: &str) -> Result<bool, AppError> {
        let response = self
            .http
            .post(format!(
                "{}/api/v1/collections/{}/get",
                self.base_url, self.collection_id
            ))
            .json(&json!({
                "where": { "source": source },
                "limit": 1,
                "include": [],
            }))
            .send()
            .await?;
        let response = ensure_success(response, "get").await?;

        #[derive(Deserialize)]
        struct GetResponse {
            ids: Vec<String>,
        }

        let payload: GetResponse = response.json().await?;
        Ok(!payload.ids.is_empty())
    }

    /// Embeds `query` and returns the `k` closest stored chunks, ranked.
    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>, AppError> {
        let vector = self.embedding.embed_query(query).await?;
        let response = self
            .http
            .post(format!(
                "{}/api/v1/collections/{}/query",
                self.base_url, self.collection_id
            ))
            .json(&json!({
                "query_embeddings": [vector],
                "n_results": k,
                "include": ["documents", "metadatas", "distances"],
            }))
            .send()
            .await?;
        let response = ensure_success(response, "query").await?;

        #[derive(Deserialize)]
        struct QueryResponse {
            documents: Vec<Vec<String>>,
            metadatas: Vec<Vec<ChunkMetadata>>,
            distances: Vec<Vec<f32>>,
        }

        let mut payload: QueryResponse = response.json().await?;
        let documents = payload.documents.pop().unwrap_or_default();
        let metadatas = payload.metadatas.pop().unwrap_or_default();
        let distances = payload.distances.pop().unwrap_or_default();

        let matches = documents
            .into_iter()
            .zip(metadatas)
            .zip(distances)
            .map(|((text, metadata), distance)| ScoredChunk {
                chunk: DocumentChunk::new(text, metadata.source, metadata.chunk_index),
                distance,
            })
            .collect();
        Ok(matches)
    }
}

async fn fetch_collection(
    http: &reqwest::Client,
    base_url: &str,
    name: &str,
) -> Result<CollectionInfo, AppError> {
    let response = http
        .get(format!("{base_url}/api/v1/collections/{name}"))
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Store(format!(
            "collection '{name}' not available: {status}"
        )));
    }
    Ok(response.json().await?)
}

async fn create_collection(
    http: &reqwest::Client,
    base_url: &str,
    name: &str,
    metadata: &Value,
) -> Result<CollectionInfo, AppError> {
    let response = http
        .post(format!("{base_url}/api/v1/collections"))
        .json(&json!({ "name": name, "metadata": metadata }))
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Store(format!(
            "creating collection '{name}' failed with {status}: {body}"
        )));
    }
    Ok(response.json().await?)
}

async fn ensure_success(
    response: reqwest::Response,
    operation: &str,
) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Store(format!(
        "{operation} failed with {status}: {body}"
    )))
}
