use std::sync::Arc;

use serde_json::Value;
use tokio::sync::OnceCell;

use crate::{
    error::AppError, storage::vector_store::StoreHandle, utils::embedding::EmbeddingProvider,
};

/// Where the shared collection lives and how it is created on first use.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub collection_name: String,
    pub metadata: Option<Value>,
}

/// Lazily-initialized shared handle to the vector store.
///
/// The first caller runs the open sequence; concurrent callers await the
/// same pending initialization instead of opening their own handle. The
/// holder is passed to components explicitly rather than living in a
/// process-wide global.
pub struct SharedStore {
    config: StoreConfig,
    embedding: Arc<EmbeddingProvider>,
    cell: OnceCell<Arc<StoreHandle>>,
}

impl SharedStore {
    pub fn new(config: StoreConfig, embedding: Arc<EmbeddingProvider>) -> Self {
        Self {
            config,
            embedding,
            cell: OnceCell::new(),
        }
    }

    /// Returns the bound handle, opening the collection on first call.
    pub async fn get(&self) -> Result<Arc<StoreHandle>, AppError> {
        let handle = self
            .cell
            .get_or_try_init(|| async {
                StoreHandle::open(
                    &self.config.base_url,
                    &self.config.collection_name,
                    Arc::clone(&self.embedding),
                    self.config.metadata.clone(),
                )
                .await
                .map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(handle))
    }
}
