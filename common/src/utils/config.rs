use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::AppError;

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub vector_store_url: String,
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
    #[serde(default = "default_embedding_base_url")]
    pub embedding_base_url: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: usize,
    #[serde(default = "default_embed_timeout_secs")]
    pub embed_timeout_secs: u64,
    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_retrieval_top_k")]
    pub retrieval_top_k: usize,
}

fn default_collection_name() -> String {
    "documents".to_string()
}

fn default_embedding_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_chunk_size() -> usize {
    800
}

fn default_chunk_overlap() -> usize {
    160
}

fn default_embedding_model() -> String {
    "bge-small-en-v1.5".to_string()
}

fn default_embed_batch_size() -> usize {
    16
}

fn default_embed_timeout_secs() -> u64 {
    60
}

fn default_upsert_batch_size() -> usize {
    64
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_retrieval_top_k() -> usize {
    5
}

impl AppConfig {
    /// The OpenAI key is only mandatory for the OpenAI embedding backend
    /// and for chat completions, so it is validated at the call sites that
    /// need it rather than at deserialization time.
    pub fn require_openai_key(&self) -> Result<&str, AppError> {
        self.openai_api_key.as_deref().ok_or_else(|| {
            AppError::Validation("OPENAI_API_KEY must be set for this operation".to_string())
        })
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
