use std::{sync::Arc, time::Duration};

use async_openai::{config::OpenAIConfig, types::CreateEmbeddingRequestArgs, Client};
use serde_json::{json, Value};
use tracing::debug;

use crate::{error::AppError, utils::config::AppConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    Remote,
    OpenAI,
}

impl Default for EmbeddingBackend {
    fn default() -> Self {
        Self::Remote
    }
}

impl std::str::FromStr for EmbeddingBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "remote" | "local" | "tei" => Ok(Self::Remote),
            other => Err(AppError::Validation(format!(
                "unknown embedding backend '{other}'. Expected 'remote' or 'openai'."
            ))),
        }
    }
}

/// Turns text into vectors, hiding sub-batching and transport detail from
/// callers. Failures are propagated as-is; there is no retry and no caching.
#[derive(Clone)]
pub struct EmbeddingProvider {
    inner: EmbeddingInner,
    batch_size: usize,
}

#[derive(Clone)]
enum EmbeddingInner {
    Remote {
        http: reqwest::Client,
        base_url: String,
        timeout: Duration,
    },
    OpenAI {
        client: Arc<Client<OpenAIConfig>>,
        model: String,
    },
}

impl EmbeddingProvider {
    pub fn new_remote(
        base_url: impl Into<String>,
        batch_size: usize,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        EmbeddingProvider {
            inner: EmbeddingInner::Remote {
                http: reqwest::Client::new(),
                base_url,
                timeout,
            },
            batch_size: batch_size.max(1),
        }
    }

    pub fn new_openai(client: Arc<Client<OpenAIConfig>>, model: String, batch_size: usize) -> Self {
        EmbeddingProvider {
            inner: EmbeddingInner::OpenAI { client, model },
            batch_size: batch_size.max(1),
        }
    }

    pub fn from_config(config: &AppConfig, backend: EmbeddingBackend) -> Result<Self, AppError> {
        match backend {
            EmbeddingBackend::Remote => Ok(Self::new_remote(
                &config.embedding_base_url,
                config.embed_batch_size,
                Duration::from_secs(config.embed_timeout_secs),
            )),
            EmbeddingBackend::OpenAI => {
                let api_key = config.require_openai_key()?;
                let client = Arc::new(Client::with_config(
                    OpenAIConfig::new()
                        .with_api_key(api_key)
                        .with_api_base(&config.openai_base_url),
                ));
                Ok(Self::new_openai(
                    client,
                    config.embedding_model.clone(),
                    config.embed_batch_size,
                ))
            }
        }
    }

    pub fn backend_label(&self) -> &'static str {
        match self.inner {
            EmbeddingInner::Remote { .. } => "remote",
            EmbeddingInner::OpenAI { .. } => "openai",
        }
    }

    /// Embeds a single query string. Empty input returns an empty vector
    /// without touching the network.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AppError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let mut vectors = self.embed_slice(&[text.to_owned()]).await?;
        vectors.pop().ok_or_else(|| {
            AppError::EmbeddingProtocol("service returned no vector for a single input".to_string())
        })
    }

    /// Embeds a list of texts in fixed-size sub-batches, one request per
    /// sub-batch, preserving input order in the concatenated result.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let batch_vectors = self.embed_slice(batch).await?;
            if batch_vectors.len() != batch.len() {
                return Err(AppError::EmbeddingProtocol(format!(
                    "requested {} embeddings but received {}",
                    batch.len(),
                    batch_vectors.len()
                )));
            }
            vectors.extend(batch_vectors);
        }
        Ok(vectors)
    }

    async fn embed_slice(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        match &self.inner {
            EmbeddingInner::Remote {
                http,
                base_url,
                timeout,
            } => {
                let response = http
                    .post(format!("{base_url}/embed"))
                    .timeout(*timeout)
                    .json(&json!({ "inputs": batch }))
                    .send()
                    .await
                    .map_err(|err| classify_transport_error(err, *timeout))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::EmbeddingTransport { status, body });
                }

                let payload: Value = response
                    .json()
                    .await
                    .map_err(|err| classify_transport_error(err, *timeout))?;
                debug!(inputs = batch.len(), "embedded batch via remote service");
                parse_embedding_response(payload)
            }
            EmbeddingInner::OpenAI { client, model } => {
                let request = CreateEmbeddingRequestArgs::default()
                    .model(model.clone())
                    .input(batch.to_vec())
                    .build()?;

                let response = client.embeddings().create(request).await?;
                debug!(inputs = batch.len(), "embedded batch via OpenAI");
                Ok(response
                    .data
                    .into_iter()
                    .map(|item| item.embedding)
                    .collect())
            }
        }
    }
}

fn classify_transport_error(err: reqwest::Error, timeout: Duration) -> AppError {
    if err.is_timeout() {
        AppError::EmbeddingTimeout(timeout)
    } else {
        AppError::Reqwest(err)
    }
}

/// Accepts the two documented response shapes: a bare array of vectors, or
/// an object with an `embeddings` field holding that array.
fn parse_embedding_response(payload: Value) -> Result<Vec<Vec<f32>>, AppError> {
    let vectors = match payload {
        Value::Array(_) => payload,
        Value::Object(mut map) => map.remove("embeddings").ok_or_else(|| {
            AppError::EmbeddingProtocol("response object has no 'embeddings' field".to_string())
        })?,
        other => {
            return Err(AppError::EmbeddingProtocol(format!(
                "response is neither an array nor an object: {other}"
            )))
        }
    };

    serde_json::from_value(vectors).map_err(|err| {
        AppError::EmbeddingProtocol(format!("embeddings are not arrays of numbers: {err}"))
    })
}
