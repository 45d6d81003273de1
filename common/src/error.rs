use std::time::Duration;

use async_openai::error::OpenAIError;
use thiserror::Error;
use tokio::task::JoinError;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Failed to read documents folder {path}: {source}")]
    FolderRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Embedding request timed out after {0:?}")]
    EmbeddingTimeout(Duration),
    #[error("Embedding service returned {status}: {body}")]
    EmbeddingTransport {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Unexpected embedding response: {0}")]
    EmbeddingProtocol(String),
    #[error("Vector store error: {0}")]
    Store(String),
    #[error("PDF extraction error: {0}")]
    Pdf(String),
    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Processing error: {0}")]
    Processing(String),
}
