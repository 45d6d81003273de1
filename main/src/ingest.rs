use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::Parser;
use common::{
    storage::shared::{SharedStore, StoreConfig},
    utils::{
        config::{get_config, AppConfig},
        embedding::{EmbeddingBackend, EmbeddingProvider},
    },
};
use ingestion_pipeline::{
    DefaultPipelineServices, FileOutcome, IngestionPipeline, TextChunker,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Ingest a folder of PDF documents into the shared vector store.
#[derive(Debug, Parser)]
#[command(name = "ingest")]
struct IngestArgs {
    /// Folder containing the PDF documents to ingest.
    #[arg(short = 'd', long = "documents-folder")]
    documents_folder: PathBuf,

    /// Number of concurrent ingestion workers (clamped to 1..=8).
    #[arg(short = 'c', long, default_value_t = 2)]
    concurrency: usize,

    /// Embed through the OpenAI API instead of the local embedding service.
    #[arg(long)]
    openai: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let args = match IngestArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let is_help = matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            );
            let _ = err.print();
            return if is_help {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = ?err, "ingestion failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: IngestArgs) -> anyhow::Result<()> {
    let config = get_config().context("loading configuration")?;

    let backend = if args.openai {
        EmbeddingBackend::OpenAI
    } else {
        EmbeddingBackend::Remote
    };
    let provider = Arc::new(EmbeddingProvider::from_config(&config, backend)?);
    info!(
        backend = provider.backend_label(),
        collection = %config.collection_name,
        "embedding provider initialized"
    );

    let store = Arc::new(SharedStore::new(
        StoreConfig {
            base_url: config.vector_store_url.clone(),
            collection_name: config.collection_name.clone(),
            metadata: Some(collection_metadata(&config)),
        },
        Arc::clone(&provider),
    ));

    let chunker = TextChunker::new(config.chunk_size, config.chunk_overlap)?;
    let services = Arc::new(DefaultPipelineServices::new(
        store,
        chunker,
        config.upsert_batch_size,
    ));
    let pipeline = IngestionPipeline::new(services, args.concurrency);

    let report = pipeline.run(&args.documents_folder).await?;
    for (file, outcome) in report.outcomes() {
        match outcome {
            FileOutcome::Ingested { chunks } => {
                info!(file = %file, chunks, "file ingested");
            }
            FileOutcome::Skipped => info!(file = %file, "file already ingested, skipped"),
            FileOutcome::Failed { error } => {
                warn!(file = %file, error = %error, "file failed");
            }
        }
    }
    info!(
        files = report.len(),
        ingested = report.ingested_files(),
        skipped = report.skipped_files(),
        failed = report.failed_files(),
        chunks = report.total_chunks(),
        "ingestion finished"
    );

    Ok(())
}

fn collection_metadata(config: &AppConfig) -> serde_json::Value {
    serde_json::json!({
        "created_by": "cli",
        "embedding_model": config.embedding_model,
    })
}
