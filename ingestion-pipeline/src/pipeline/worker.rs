use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use common::error::AppError;
use tracing::{debug, error};

use super::{report::FileOutcome, services::PipelineServices};

/// Runs `workers` concurrent tasks over a shared FIFO queue of file names.
///
/// Each worker pops one file at a time and processes it end-to-end; a
/// failing file is logged and recorded, never fatal to the pool. The call
/// returns once every worker has drained the queue.
pub(crate) async fn run_pool(
    services: Arc<dyn PipelineServices>,
    folder: PathBuf,
    files: Vec<String>,
    workers: usize,
) -> Result<Vec<(String, FileOutcome)>, AppError> {
    let queue = Arc::new(Mutex::new(VecDeque::from(files)));

    let mut handles = Vec::with_capacity(workers);
    for worker_id in 0..workers {
        let services = Arc::clone(&services);
        let queue = Arc::clone(&queue);
        let folder = folder.clone();
        handles.push(tokio::spawn(async move {
            worker_loop(worker_id, services, folder, queue).await
        }));
    }

    let results = futures::future::try_join_all(handles).await?;
    Ok(results.into_iter().flatten().collect())
}

async fn worker_loop(
    worker_id: usize,
    services: Arc<dyn PipelineServices>,
    folder: PathBuf,
    queue: Arc<Mutex<VecDeque<String>>>,
) -> Vec<(String, FileOutcome)> {
    let mut outcomes = Vec::new();
    while let Some(file_name) = next_file(&queue) {
        debug!(worker_id, file = %file_name, "processing file");
        let outcome = match process_file(services.as_ref(), &folder, &file_name).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(worker_id, file = %file_name, error = %err, "file ingestion failed");
                FileOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };
        outcomes.push((file_name, outcome));
    }
    debug!(worker_id, processed = outcomes.len(), "worker finished");
    outcomes
}

// The pop itself is synchronous, so no worker can observe a half-removed
// entry between the lock and the return.
fn next_file(queue: &Mutex<VecDeque<String>>) -> Option<String> {
    queue.lock().ok()?.pop_front()
}

async fn process_file(
    services: &dyn PipelineServices,
    folder: &Path,
    file_name: &str,
) -> Result<FileOutcome, AppError> {
    if services.source_already_ingested(file_name).await? {
        debug!(file = %file_name, "source already in the store, skipping");
        return Ok(FileOutcome::Skipped);
    }

    let text = services.load_document_text(&folder.join(file_name)).await?;
    let chunks = services.chunk_document(file_name, &text);
    if chunks.is_empty() {
        return Ok(FileOutcome::Ingested { chunks: 0 });
    }

    let persisted = services.persist_chunks(&chunks).await?;
    Ok(FileOutcome::Ingested { chunks: persisted })
}
