mod report;
mod services;
mod worker;

pub use report::{FileOutcome, IngestionReport};
pub use services::{DefaultPipelineServices, PipelineServices};

use std::{path::Path, sync::Arc};

use common::error::AppError;
use tracing::{info, warn};

/// The pool never runs unbounded and never collapses below one worker.
const MIN_WORKERS: usize = 1;
const MAX_WORKERS: usize = 8;

/// Drives one ingestion run: folder scan, worker pool, aggregate report.
pub struct IngestionPipeline {
    services: Arc<dyn PipelineServices>,
    concurrency: usize,
}

impl IngestionPipeline {
    pub fn new(services: Arc<dyn PipelineServices>, concurrency: usize) -> Self {
        Self {
            services,
            concurrency: concurrency.clamp(MIN_WORKERS, MAX_WORKERS),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Ingests every PDF in `folder`. An unreadable folder is fatal and
    /// nothing gets queued; per-file failures are collected in the report.
    pub async fn run(&self, folder: &Path) -> Result<IngestionReport, AppError> {
        let files = scan_pdf_folder(folder).await?;
        if files.is_empty() {
            warn!(folder = %folder.display(), "no PDF files found, nothing to ingest");
            return Ok(IngestionReport::default());
        }

        info!(
            folder = %folder.display(),
            files = files.len(),
            workers = self.concurrency,
            "starting ingestion run"
        );
        let outcomes = worker::run_pool(
            Arc::clone(&self.services),
            folder.to_path_buf(),
            files,
            self.concurrency,
        )
        .await?;

        Ok(IngestionReport::new(outcomes))
    }
}

/// Lists `*.pdf` file names (case-insensitive) directly inside `folder`.
/// Subdirectories are not descended into.
async fn scan_pdf_folder(folder: &Path) -> Result<Vec<String>, AppError> {
    let read_error = |source: std::io::Error| AppError::FolderRead {
        path: folder.display().to_string(),
        source,
    };

    let mut entries = tokio::fs::read_dir(folder).await.map_err(read_error)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
        if !entry.file_type().await.map_err(read_error)?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            warn!(entry = %file_name.to_string_lossy(), "skipping non-UTF8 file name");
            continue;
        };
        if name.to_ascii_lowercase().ends_with(".pdf") {
            files.push(name.to_string());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::storage::types::document_chunk::DocumentChunk;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingServices {
        persist_calls: AtomicUsize,
    }

    #[async_trait]
    impl PipelineServices for CountingServices {
        async fn source_already_ingested(&self, _source: &str) -> Result<bool, AppError> {
            Ok(false)
        }

        async fn load_document_text(&self, _path: &Path) -> Result<String, AppError> {
            Ok("text".to_string())
        }

        fn chunk_document(&self, source: &str, text: &str) -> Vec<DocumentChunk> {
            vec![DocumentChunk::new(text.to_string(), source.to_string(), 0)]
        }

        async fn persist_chunks(&self, chunks: &[DocumentChunk]) -> Result<usize, AppError> {
            self.persist_calls.fetch_add(1, Ordering::SeqCst);
            Ok(chunks.len())
        }
    }

    fn counting_pipeline(concurrency: usize) -> (Arc<CountingServices>, IngestionPipeline) {
        let services = Arc::new(CountingServices {
            persist_calls: AtomicUsize::new(0),
        });
        let pipeline =
            IngestionPipeline::new(Arc::clone(&services) as Arc<dyn PipelineServices>, concurrency);
        (services, pipeline)
    }

    #[test]
    fn concurrency_is_clamped_to_the_allowed_range() {
        let (_, low) = counting_pipeline(0);
        assert_eq!(low.concurrency(), 1);
        let (_, high) = counting_pipeline(64);
        assert_eq!(high.concurrency(), 8);
        let (_, mid) = counting_pipeline(4);
        assert_eq!(mid.concurrency(), 4);
    }

    #[tokio::test]
    async fn nonexistent_folder_is_fatal_before_any_work() {
        let (services, pipeline) = counting_pipeline(2);
        let err = pipeline
            .run(Path::new("/definitely/not/here"))
            .await
            .expect_err("missing folder must be fatal");

        assert!(matches!(err, AppError::FolderRead { .. }));
        assert_eq!(services.persist_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_folder_returns_an_empty_report_without_writes() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("notes.txt"), "not a pdf").expect("write fixture");

        let (services, pipeline) = counting_pipeline(2);
        let report = pipeline
            .run(dir.path())
            .await
            .expect("empty folder is not an error");

        assert!(report.is_empty());
        assert_eq!(report.total_chunks(), 0);
        assert_eq!(services.persist_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn scan_filters_on_case_insensitive_pdf_extension() {
        let dir = tempfile::tempdir().expect("temp dir");
        for name in ["a.pdf", "b.PDF", "c.Pdf", "d.txt", "e.pdf.bak"] {
            std::fs::write(dir.path().join(name), b"x").expect("write fixture");
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).expect("create dir fixture");

        let files = scan_pdf_folder(dir.path()).await.expect("scan failed");
        assert_eq!(files, vec!["a.pdf", "b.PDF", "c.Pdf"]);
    }

    #[tokio::test]
    async fn run_reports_each_pdf_exactly_once() {
        let dir = tempfile::tempdir().expect("temp dir");
        for name in ["one.pdf", "two.pdf"] {
            std::fs::write(dir.path().join(name), b"x").expect("write fixture");
        }

        let (services, pipeline) = counting_pipeline(2);
        let report = pipeline.run(dir.path()).await.expect("run failed");

        assert_eq!(report.len(), 2);
        assert_eq!(report.ingested_files(), 2);
        assert_eq!(report.total_chunks(), 2);
        assert_eq!(services.persist_calls.load(Ordering::SeqCst), 2);
    }
}
