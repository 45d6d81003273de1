use std::path::Path;

use common::error::AppError;
use tracing::debug;

/// Extracts the text layer of a PDF file.
///
/// Parsing is CPU-bound, so it runs on the blocking pool while the worker
/// task stays suspended.
pub async fn extract_pdf_text(path: &Path) -> Result<String, AppError> {
    let display_path = path.display().to_string();
    let pdf_bytes = tokio::fs::read(path).await?;

    let text = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&pdf_bytes).map(|text| text.trim().to_string())
    })
    .await?
    .map_err(|err| AppError::Pdf(format!("extracting text from {display_path}: {err}")))?;

    debug!(path = %display_path, characters = text.len(), "extracted PDF text");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = extract_pdf_text(Path::new("/nonexistent/missing.pdf"))
            .await
            .expect_err("reading a missing file must fail");
        assert!(matches!(err, AppError::Io(_)));
    }

    #[tokio::test]
    async fn garbage_bytes_are_a_pdf_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("not-a-pdf.pdf");
        tokio::fs::write(&path, b"plain text, no PDF header")
            .await
            .expect("write fixture");

        let err = extract_pdf_text(&path)
            .await
            .expect_err("non-PDF bytes must fail extraction");
        assert!(matches!(err, AppError::Pdf(_)));
    }
}
