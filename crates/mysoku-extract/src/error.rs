use thiserror::Error;

/// Extraction failures are continuable at the batch level: one corrupt
/// document never aborts the run.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("file not found: {0}")]
    NotFound(std::path::PathBuf),

    #[error("not a PDF file: {0}")]
    NotPdf(std::path::PathBuf),

    #[error("pdf parse error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
