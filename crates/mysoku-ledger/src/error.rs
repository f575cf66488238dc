use thiserror::Error;

/// Ledger and manifest failures. These are run-level: a manifest that
/// cannot be written or read aborts the run, unlike per-document file
/// operation failures which stay continuable.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("manifest not found: {0}")]
    ManifestNotFound(std::path::PathBuf),

    #[error("unexpected manifest header: expected {expected:?}, found {found:?}")]
    BadHeader {
        expected: &'static [&'static str],
        found: Vec<String>,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
