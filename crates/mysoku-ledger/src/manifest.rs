//! TSV manifest readers and writers.
//!
//! All four manifests are UTF-8, tab-delimited. Preview and apply are
//! written once at run end from the accumulated results; the error
//! manifest appends across runs; the rollback manifest is appended and
//! flushed per operation so an interrupt never loses an applied entry.

use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use csv::{ReaderBuilder, Writer, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::LedgerError;
use crate::ledger::ProcessResult;

// ── Column sets ──

pub const PREVIEW_HEADER: &[&str] = &[
    "original_path",
    "new_filename",
    "transaction_type",
    "property_name",
    "price_normalized",
    "status",
    "error_message",
];

pub const APPLY_HEADER: &[&str] = &[
    "original_path",
    "new_filename",
    "transaction_type",
    "property_name",
    "price_normalized",
    "status",
    "error_message",
    "timestamp",
    "actual_new_path",
];

pub const ERROR_HEADER: &[&str] = &["original_path", "error_type", "error_message", "timestamp"];

pub const ROLLBACK_HEADER: &[&str] = &["old_path", "new_path", "timestamp"];

// ── Rows ──

/// One rollback manifest row, replayed in reverse by restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackRow {
    pub old_path: String,
    pub new_path: String,
    pub timestamp: String,
}

/// One error manifest row. Rows are content-free by construction: the
/// message is a category plus an error display, and extracted document
/// text must never pass through this constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub original_path: String,
    pub error_type: String,
    pub error_message: String,
    pub timestamp: String,
}

impl ErrorRecord {
    pub fn new(path: &Path, error_type: &str, message: impl Display) -> Self {
        Self {
            original_path: path.display().to_string(),
            error_type: error_type.to_string(),
            error_message: message.to_string(),
            timestamp: now_iso(),
        }
    }
}

pub(crate) fn now_iso() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// `{base}_{YYYYMMDD_HHMMSS}.tsv`, stamped with the run's start time.
pub fn timestamped_name(base: &str, at: DateTime<Local>) -> String {
    format!("{base}_{}.tsv", at.format("%Y%m%d_%H%M%S"))
}

// ── Writers ──

fn tsv_writer(path: &Path) -> Result<Writer<File>, LedgerError> {
    Ok(WriterBuilder::new().delimiter(b'\t').from_path(path)?)
}

/// Write the preview manifest for a dry-run.
pub fn write_preview(path: &Path, results: &[ProcessResult]) -> Result<(), LedgerError> {
    let mut writer = tsv_writer(path)?;
    writer.write_record(PREVIEW_HEADER)?;
    for result in results {
        writer.write_record(result.preview_fields())?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = results.len(), "preview manifest written");
    Ok(())
}

/// Write the apply manifest: preview columns plus timestamp and the
/// actual destination after collision suffixing.
pub fn write_apply(path: &Path, results: &[ProcessResult]) -> Result<(), LedgerError> {
    let mut writer = tsv_writer(path)?;
    writer.write_record(APPLY_HEADER)?;
    for result in results {
        writer.write_record(result.apply_fields())?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = results.len(), "apply manifest written");
    Ok(())
}

/// Append error records, writing the header only when the file is new.
/// Consecutive runs accumulate into the same file.
pub fn append_errors(path: &Path, records: &[ErrorRecord]) -> Result<(), LedgerError> {
    if records.is_empty() {
        return Ok(());
    }
    let new_file = !path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(file);
    if new_file {
        writer.write_record(ERROR_HEADER)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = records.len(), "error manifest appended");
    Ok(())
}

/// Incremental rollback manifest writer. Each row is flushed before the
/// caller moves to the next document, so stopping between documents
/// loses nothing and never leaves a partial row.
pub struct RollbackWriter {
    writer: Writer<File>,
    path: PathBuf,
}

impl RollbackWriter {
    pub fn create(path: &Path) -> Result<Self, LedgerError> {
        let mut writer = WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_path(path)?;
        writer.write_record(ROLLBACK_HEADER)?;
        writer.flush()?;
        Ok(Self {
            writer,
            path: path.to_path_buf(),
        })
    }

    pub fn append(&mut self, row: &RollbackRow) -> Result<(), LedgerError> {
        self.writer.serialize(row)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read a rollback manifest, validating the header.
pub fn read_rollback(path: &Path) -> Result<Vec<RollbackRow>, LedgerError> {
    if !path.exists() {
        return Err(LedgerError::ManifestNotFound(path.to_path_buf()));
    }
    let mut reader = ReaderBuilder::new().delimiter(b'\t').from_path(path)?;
    let found: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if found != ROLLBACK_HEADER {
        return Err(LedgerError::BadHeader {
            expected: ROLLBACK_HEADER,
            found,
        });
    }
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamped_names_use_run_start() {
        let at = Local.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(
            timestamped_name("mysoku_rollback", at),
            "mysoku_rollback_20250314_092653.tsv"
        );
    }

    #[test]
    fn rollback_manifest_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollback.tsv");
        let mut writer = RollbackWriter::create(&path).unwrap();
        writer
            .append(&RollbackRow {
                old_path: "/flyers/a.pdf".into(),
                new_path: "/flyers/【売買】タワー_2億円.pdf".into(),
                timestamp: "2025-03-14T09:26:53".into(),
            })
            .unwrap();

        let rows = read_rollback(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].old_path, "/flyers/a.pdf");
        assert_eq!(rows[0].new_path, "/flyers/【売買】タワー_2億円.pdf");
    }

    #[test]
    fn empty_rollback_manifest_still_has_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollback.tsv");
        RollbackWriter::create(&path).unwrap();
        assert!(read_rollback(&path).unwrap().is_empty());
    }

    #[test]
    fn header_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.tsv");
        std::fs::write(&path, "who\twhat\twhen\na\tb\tc\n").unwrap();
        let err = read_rollback(&path).unwrap_err();
        assert!(matches!(err, LedgerError::BadHeader { .. }));
    }

    #[test]
    fn missing_rollback_manifest_is_an_error() {
        let err = read_rollback(Path::new("/nonexistent/rollback.tsv")).unwrap_err();
        assert!(matches!(err, LedgerError::ManifestNotFound(_)));
    }

    #[test]
    fn error_manifest_header_written_once_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.tsv");
        let record = ErrorRecord::new(Path::new("/flyers/bad.pdf"), "extraction_error", "pdf parse error");
        append_errors(&path, std::slice::from_ref(&record)).unwrap();
        append_errors(&path, &[record]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let headers = contents
            .lines()
            .filter(|l| l.starts_with("original_path"))
            .count();
        assert_eq!(headers, 1);
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn error_records_carry_category_and_path_only() {
        let record = ErrorRecord::new(Path::new("/flyers/bad.pdf"), "extraction_error", "io error");
        assert_eq!(record.original_path, "/flyers/bad.pdf");
        assert_eq!(record.error_type, "extraction_error");
        assert!(!record.timestamp.is_empty());
    }
}
