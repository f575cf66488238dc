//! The transaction ledger: plan and execute rename/copy operations.
//!
//! Planning is shared by dry-run and apply, so the two modes make the
//! same claimed-name decisions in the same order for the same inputs.
//! Execution appends a rollback row, flushed durably, before the caller
//! moves to the next document.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use mysoku_core::ParsedInfo;
use mysoku_core::filename::{self, ClaimedNames};

use crate::LedgerError;
use crate::manifest::{RollbackRow, RollbackWriter, now_iso};

/// Terminal status of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Success,
    Error,
    Skipped,
}

impl ProcessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }
}

/// Outcome of processing one document; one manifest row.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub original_path: PathBuf,
    pub parsed: ParsedInfo,
    pub planned_filename: String,
    pub status: ProcessStatus,
    /// Empty unless status is Error or Skipped.
    pub error_message: String,
    /// Set only once an apply operation executes.
    pub timestamp: String,
    /// Set only after apply; reflects collision suffixing.
    pub actual_path: Option<PathBuf>,
}

impl ProcessResult {
    fn new(original_path: &Path, parsed: ParsedInfo, planned: String, status: ProcessStatus, error_message: String) -> Self {
        Self {
            original_path: original_path.to_path_buf(),
            parsed,
            planned_filename: planned,
            status,
            error_message,
            timestamp: String::new(),
            actual_path: None,
        }
    }

    /// A document that never reached planning (extraction failed).
    pub fn skipped_before_analysis(original_path: &Path, error_message: String) -> Self {
        Self::new(
            original_path,
            ParsedInfo::not_found(),
            String::new(),
            ProcessStatus::Skipped,
            error_message,
        )
    }

    pub(crate) fn preview_fields(&self) -> [String; 7] {
        [
            self.original_path.display().to_string(),
            self.planned_filename.clone(),
            self.parsed.kind.as_str().to_string(),
            self.parsed.name.clone(),
            self.parsed.amount.clone(),
            self.status.as_str().to_string(),
            self.error_message.clone(),
        ]
    }

    pub(crate) fn apply_fields(&self) -> [String; 9] {
        let [a, b, c, d, e, f, g] = self.preview_fields();
        [
            a,
            b,
            c,
            d,
            e,
            f,
            g,
            self.timestamp.clone(),
            self.actual_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        ]
    }
}

/// One executed operation, backing rollback.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    pub timestamp: String,
}

/// Run-level destination choice: rename in place, or copy into a
/// directory.
#[derive(Debug, Clone)]
pub enum Destination {
    InPlace,
    CopyTo(PathBuf),
}

/// Owns the claimed-name set and the rollback manifest for one run.
/// Single writer; entries are append-only for the life of the run.
pub struct TransactionLedger {
    destination: Destination,
    claimed: ClaimedNames,
    entries: Vec<LedgerEntry>,
    rollback: Option<RollbackWriter>,
}

impl TransactionLedger {
    /// A ledger that records plans but never touches the filesystem.
    pub fn dry_run(destination: Destination) -> Self {
        Self {
            destination,
            claimed: ClaimedNames::new(),
            entries: Vec::new(),
            rollback: None,
        }
    }

    /// A ledger that executes operations, with its rollback manifest
    /// opened up front. Copy mode creates the output directory here so
    /// a creation failure aborts before any document is processed.
    pub fn apply(destination: Destination, rollback_path: &Path) -> Result<Self, LedgerError> {
        if let Destination::CopyTo(dir) = &destination {
            fs::create_dir_all(dir)?;
        }
        let rollback = RollbackWriter::create(rollback_path)?;
        Ok(Self {
            destination,
            claimed: ClaimedNames::new(),
            entries: Vec::new(),
            rollback: Some(rollback),
        })
    }

    fn target_dir(&self, original: &Path) -> PathBuf {
        match &self.destination {
            Destination::InPlace => original
                .parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
            Destination::CopyTo(dir) => dir.clone(),
        }
    }

    /// Plan one document: synthesize the filename and settle collisions
    /// against this run's claims and the destination directory.
    pub fn plan(&mut self, original: &Path, parsed: ParsedInfo) -> ProcessResult {
        let extension = original
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        let candidate = filename::synthesize(&parsed, &extension);
        let dir = self.target_dir(original);

        // Already-named documents are skipped, not suffixed against
        // themselves. Copy mode still copies: same name, other directory.
        if matches!(self.destination, Destination::InPlace)
            && original.file_name().and_then(|n| n.to_str()) == Some(candidate.as_str())
        {
            return ProcessResult::new(
                original,
                parsed,
                candidate,
                ProcessStatus::Skipped,
                "already named".to_string(),
            );
        }

        match filename::resolve_collision(&candidate, &dir, &mut self.claimed, |name| {
            dir.join(name).exists()
        }) {
            Ok(planned) => {
                ProcessResult::new(original, parsed, planned, ProcessStatus::Success, String::new())
            }
            Err(err) => {
                warn!(path = %original.display(), %err, "collision suffixes exhausted");
                ProcessResult::new(
                    original,
                    parsed,
                    candidate,
                    ProcessStatus::Error,
                    format!("collision_error: {err}"),
                )
            }
        }
    }

    /// Execute a planned operation: rename or copy, then record the
    /// rollback entry. File operation failures stay continuable and come
    /// back as an Error result; storage exhaustion and rollback manifest
    /// write failures are fatal and propagate.
    pub fn execute(&mut self, mut plan: ProcessResult) -> Result<ProcessResult, LedgerError> {
        if plan.status != ProcessStatus::Success {
            return Ok(plan);
        }
        plan.timestamp = now_iso();

        if !plan.original_path.exists() {
            plan.status = ProcessStatus::Error;
            plan.error_message = "file_operation_error: source missing".to_string();
            return Ok(plan);
        }

        let target = self.target_dir(&plan.original_path).join(&plan.planned_filename);
        let outcome = match &self.destination {
            Destination::InPlace => fs::rename(&plan.original_path, &target),
            Destination::CopyTo(_) => fs::copy(&plan.original_path, &target).map(|_| ()),
        };

        match outcome {
            Ok(()) => {
                let entry = LedgerEntry {
                    old_path: plan.original_path.clone(),
                    new_path: target.clone(),
                    timestamp: plan.timestamp.clone(),
                };
                if let Some(writer) = &mut self.rollback {
                    writer.append(&RollbackRow {
                        old_path: entry.old_path.display().to_string(),
                        new_path: entry.new_path.display().to_string(),
                        timestamp: entry.timestamp.clone(),
                    })?;
                }
                info!(
                    from = %plan.original_path.display(),
                    to = %target.display(),
                    "applied"
                );
                self.entries.push(entry);
                plan.actual_path = Some(target);
                Ok(plan)
            }
            // A full disk will fail every remaining document too; abort
            // the run instead of looping through failures.
            Err(err) if err.kind() == io::ErrorKind::StorageFull => Err(LedgerError::Io(err)),
            Err(err) => {
                warn!(path = %plan.original_path.display(), kind = %err.kind(), "file operation failed");
                plan.status = ProcessStatus::Error;
                plan.error_message = format!("file_operation_error: {}", err.kind());
                Ok(plan)
            }
        }
    }

    /// Executed operations so far, in order.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn rollback_path(&self) -> Option<&Path> {
        self.rollback.as_ref().map(RollbackWriter::path)
    }
}
