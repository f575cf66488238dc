//! The batch pipeline: discover PDFs, analyze each, plan or apply the
//! rename through the ledger, and write the run's manifests.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, bail};
use chrono::Local;
use tracing::{debug, info, warn};

use mysoku_core::ParsedInfo;
use mysoku_core::analyze;
use mysoku_extract::{ExtractError, OcrOutcome, ocr, pdf};
use mysoku_ledger::ledger::{Destination, ProcessResult, ProcessStatus, TransactionLedger};
use mysoku_ledger::manifest::{self, ErrorRecord};

pub const DEFAULT_MAX_FILES: usize = 1000;

pub struct RenameOptions {
    pub input: PathBuf,
    pub apply: bool,
    pub outdir: Option<PathBuf>,
    pub ocr: bool,
    pub strict: bool,
    pub max_files: usize,
    pub manifest: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct RunStats {
    pub total: usize,
    pub success: usize,
    pub errors: usize,
    pub skipped: usize,
}

/// Run the rename pipeline over the input. Returns the stats of a
/// completed run; configuration errors and strict-mode aborts come back
/// as errors and map to a non-zero exit.
pub fn run_rename(options: &RenameOptions) -> anyhow::Result<RunStats> {
    if options.max_files == 0 {
        bail!("--max-files must be at least 1");
    }
    let pdfs = find_pdfs(&options.input)?;
    if pdfs.len() > options.max_files {
        bail!(
            "found {} PDFs, above the --max-files bound of {}; nothing was processed",
            pdfs.len(),
            options.max_files
        );
    }

    let base = run_base_dir(&options.input);
    let started = Local::now();
    let clock = Instant::now();
    let destination = match &options.outdir {
        Some(dir) => Destination::CopyTo(dir.clone()),
        None => Destination::InPlace,
    };

    let mut ledger = if options.apply {
        let rollback_path = base.join(manifest::timestamped_name("mysoku_rollback", started));
        TransactionLedger::apply(destination, &rollback_path)
            .context("opening the rollback manifest")?
    } else {
        TransactionLedger::dry_run(destination)
    };
    info!(
        mode = if options.apply { "apply" } else { "dry-run" },
        documents = pdfs.len(),
        "starting run"
    );

    let mut stats = RunStats {
        total: pdfs.len(),
        ..RunStats::default()
    };
    let mut results: Vec<ProcessResult> = Vec::with_capacity(pdfs.len());
    let mut error_records: Vec<ErrorRecord> = Vec::new();
    let mut aborted: Option<String> = None;

    for (i, path) in pdfs.iter().enumerate() {
        let result = match analyze_document(path, options.ocr) {
            Ok(parsed) => {
                let plan = ledger.plan(path, parsed);
                if options.apply {
                    ledger
                        .execute(plan)
                        .context("applying the planned operation")?
                } else {
                    plan
                }
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "extraction failed, skipping");
                ProcessResult::skipped_before_analysis(path, format!("extraction_error: {err}"))
            }
        };

        eprintln!(
            "[{}/{}] {} → {} ({})",
            i + 1,
            pdfs.len(),
            path.file_name().and_then(|n| n.to_str()).unwrap_or("?"),
            result.planned_filename,
            result.status.as_str()
        );

        match result.status {
            ProcessStatus::Success => stats.success += 1,
            ProcessStatus::Error => {
                stats.errors += 1;
                error_records.push(ErrorRecord::new(
                    path,
                    error_type_of(&result.error_message),
                    &result.error_message,
                ));
            }
            ProcessStatus::Skipped => {
                stats.skipped += 1;
                error_records.push(ErrorRecord::new(
                    path,
                    error_type_of(&result.error_message),
                    &result.error_message,
                ));
            }
        }
        // Strict mode escalates continuable failures, not benign skips:
        // an already-named document must not end the run.
        let stop = options.strict
            && result.status != ProcessStatus::Success
            && error_type_of(&result.error_message) != "skipped";
        results.push(result);
        if stop {
            aborted = Some(format!(
                "strict mode: stopping at the first error ({})",
                path.display()
            ));
            break;
        }
    }

    let manifest_path = options.manifest.clone().unwrap_or_else(|| {
        if options.apply {
            base.join(manifest::timestamped_name("mysoku_apply", started))
        } else {
            base.join("mysoku_preview.tsv")
        }
    });
    if options.apply {
        manifest::write_apply(&manifest_path, &results).context("writing the apply manifest")?;
    } else {
        manifest::write_preview(&manifest_path, &results)
            .context("writing the preview manifest")?;
    }
    manifest::append_errors(&base.join("errors.tsv"), &error_records)
        .context("writing the error manifest")?;

    println!(
        "{}: {} documents, {} success, {} errors, {} skipped ({:.1}s)",
        if options.apply { "apply" } else { "dry-run" },
        stats.total,
        stats.success,
        stats.errors,
        stats.skipped,
        clock.elapsed().as_secs_f64()
    );
    println!("manifest: {}", manifest_path.display());
    if let Some(rollback) = ledger.rollback_path() {
        println!("rollback: {}", rollback.display());
    }

    if let Some(reason) = aborted {
        bail!("{reason}");
    }
    Ok(stats)
}

/// Undo an applied run. Dry-run by default; non-zero exit when any row
/// failed to restore.
pub fn run_restore(manifest: &Path, apply: bool) -> anyhow::Result<()> {
    let summary = mysoku_ledger::restore(manifest, apply).context("reading rollback manifest")?;
    if !summary.errors.is_empty() {
        let errors_path = manifest
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("errors.tsv");
        manifest::append_errors(&errors_path, &summary.errors)
            .context("writing the error manifest")?;
    }
    println!(
        "restore{}: {} restored, {} skipped, {} failed",
        if apply { "" } else { " (dry-run)" },
        summary.restored,
        summary.skipped,
        summary.failed
    );
    if summary.failed > 0 {
        bail!("{} operations could not be restored", summary.failed);
    }
    Ok(())
}

/// Extract one document's text, with the OCR fallback when enabled and
/// the embedded layer is below the threshold, then parse it.
fn analyze_document(path: &Path, use_ocr: bool) -> Result<ParsedInfo, ExtractError> {
    let extracted = pdf::extract(path)?;
    debug!(
        path = %path.display(),
        chars = extracted.char_count,
        note = %extracted.note,
        needs_ocr = extracted.needs_ocr(),
        "extracted"
    );
    let needs_ocr = extracted.needs_ocr();
    let mut lines = extracted.lines;
    if use_ocr && needs_ocr {
        match ocr::recover_text(path) {
            OcrOutcome::Text(text) => {
                info!(path = %path.display(), "ocr recovered text");
                lines.extend(text.lines().map(|l| (l.to_string(), None)));
            }
            outcome => {
                warn!(path = %path.display(), note = outcome.note(), "ocr produced no text");
            }
        }
    }
    Ok(analyze::analyze_lines(&lines))
}

fn error_type_of(message: &str) -> &'static str {
    for kind in ["extraction_error", "collision_error", "file_operation_error"] {
        if message.starts_with(kind) {
            return kind;
        }
    }
    "skipped"
}

fn run_base_dir(input: &Path) -> PathBuf {
    if input.is_dir() {
        input.to_path_buf()
    } else {
        input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Discover input documents: a single PDF, or a recursive, sorted walk
/// of a directory. Sorting keeps runs deterministic.
fn find_pdfs(input: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if input.is_file() {
        if is_pdf(input) {
            return Ok(vec![input.to_path_buf()]);
        }
        bail!("not a PDF file: {}", input.display());
    }
    if input.is_dir() {
        let mut found = Vec::new();
        walk(input, &mut found)
            .with_context(|| format!("walking directory {}", input.display()))?;
        found.sort();
        return Ok(found);
    }
    bail!("path not found: {}", input.display());
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, out)?;
        } else if is_pdf(&path) {
            out.push(path);
        }
    }
    Ok(())
}
