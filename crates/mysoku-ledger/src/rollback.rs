//! Restore: replay a rollback manifest in reverse.
//!
//! Same-directory rows rename `new_path` back to `old_path`. Rows whose
//! old path sits in a different directory came from a copy-mode run, so
//! the original still exists there and restoring means deleting the
//! copy. Conflicts (old path already occupied) and missing new paths
//! are reported, never clobbered.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::LedgerError;
use crate::manifest::{ErrorRecord, RollbackRow, read_rollback};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreAction {
    RenameBack,
    DeleteCopy,
    SkipNotFound,
    Conflict,
}

#[derive(Debug, Default)]
pub struct RestoreSummary {
    pub restored: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<ErrorRecord>,
}

/// Decide what undoing one row means, from the filesystem's current state.
pub fn plan_action(row: &RollbackRow) -> RestoreAction {
    let old_path = Path::new(&row.old_path);
    let new_path = Path::new(&row.new_path);
    if !new_path.exists() {
        return RestoreAction::SkipNotFound;
    }
    if old_path.parent() == new_path.parent() {
        if old_path.exists() {
            RestoreAction::Conflict
        } else {
            RestoreAction::RenameBack
        }
    } else {
        RestoreAction::DeleteCopy
    }
}

/// Replay a rollback manifest in reverse order. With `execute` false this
/// is a dry-run: actions are decided and reported but nothing moves.
pub fn restore(manifest: &Path, execute: bool) -> Result<RestoreSummary, LedgerError> {
    let rows = read_rollback(manifest)?;
    let mut summary = RestoreSummary::default();

    for row in rows.iter().rev() {
        let old_path = Path::new(&row.old_path);
        let new_path = Path::new(&row.new_path);
        match plan_action(row) {
            RestoreAction::RenameBack => {
                if !execute {
                    info!(from = %row.new_path, to = %row.old_path, "would rename back");
                    summary.restored += 1;
                    continue;
                }
                match fs::rename(new_path, old_path) {
                    Ok(()) => {
                        info!(from = %row.new_path, to = %row.old_path, "renamed back");
                        summary.restored += 1;
                    }
                    Err(err) => {
                        warn!(path = %row.new_path, kind = %err.kind(), "restore rename failed");
                        summary.failed += 1;
                        summary.errors.push(ErrorRecord::new(
                            new_path,
                            "rollback_error",
                            format_args!("rename failed: {}", err.kind()),
                        ));
                    }
                }
            }
            RestoreAction::DeleteCopy => {
                if !execute {
                    info!(path = %row.new_path, "would delete copy");
                    summary.restored += 1;
                    continue;
                }
                match fs::remove_file(new_path) {
                    Ok(()) => {
                        info!(path = %row.new_path, "deleted copy");
                        summary.restored += 1;
                    }
                    Err(err) => {
                        warn!(path = %row.new_path, kind = %err.kind(), "restore delete failed");
                        summary.failed += 1;
                        summary.errors.push(ErrorRecord::new(
                            new_path,
                            "rollback_error",
                            format_args!("delete failed: {}", err.kind()),
                        ));
                    }
                }
            }
            RestoreAction::SkipNotFound => {
                info!(path = %row.new_path, "skipped: file not found");
                summary.skipped += 1;
            }
            RestoreAction::Conflict => {
                warn!(path = %row.old_path, "skipped: restore target already exists");
                summary.skipped += 1;
                summary.errors.push(ErrorRecord::new(
                    new_path,
                    "rollback_error",
                    "restore target already exists",
                ));
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{RollbackWriter, now_iso};

    fn touch(path: &Path) {
        fs::write(path, b"stub").unwrap();
    }

    fn manifest_with(dir: &Path, rows: &[(&Path, &Path)]) -> std::path::PathBuf {
        let path = dir.join("rollback.tsv");
        let mut writer = RollbackWriter::create(&path).unwrap();
        for (old, new) in rows {
            writer
                .append(&RollbackRow {
                    old_path: old.display().to_string(),
                    new_path: new.display().to_string(),
                    timestamp: now_iso(),
                })
                .unwrap();
        }
        path
    }

    #[test]
    fn rename_back_restores_the_original_path() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("scan001.pdf");
        let new = dir.path().join("【売買】タワー_2億円.pdf");
        touch(&new);
        let manifest = manifest_with(dir.path(), &[(&old, &new)]);

        let summary = restore(&manifest, true).unwrap();
        assert_eq!(summary.restored, 1);
        assert_eq!(summary.failed, 0);
        assert!(old.exists());
        assert!(!new.exists());
    }

    #[test]
    fn copy_mode_rows_delete_the_copy() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("sorted");
        fs::create_dir(&out).unwrap();
        let old = dir.path().join("scan001.pdf");
        let new = out.join("【売買】タワー_2億円.pdf");
        touch(&old);
        touch(&new);
        let manifest = manifest_with(dir.path(), &[(&old, &new)]);

        let summary = restore(&manifest, true).unwrap();
        assert_eq!(summary.restored, 1);
        assert!(old.exists(), "the surviving original must not be touched");
        assert!(!new.exists());
    }

    #[test]
    fn conflict_rows_are_skipped_without_clobbering() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("scan001.pdf");
        let new = dir.path().join("renamed.pdf");
        touch(&old);
        touch(&new);
        let manifest = manifest_with(dir.path(), &[(&old, &new)]);

        // The occupied target is reported but never counts as a failure,
        // so a restore over it still exits cleanly.
        let summary = restore(&manifest, true).unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.errors.len(), 1);
        assert!(new.exists());
        assert!(old.exists());
    }

    #[test]
    fn missing_new_path_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("scan001.pdf");
        let new = dir.path().join("gone.pdf");
        let manifest = manifest_with(dir.path(), &[(&old, &new)]);

        let summary = restore(&manifest, true).unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
    }

    #[test]
    fn dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("scan001.pdf");
        let new = dir.path().join("renamed.pdf");
        touch(&new);
        let manifest = manifest_with(dir.path(), &[(&old, &new)]);

        let summary = restore(&manifest, false).unwrap();
        assert_eq!(summary.restored, 1);
        assert!(new.exists());
        assert!(!old.exists());
    }

    #[test]
    fn rows_replay_in_reverse_order() {
        // A file renamed twice in one run (a → b claimed, then another
        // document's b → b-1) must unwind newest-first.
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("b.pdf");
        let c = dir.path().join("c.pdf");
        touch(&c);
        let manifest = manifest_with(dir.path(), &[(&a, &b), (&b, &c)]);

        let summary = restore(&manifest, true).unwrap();
        // Reverse order: c → b first, then b → a.
        assert_eq!(summary.restored, 2);
        assert!(a.exists());
        assert!(!b.exists());
        assert!(!c.exists());
    }
}
