//! Filename synthesis and collision-free naming.
//!
//! A parse becomes `prefix + name + _ + amount + extension`, sanitised
//! for the filesystem and capped at [`MAX_FILENAME_BYTES`]. Collisions
//! against the destination directory and against names already claimed
//! this run are resolved with `-1`, `-2`, … suffixes; a claim never
//! releases, so one run never produces the same name twice.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::analyze::ParsedInfo;
use crate::normalize::WHITESPACE;

/// Filename cap in UTF-8 bytes, trimmed on a character boundary.
pub const MAX_FILENAME_BYTES: usize = 200;

/// Highest collision suffix tried before giving up.
pub const MAX_SUFFIX: u32 = 999;

/// Characters the filesystem rejects, each replaced with `・`.
const FORBIDDEN: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Replace forbidden characters with `・`, fold full-width spaces, and
/// collapse whitespace runs.
pub fn sanitize(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| {
            if FORBIDDEN.contains(&c) {
                '・'
            } else if c == '\u{3000}' {
                ' '
            } else {
                c
            }
        })
        .collect();
    WHITESPACE.replace_all(replaced.trim(), " ").into_owned()
}

/// Compose the candidate filename for a parse. Sentinel values flow
/// through unchanged, e.g. `【売買】サンプル_未取得.pdf`.
pub fn synthesize(info: &ParsedInfo, extension: &str) -> String {
    let mut stem = sanitize(&format!("{}{}_{}", info.kind.prefix(), info.name, info.amount));
    let budget = MAX_FILENAME_BYTES.saturating_sub(extension.len());
    while stem.len() > budget {
        stem.pop();
    }
    format!("{stem}{extension}")
}

/// Names reserved during one run, keyed by destination directory.
/// Claims are append-only for the life of the run.
#[derive(Debug, Default)]
pub struct ClaimedNames {
    names: HashSet<(PathBuf, String)>,
}

impl ClaimedNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, dir: &Path, name: &str) -> bool {
        self.names.contains(&(dir.to_path_buf(), name.to_string()))
    }

    fn claim(&mut self, dir: &Path, name: &str) {
        self.names.insert((dir.to_path_buf(), name.to_string()));
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Error)]
#[error("no free name for {candidate} within {MAX_SUFFIX} suffixes")]
pub struct SuffixesExhausted {
    pub candidate: String,
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 => name.split_at(i),
        _ => (name, ""),
    }
}

/// Settle `candidate` against the destination directory, claiming the
/// winner. `is_taken` reports names already present on disk; the claimed
/// set covers names promised earlier in this run. Suffixes are scanned
/// in increasing order from `-1` and a freed name is never retried.
pub fn resolve_collision<F>(
    candidate: &str,
    dir: &Path,
    claimed: &mut ClaimedNames,
    is_taken: F,
) -> Result<String, SuffixesExhausted>
where
    F: Fn(&str) -> bool,
{
    if !claimed.contains(dir, candidate) && !is_taken(candidate) {
        claimed.claim(dir, candidate);
        return Ok(candidate.to_string());
    }
    let (stem, extension) = split_extension(candidate);
    for i in 1..=MAX_SUFFIX {
        let name = format!("{stem}-{i}{extension}");
        if !claimed.contains(dir, &name) && !is_taken(&name) {
            claimed.claim(dir, &name);
            return Ok(name);
        }
    }
    Err(SuffixesExhausted {
        candidate: candidate.to_string(),
    })
}
