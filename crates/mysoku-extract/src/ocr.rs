//! OCR fallback via external tesseract and poppler binaries.
//!
//! Pages are rasterised at 300 DPI with `pdftoppm` into a scratch
//! directory, then read with `tesseract -l jpn+jpn_vert --psm 6` per
//! page. Every failure mode degrades to an [`OcrOutcome`] variant —
//! OCR is never allowed to fail a batch.

use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

const RASTER_DPI: &str = "300";
const TESSERACT_LANG: &str = "jpn+jpn_vert";

/// Result of an OCR attempt. Note strings match the extraction-notes
/// vocabulary used in logs and manifests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrOutcome {
    /// OCR produced text to append after the embedded text.
    Text(String),
    /// The tesseract or pdftoppm binaries are not installed.
    Unavailable,
    /// The binaries exist but rasterisation or recognition failed.
    Failed,
}

impl OcrOutcome {
    pub fn note(&self) -> &'static str {
        match self {
            Self::Text(_) => "ocr_ok",
            Self::Unavailable => "ocr_unavailable",
            Self::Failed => "ocr_failed",
        }
    }
}

/// Probe for both required binaries.
pub fn available() -> bool {
    let probe = |cmd: &str, arg: &str| {
        Command::new(cmd)
            .arg(arg)
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    };
    // pdftoppm -v prints its version but exits 0 only on some builds;
    // accept any run that produced version output.
    let pdftoppm = Command::new("pdftoppm")
        .arg("-v")
        .output()
        .map(|out| {
            out.status.success() || String::from_utf8_lossy(&out.stderr).contains("pdftoppm")
        })
        .unwrap_or(false);
    probe("tesseract", "--version") && pdftoppm
}

/// Run OCR over every page of the document.
pub fn recover_text(path: &Path) -> OcrOutcome {
    if !available() {
        return OcrOutcome::Unavailable;
    }
    match rasterize_and_read(path) {
        Ok(text) if !text.trim().is_empty() => {
            debug!(path = %path.display(), chars = text.chars().count(), "ocr recovered text");
            OcrOutcome::Text(text)
        }
        Ok(_) => OcrOutcome::Failed,
        Err(reason) => {
            warn!(path = %path.display(), %reason, "ocr failed");
            OcrOutcome::Failed
        }
    }
}

fn rasterize_and_read(path: &Path) -> Result<String, String> {
    let scratch = tempfile::tempdir().map_err(|e| e.to_string())?;
    let prefix = scratch.path().join("page");

    let status = Command::new("pdftoppm")
        .args(["-r", RASTER_DPI, "-png"])
        .arg(path)
        .arg(&prefix)
        .status()
        .map_err(|e| e.to_string())?;
    if !status.success() {
        return Err("pdftoppm exited nonzero".to_string());
    }

    let mut pages: Vec<_> = std::fs::read_dir(scratch.path())
        .map_err(|e| e.to_string())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|e| e == "png"))
        .collect();
    pages.sort();

    let mut texts = Vec::with_capacity(pages.len());
    for page in &pages {
        let output = Command::new("tesseract")
            .arg(page)
            .args(["stdout", "-l", TESSERACT_LANG, "--psm", "6"])
            .output()
            .map_err(|e| e.to_string())?;
        if !output.status.success() {
            return Err("tesseract exited nonzero".to_string());
        }
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !text.is_empty() {
            texts.push(text);
        }
    }
    Ok(texts.join("\n"))
}
