//! Embedded PDF text extraction via lopdf.
//!
//! Walks each page's content stream: `Tj`/`TJ`/`'`/`"` collect text,
//! `Td`/`TD`/`T*`/`ET` break lines, and `Tf` tracks the active font size
//! so each line carries the largest size seen on it as an emphasis
//! weight for name resolution.

use std::path::Path;

use lopdf::content::Content;
use lopdf::{Document, Object};
use tracing::debug;

use crate::ExtractError;

/// Character count below which a document is an OCR candidate.
pub const OCR_THRESHOLD: usize = 200;

/// Text recovered from a PDF's embedded layer.
#[derive(Debug, Clone)]
pub struct PdfText {
    /// Extracted lines with the largest font size seen on each.
    pub lines: Vec<(String, Option<f32>)>,
    /// Non-whitespace character count across all lines.
    pub char_count: usize,
    /// Extraction note for manifests and logs, e.g. `embedded_text_530chars`.
    pub note: String,
}

impl PdfText {
    pub fn needs_ocr(&self) -> bool {
        self.char_count < OCR_THRESHOLD
    }
}

/// Extract the embedded text of every page.
pub fn extract(path: &Path) -> Result<PdfText, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::NotFound(path.to_path_buf()));
    }
    if !path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
    {
        return Err(ExtractError::NotPdf(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    let mut lines = Vec::new();
    for (_, page_id) in doc.get_pages() {
        // A page with an undecodable stream contributes nothing; the
        // rest of the document still extracts.
        if let Ok(content_bytes) = doc.get_page_content(page_id)
            && let Ok(content) = Content::decode(&content_bytes)
        {
            walk_operations(&content, &mut lines);
        }
    }

    let char_count = lines
        .iter()
        .map(|(text, _)| text.chars().filter(|c| !c.is_whitespace()).count())
        .sum();
    let note = if char_count == 0 {
        "no_text_extracted".to_string()
    } else if char_count < OCR_THRESHOLD {
        format!("short_text_{char_count}chars")
    } else {
        format!("embedded_text_{char_count}chars")
    };
    debug!(path = %path.display(), char_count, %note, "extracted embedded text");

    Ok(PdfText {
        lines,
        char_count,
        note,
    })
}

fn walk_operations(content: &Content, lines: &mut Vec<(String, Option<f32>)>) {
    let mut font_size = 0f32;
    let mut line = String::new();
    let mut weight: Option<f32> = None;

    let mut flush = |line: &mut String, weight: &mut Option<f32>| {
        if !line.trim().is_empty() {
            lines.push((line.trim().to_string(), *weight));
        }
        line.clear();
        *weight = None;
    };

    for op in &content.operations {
        match op.operator.as_str() {
            "Tf" => {
                if let Some(size) = op.operands.get(1).and_then(as_number) {
                    font_size = size;
                }
            }
            "Tj" | "TJ" | "'" | "\"" => {
                for operand in &op.operands {
                    if let Some(s) = decode_text_object(operand) {
                        line.push_str(&s);
                        if font_size > 0.0 {
                            weight = Some(weight.map_or(font_size, |w| w.max(font_size)));
                        }
                    }
                }
            }
            "Td" | "TD" | "T*" | "ET" => flush(&mut line, &mut weight),
            _ => {}
        }
    }
    flush(&mut line, &mut weight);
}

fn as_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Decode a string operand: UTF-16BE when BOM-prefixed, UTF-8 when
/// valid, byte-cast otherwise. `TJ` arrays mix strings with kerning
/// numbers, which are skipped.
fn decode_text_object(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_string_bytes(bytes)),
        Object::Array(items) => {
            let joined: String = items.iter().filter_map(decode_text_object).collect();
            (!joined.is_empty()).then_some(joined)
        }
        _ => None,
    }
}

fn decode_string_bytes(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{Stream, dictionary};

    /// Build a one-page PDF whose content stream carries the given lines
    /// at the given font sizes. Rendering fidelity is irrelevant; only
    /// the operator stream matters here.
    fn fixture_pdf(path: &Path, lines: &[(&str, i64)]) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut ops = vec![Operation::new("BT", vec![])];
        for (text, size) in lines {
            ops.push(Operation::new("Tf", vec!["F1".into(), (*size).into()]));
            ops.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
            ops.push(Operation::new("Td", vec![0.into(), (-30).into()]));
        }
        ops.push(Operation::new("ET", vec![]));
        let content = Content { operations: ops };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn round_trips_lines_and_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flyer.pdf");
        fixture_pdf(&path, &[("グランドタワー渋谷", 24), ("販売価格：1.5億円", 12)]);

        let text = extract(&path).unwrap();
        assert_eq!(
            text.lines,
            vec![
                ("グランドタワー渋谷".to_string(), Some(24.0)),
                ("販売価格：1.5億円".to_string(), Some(12.0)),
            ]
        );
    }

    #[test]
    fn short_documents_are_ocr_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thin.pdf");
        fixture_pdf(&path, &[("11階", 10)]);

        let text = extract(&path).unwrap();
        assert!(text.needs_ocr());
        assert!(text.note.starts_with("short_text_"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = extract(Path::new("/nonexistent/flyer.pdf")).unwrap_err();
        assert!(matches!(err, ExtractError::NotFound(_)));
    }

    #[test]
    fn non_pdf_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flyer.txt");
        std::fs::write(&path, "not a pdf").unwrap();
        let err = extract(&path).unwrap_err();
        assert!(matches!(err, ExtractError::NotPdf(_)));
    }

    #[test]
    fn corrupt_pdf_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, "%PDF-1.5\ngarbage").unwrap();
        assert!(extract(&path).is_err());
    }

    #[test]
    fn utf16be_strings_decode() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "渋谷".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_string_bytes(&bytes), "渋谷");
    }

    #[test]
    fn utf8_strings_decode() {
        assert_eq!(decode_string_bytes("家賃180,000円".as_bytes()), "家賃180,000円");
    }
}
