//! Per-document parse orchestration.
//!
//! One call takes the extracted lines of a flyer and runs the full
//! cascade: normalise, classify the transaction kind, resolve the
//! property name, canonicalise the price. Malformed or empty text never
//! fails — every field degrades to its sentinel.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::{self, TransactionKind};
use crate::name::{self, NAME_NOT_FOUND};
use crate::normalize;
use crate::price::{self, AMOUNT_NOT_FOUND};

/// The complete parse of one flyer. `name` and `amount` hold canonical
/// values or the sentinels; neither is ever empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedInfo {
    pub kind: TransactionKind,
    pub name: String,
    pub amount: String,
}

impl ParsedInfo {
    /// The all-sentinel parse, used for documents whose text never
    /// reached the analyzer.
    pub fn not_found() -> Self {
        Self {
            kind: TransactionKind::Unknown,
            name: NAME_NOT_FOUND.to_string(),
            amount: AMOUNT_NOT_FOUND.to_string(),
        }
    }
}

/// Analyze extracted lines, carrying emphasis weights into name resolution.
pub fn analyze_lines(lines: &[(String, Option<f32>)]) -> ParsedInfo {
    let normalized = normalize::normalize_with_weights(lines);
    let kind = classify::detect(&normalized.text);
    let name = name::resolve(&normalized);
    let amount = price::normalize_price(&normalized.text, kind);
    debug!(kind = kind.as_str(), %name, %amount, "parsed flyer text");
    ParsedInfo { kind, name, amount }
}

/// Analyze raw text with no emphasis metadata (OCR output, tests).
pub fn analyze(raw: &str) -> ParsedInfo {
    let lines: Vec<(String, Option<f32>)> = raw.lines().map(|l| (l.to_string(), None)).collect();
    analyze_lines(&lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lease_flyer_with_labeled_name() {
        let info = analyze("【賃貸】\n物件名：サンシャイン101\n号室：305\n家賃 180,000円\n掲載用");
        assert_eq!(info.kind, TransactionKind::Lease);
        assert_eq!(info.name, "サンシャイン101");
        assert_eq!(info.amount, "家賃180,000円");
    }

    #[test]
    fn sale_flyer_without_labeled_name() {
        let info = analyze("1.5億円\n新着\nグランドタワー渋谷");
        assert_eq!(info.kind, TransactionKind::Sale);
        assert_eq!(info.name, "グランドタワー渋谷");
        assert_eq!(info.amount, "1.5億円");
    }

    #[test]
    fn emphasis_weight_steers_the_name() {
        let lines = vec![
            ("販売価格：5,980万円".to_string(), Some(14.0)),
            ("パークハウス代々木".to_string(), Some(24.0)),
            ("東京都渋谷区代々木".to_string(), Some(10.0)),
        ];
        let info = analyze_lines(&lines);
        assert_eq!(info.kind, TransactionKind::Sale);
        assert_eq!(info.name, "パークハウス代々木");
        assert_eq!(info.amount, "5,980万円");
    }

    #[test]
    fn short_text_degrades_to_sentinels() {
        let info = analyze("高級");
        assert_eq!(info.kind, TransactionKind::Unknown);
        assert_eq!(info.name, "高級");
        assert_eq!(info.amount, AMOUNT_NOT_FOUND);
    }

    #[test]
    fn empty_text_is_all_sentinels() {
        assert_eq!(analyze(""), ParsedInfo::not_found());
    }

    #[test]
    fn unknown_kind_never_gets_an_amount() {
        // A plain-yen figure with no vocabulary stays unclassified.
        let info = analyze("メゾン白金\n210,000円");
        assert_eq!(info.kind, TransactionKind::Unknown);
        assert_eq!(info.amount, AMOUNT_NOT_FOUND);
    }
}
