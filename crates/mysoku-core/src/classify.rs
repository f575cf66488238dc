//! Transaction-kind detection for flyer text.
//!
//! Flyers carry a fixed working vocabulary: sale sheets speak of 販売価格,
//! 売出, 分譲; lease sheets of 賃料, 家賃, 敷金. Detection is a contains
//! check against those vocabularies over normalised text, sale first.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Vocabulary that marks a sale flyer.
const SALE_MARKERS: &[&str] = &[
    "売買", "売出", "販売価格", "売出価格", "分譲", "売却", "販売", "購入",
];

/// Vocabulary that marks a lease flyer.
const LEASE_MARKERS: &[&str] = &[
    "賃貸", "賃料", "家賃", "月額", "管理費", "敷金", "礼金", "テナント", "貸",
];

/// A price quoted in hundred-million-yen units only ever appears on a sale
/// sheet, so it classifies on its own when no vocabulary hit exists.
static OKU_PRICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?\s*億").unwrap());

/// Transaction kind of a flyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    #[serde(rename = "sell")]
    Sale,
    #[serde(rename = "rent")]
    Lease,
    #[serde(rename = "unknown")]
    Unknown,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sale => "sell",
            Self::Lease => "rent",
            Self::Unknown => "unknown",
        }
    }

    /// Filename prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Sale => "【売買】",
            Self::Lease => "【賃貸】",
            Self::Unknown => "【その他】",
        }
    }
}

/// Detect the transaction kind of normalised flyer text.
///
/// Sale vocabulary is checked first: a sheet carrying both sale and lease
/// markers (e.g. a sale sheet quoting 管理費) is a sale. Lease vocabulary
/// is checked next, and an 億-unit price shape decides sale as a last
/// resort. Anything else is unknown.
pub fn detect(text: &str) -> TransactionKind {
    if SALE_MARKERS.iter().any(|m| text.contains(m)) {
        return TransactionKind::Sale;
    }
    if LEASE_MARKERS.iter().any(|m| text.contains(m)) {
        return TransactionKind::Lease;
    }
    if OKU_PRICE.is_match(text) {
        return TransactionKind::Sale;
    }
    TransactionKind::Unknown
}
