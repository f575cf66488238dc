//! Price extraction and canonical formatting.
//!
//! One grammar covers the compound forms flyers print: `N億円`,
//! `N.N億円`, `N億M万円`, `N万円`, and bare `N円` with at least four
//! digits. Candidates are scanned in document order and the first one
//! whose form fits the transaction kind wins — flyers list the current
//! asking price first, later figures are comparables or fees.
//!
//! All arithmetic is on integer yen; the canonical string re-parses to
//! the same magnitude the source digits denoted.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::classify::TransactionKind;

/// Sentinel carried through filenames and manifests when no price resolves.
pub const AMOUNT_NOT_FOUND: &str = "未取得";

/// Bare-yen figures below this on a sale sheet are fees, not prices.
const SALE_YEN_FLOOR: u64 = 1_000_000;

/// The full price grammar. Alternation order matters: the 億 branch must
/// consume its optional 万 remainder before the bare 万 branch can see it.
pub(crate) static PRICE_EXPR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?:(?P<oku>[0-9]+(?:\.[0-9]+)?)\s*億\s*(?:(?P<okuman>[0-9][0-9,]*)\s*万\s*)?円?)",
        r"|(?:(?P<man>[0-9][0-9,]*)\s*万\s*円?)",
        r"|(?:(?P<yen>[0-9][0-9,]{3,})\s*円)",
    ))
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriceForm {
    Oku,
    Man,
    Yen,
}

#[derive(Debug, Clone, Copy)]
struct PriceHit {
    yen: u64,
    form: PriceForm,
}

fn digits(s: &str) -> Option<u64> {
    s.replace(',', "").parse().ok()
}

/// Parse `N` or `N.N` 億 into yen without going through floats.
fn oku_to_yen(s: &str) -> Option<u64> {
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    let mut yen = whole.parse::<u64>().ok()?.checked_mul(100_000_000)?;
    let mut scale = 100_000_000u64;
    for c in frac.chars().take(8) {
        scale /= 10;
        yen = yen.checked_add(c.to_digit(10)? as u64 * scale)?;
    }
    Some(yen)
}

/// All price candidates in document order.
fn scan(text: &str) -> Vec<PriceHit> {
    let mut hits = Vec::new();
    for caps in PRICE_EXPR.captures_iter(text) {
        let hit = if let Some(oku) = caps.name("oku") {
            let man = caps
                .name("okuman")
                .and_then(|m| digits(m.as_str()))
                .unwrap_or(0);
            oku_to_yen(oku.as_str())
                .and_then(|yen| yen.checked_add(man * 10_000))
                .map(|yen| PriceHit {
                    yen,
                    form: PriceForm::Oku,
                })
        } else if let Some(man) = caps.name("man") {
            digits(man.as_str())
                .and_then(|n| n.checked_mul(10_000))
                .map(|yen| PriceHit {
                    yen,
                    form: PriceForm::Man,
                })
        } else if let Some(yen) = caps.name("yen") {
            let raw = yen.as_str().replace(',', "");
            // The separator-tolerant pattern admits short figures like
            // 1,23円; the four-digit minimum is enforced here.
            (raw.len() >= 4)
                .then(|| raw.parse().ok())
                .flatten()
                .map(|yen| PriceHit {
                    yen,
                    form: PriceForm::Yen,
                })
        } else {
            None
        };
        if let Some(hit) = hit {
            hits.push(hit);
        }
    }
    hits
}

fn group_thousands(mut n: u64) -> String {
    let mut groups = Vec::new();
    loop {
        groups.push(n % 1000);
        n /= 1000;
        if n == 0 {
            break;
        }
    }
    let mut out = groups.pop().map(|g| g.to_string()).unwrap_or_default();
    while let Some(g) = groups.pop() {
        out.push_str(&format!(",{g:03}"));
    }
    out
}

/// Sale display form: one-decimal 億円 from 1億 up (integer values
/// collapse), thousands-separated 万円 below.
fn format_sale(yen: u64) -> String {
    if yen >= 100_000_000 {
        let tenths = (yen + 5_000_000) / 10_000_000;
        if tenths % 10 == 0 {
            format!("{}億円", tenths / 10)
        } else {
            format!("{}.{}億円", tenths / 10, tenths % 10)
        }
    } else {
        format!("{}万円", group_thousands(yen / 10_000))
    }
}

/// Lease display form: the 家賃 prefix is part of the canonical amount.
fn format_lease(yen: u64) -> String {
    format!("家賃{}円", group_thousands(yen))
}

/// Pick and canonicalise the price for the detected kind.
///
/// Sale accepts 億 and 万 forms plus bare-yen figures of at least one
/// million yen; lease accepts 万 and bare-yen forms, never 億. Unknown
/// kind and no acceptable candidate both yield [`AMOUNT_NOT_FOUND`].
pub fn normalize_price(text: &str, kind: TransactionKind) -> String {
    let selected = scan(text).into_iter().find(|hit| match kind {
        TransactionKind::Sale => hit.form != PriceForm::Yen || hit.yen >= SALE_YEN_FLOOR,
        TransactionKind::Lease => hit.form != PriceForm::Oku,
        TransactionKind::Unknown => false,
    });
    match (selected, kind) {
        (Some(hit), TransactionKind::Sale) => format_sale(hit.yen),
        (Some(hit), TransactionKind::Lease) => format_lease(hit.yen),
        _ => AMOUNT_NOT_FOUND.to_string(),
    }
}
