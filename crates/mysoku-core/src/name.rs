//! Property-name resolution over normalised flyer text.
//!
//! Three tiers, first hit wins:
//!
//! 1. A labeled field (物件名：…) — the value on the label line, or the
//!    next non-empty line when the label stands alone.
//! 2. The line with the largest emphasis weight (font size), when the
//!    extractor supplied weights.
//! 3. The line that needed the fewest noise removals, earliest line on a
//!    tie.
//!
//! Every tier sees the same candidate cleaning and eligibility rules, so
//! a line disqualified in one tier is disqualified in all of them. When
//! no tier produces a usable name the resolver returns [`NAME_NOT_FOUND`]
//! rather than an empty string.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::{NormalizedText, TextLine, WHITESPACE};
use crate::price;

/// Sentinel carried through filenames and manifests when no name resolves.
pub const NAME_NOT_FOUND: &str = "名称未取得";

static NAME_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:物件名|建物名|マンション名|アパート名)\s*[：:]\s*(.*)").unwrap()
});

/// Field labels that survive noise stripping but never belong in a name.
/// A price line reduced to its label (販売価格：) must not become a name.
static FIELD_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:販売価格|売出価格|賃料|家賃|月額|管理費|敷金|礼金|所在地|交通|築年月|専有面積|価格)\s*[：:]?",
    )
    .unwrap()
});

/// Strip price expressions and field labels from a candidate line.
///
/// Returns the cleaned text and the number of extra removals performed,
/// which tier 3 adds to the line's normalisation removal count.
fn clean_candidate(text: &str) -> (String, u32) {
    let mut removals = 0u32;

    removals += price::PRICE_EXPR.find_iter(text).count() as u32;
    let cleaned = price::PRICE_EXPR.replace_all(text, "");

    removals += FIELD_LABEL.find_iter(&cleaned).count() as u32;
    let cleaned = FIELD_LABEL.replace_all(&cleaned, "");

    // Interpunct separators at the edges are decoration, not name text.
    let cleaned = cleaned.trim_matches(|c: char| c == '・' || c.is_whitespace());
    let cleaned = WHITESPACE.replace_all(cleaned, " ").into_owned();
    (cleaned, removals)
}

/// A cleaned candidate must keep at least two characters, and digits alone
/// are a room number, not a name.
fn eligible(cleaned: &str) -> bool {
    cleaned.chars().count() >= 2 && !cleaned.chars().all(|c| c.is_ascii_digit())
}

fn cleaned_if_eligible(line: &TextLine) -> Option<(String, u32)> {
    if line.text.is_empty() {
        return None;
    }
    let (cleaned, removals) = clean_candidate(&line.text);
    eligible(&cleaned).then_some((cleaned, removals))
}

/// Tier 1: explicit name label, value on the same or the next line.
fn labeled_field(normalized: &NormalizedText) -> Option<String> {
    for (i, line) in normalized.lines.iter().enumerate() {
        let Some(caps) = NAME_LABEL.captures(&line.text) else {
            continue;
        };
        let value = caps.get(1).map_or("", |m| m.as_str()).trim();
        if !value.is_empty() {
            let (cleaned, _) = clean_candidate(value);
            if eligible(&cleaned) {
                return Some(cleaned);
            }
            continue;
        }
        // Label stands alone; the value is the next non-empty line.
        if let Some(next) = normalized.lines[i + 1..].iter().find(|l| !l.text.is_empty())
            && let Some((cleaned, _)) = cleaned_if_eligible(next)
        {
            return Some(cleaned);
        }
    }
    None
}

/// Tier 2: the eligible line with the largest emphasis weight. Skipped
/// when no line carries a weight; ties go to the earliest line.
fn heaviest_line(normalized: &NormalizedText) -> Option<String> {
    let mut best: Option<(f32, String)> = None;
    for line in &normalized.lines {
        let Some(weight) = line.weight else { continue };
        let Some((cleaned, _)) = cleaned_if_eligible(line) else {
            continue;
        };
        match &best {
            Some((w, _)) if weight <= *w => {}
            _ => best = Some((weight, cleaned)),
        }
    }
    best.map(|(_, name)| name)
}

/// Tier 3: the eligible line that took the fewest removals to clean,
/// counting both normalisation and candidate cleaning. Earliest wins ties.
fn least_noisy_line(normalized: &NormalizedText) -> Option<String> {
    let mut best: Option<(u32, String)> = None;
    for line in &normalized.lines {
        let Some((cleaned, extra)) = cleaned_if_eligible(line) else {
            continue;
        };
        let removals = line.removals + extra;
        match &best {
            Some((r, _)) if removals >= *r => {}
            _ => best = Some((removals, cleaned)),
        }
    }
    best.map(|(_, name)| name)
}

/// Resolve the property name from normalised text.
pub fn resolve(normalized: &NormalizedText) -> String {
    labeled_field(normalized)
        .or_else(|| heaviest_line(normalized))
        .or_else(|| least_noisy_line(normalized))
        .unwrap_or_else(|| NAME_NOT_FOUND.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, normalize_with_weights};

    #[test]
    fn labeled_field_wins() {
        let n = normalize("1.5億円\n物件名：サンシャイン101\nグランドタワー渋谷");
        assert_eq!(resolve(&n), "サンシャイン101");
    }

    #[test]
    fn labeled_field_value_on_next_line() {
        let n = normalize("建物名：\nレジデンス代官山\n家賃 180,000円");
        assert_eq!(resolve(&n), "レジデンス代官山");
    }

    #[test]
    fn labeled_field_value_is_cleaned() {
        let n = normalize("物件名：グランドタワー渋谷 1203号室");
        assert_eq!(resolve(&n), "グランドタワー渋谷");
    }

    #[test]
    fn heaviest_line_wins_when_weights_available() {
        let lines = vec![
            ("所在地：東京都渋谷区".to_string(), Some(9.0)),
            ("グランドタワー渋谷".to_string(), Some(22.0)),
            ("販売価格：1.5億円".to_string(), Some(14.0)),
        ];
        let n = normalize_with_weights(&lines);
        assert_eq!(resolve(&n), "グランドタワー渋谷");
    }

    #[test]
    fn emptied_line_cannot_win_on_weight() {
        // The heaviest line is pure noise; the next heaviest wins.
        let lines = vec![
            ("★新着★".to_string(), Some(30.0)),
            ("メゾン白金".to_string(), Some(18.0)),
        ];
        let n = normalize_with_weights(&lines);
        assert_eq!(resolve(&n), "メゾン白金");
    }

    #[test]
    fn least_noisy_line_without_weights() {
        let n = normalize("1.5億円\n新着\nグランドタワー渋谷");
        assert_eq!(resolve(&n), "グランドタワー渋谷");
    }

    #[test]
    fn fewest_removals_breaks_toward_cleaner_line() {
        // Both lines survive cleaning, but the second needed a removal.
        let n = normalize("メゾン白金\n掲載用 パークハウス");
        assert_eq!(resolve(&n), "メゾン白金");
    }

    #[test]
    fn earliest_line_wins_removal_ties() {
        let n = normalize("グランドハイツ\nメゾン白金");
        assert_eq!(resolve(&n), "グランドハイツ");
    }

    #[test]
    fn price_only_line_is_not_a_name() {
        let n = normalize("販売価格：2億3,500万円");
        assert_eq!(resolve(&n), NAME_NOT_FOUND);
    }

    #[test]
    fn digits_only_line_is_not_a_name() {
        let n = normalize("12345");
        assert_eq!(resolve(&n), NAME_NOT_FOUND);
    }

    #[test]
    fn empty_text_yields_sentinel() {
        let n = normalize("");
        assert_eq!(resolve(&n), NAME_NOT_FOUND);
    }

    #[test]
    fn resolution_is_deterministic() {
        let raw = "物件No12345 グランドハイツ\n値下げ！パークハウス\n家賃 95,000円";
        let first = resolve(&normalize(raw));
        for _ in 0..5 {
            assert_eq!(resolve(&normalize(raw)), first);
        }
    }
}
