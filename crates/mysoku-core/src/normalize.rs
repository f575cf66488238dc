//! Text normalisation for flyer text.
//!
//! Raw flyer text (embedded PDF text or OCR output) is folded into a
//! canonical form before any parsing: full-width digits and separators
//! become ASCII, decorative noise is stripped, whitespace collapses.
//! Line boundaries survive because the name resolver reasons about lines.
//!
//! # Flyer noise conventions
//!
//! - Listing numbers: 物件No12345, No.123, Ｎｏ．45
//! - Boilerplate stamps: 掲載用, 新着, 価格改定, 商談中, ...
//! - Bracketed decorations: （掲載用）, 【新着】, (価格改定)
//! - Star/symbol decorations: ★新着★, 値下げ！
//! - Unit and room markers: 1203号室, 304号, 101室, 15F, 3階, #405, -302,
//!   and the label-first form 号室：305

use once_cell::sync::Lazy;
use regex::Regex;

/// Boilerplate tokens stripped wherever they appear.
///
/// Ordered so that no earlier token is a proper prefix of a later one
/// (更新日 before 更新), keeping the alternation greedy enough.
const NOISE_TOKENS: &[&str] = &[
    "価格改定",
    "掲載用",
    "更新日",
    "商談中",
    "値下げ",
    "チラシ",
    "間取り",
    "新着",
    "成約",
    "改定",
    "更新",
    "図面",
    "NEW",
];

/// Decoration characters removed outright (never part of a property name).
const DECORATION: &[char] = &[
    '★', '☆', '■', '□', '◆', '◇', '●', '○', '▲', '△', '※', '＊', '*', '！', '!', '？', '?',
];

static BRACKET_NOISE: Lazy<Regex> = Lazy::new(|| {
    let tokens = NOISE_TOKENS.join("|");
    Regex::new(&format!(r"[（(\[【]\s*(?:{tokens})\s*[）)\]】]")).unwrap()
});

static LISTING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:物件No|No[.．]|Ｎｏ[.．]?)\s*[0-9]*").unwrap());

static NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(&NOISE_TOKENS.join("|")).unwrap());

static ROOM_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:号室\s*[：:]?\s*[0-9]{1,4}|[0-9]{1,4}\s*号室?|[0-9]{1,4}\s*室|[0-9]{1,3}\s*階|[0-9]{1,3}\s*F|#\s*[0-9]{1,4}|-[0-9]{1,4})",
    )
    .unwrap()
});

pub(crate) static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// One normalised line of flyer text.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// Surviving text after noise removal (may be empty).
    pub text: String,
    /// Largest font size seen on the line, when the extractor supplied one.
    pub weight: Option<f32>,
    /// Zero-based position of the line in the source text.
    pub index: usize,
    /// Number of noise matches removed while normalising this line.
    pub removals: u32,
}

/// Normalised flyer text: the joined text plus per-line structure.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    /// Line texts joined with `\n`. Interior empty lines are kept so
    /// positions stay stable; trailing empty lines are dropped so the
    /// join splits back into the same lines.
    pub text: String,
    pub lines: Vec<TextLine>,
}

impl NormalizedText {
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.text.is_empty())
    }
}

/// Fold full-width digits and separators to ASCII.
///
/// Only characters that feed numeric parsing are folded; Japanese
/// punctuation such as ： stays as written.
pub fn fold_width(c: char) -> char {
    match c {
        '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
        '，' => ',',
        '　' => ' ',
        _ => c,
    }
}

/// Normalise raw flyer text with no emphasis metadata.
pub fn normalize(raw: &str) -> NormalizedText {
    let lines: Vec<(String, Option<f32>)> =
        raw.lines().map(|l| (l.to_string(), None)).collect();
    normalize_with_weights(&lines)
}

/// Normalise extracted lines, carrying each line's emphasis weight through.
///
/// # Algorithm
///
/// Per line:
/// 1. Fold full-width digits/separators to ASCII.
/// 2. Remove bracketed noise, listing numbers, bare noise tokens, room
///    markers, and decoration characters, repeating until nothing changes
///    (a removal must not splice a new token into existence).
/// 3. Collapse whitespace runs and trim.
///
/// Lines emptied by stripping keep their position so the per-line
/// structure stays aligned with the source. The whole pass is idempotent.
pub fn normalize_with_weights(lines: &[(String, Option<f32>)]) -> NormalizedText {
    let mut out = Vec::with_capacity(lines.len());

    for (index, (raw, weight)) in lines.iter().enumerate() {
        let mut text: String = raw.chars().map(fold_width).collect();
        let mut removals = 0u32;

        loop {
            let before = text.clone();

            for re in [&*BRACKET_NOISE, &*LISTING_NUMBER, &*NOISE, &*ROOM_MARKER] {
                removals += re.find_iter(&text).count() as u32;
                text = re.replace_all(&text, "").into_owned();
            }
            text.retain(|c| !DECORATION.contains(&c));

            if text == before {
                break;
            }
        }

        let text = WHITESPACE.replace_all(text.trim(), " ").into_owned();
        out.push(TextLine {
            text,
            weight: *weight,
            index,
            removals,
        });
    }

    // A line emptied by stripping at the end of the text would leave a
    // trailing newline that `str::lines` drops on the next pass.
    let keep = out.iter().rposition(|l| !l.text.is_empty()).map_or(0, |i| i + 1);
    let text = out[..keep]
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    NormalizedText { text, lines: out }
}
