//! Hebrew text normalization: reduces a word to its consonantal skeleton.
//!
//! Vowel points, dagesh, cantillation and any other combining mark are
//! dropped, final letter forms collapse to their base letters, and every
//! character outside the 22-letter consonant block is discarded.

use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const ALEF: char = '\u{05D0}';
const TAV: char = '\u{05EA}';
const WAW: char = '\u{05D5}';
const YOD: char = '\u{05D9}';

/// Final letter form -> base form.
pub const FINAL_FORMS: [(char, char); 5] = [
    ('\u{05DA}', '\u{05DB}'), // final kaf
    ('\u{05DD}', '\u{05DE}'), // final mem
    ('\u{05DF}', '\u{05E0}'), // final nun
    ('\u{05E3}', '\u{05E4}'), // final pe
    ('\u{05E5}', '\u{05E6}'), // final tsadi
];

/// Reduces `text` to its consonantal skeleton.
///
/// Total over all input: empty or non-Hebrew text yields an empty string.
///
/// ```
/// use lexalign_core::normalizer::normalize;
///
/// assert_eq!(normalize("אָהַב"), "אהב");
/// assert_eq!(normalize("מֶלֶךְ"), "מלכ");
/// ```
pub fn normalize(text: &str) -> String {
    // NFKD splits precomposed presentation forms (e.g. U+FB2A) into
    // letter + mark so the mark filter sees them.
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(base_form)
        .filter(|c| is_consonant(*c))
        .collect()
}

pub fn normalize_all<S: AsRef<str>>(texts: &[S]) -> Vec<String> {
    texts.iter().map(|t| normalize(t.as_ref())).collect()
}

/// Best-effort removal of matres lectionis from a skeleton.
///
/// Doubled waw/yod collapse to one letter, then any waw or yod that is
/// neither the first nor the last letter is dropped. This approximates
/// plene vs. defective spelling (דויד / דוד) and will over-strip words
/// where a medial waw or yod is consonantal.
pub fn remove_matres_lectionis(text: &str) -> String {
    let mut collapsed: Vec<char> = Vec::with_capacity(text.len());
    for c in text.chars() {
        if is_mater(c) && collapsed.last() == Some(&c) {
            continue;
        }
        collapsed.push(c);
    }
    let last = collapsed.len().saturating_sub(1);
    collapsed
        .iter()
        .enumerate()
        .filter(|(i, c)| !(is_mater(**c) && *i != 0 && *i != last))
        .map(|(_, c)| *c)
        .collect()
}

pub fn base_form(c: char) -> char {
    FINAL_FORMS
        .iter()
        .find(|(final_form, _)| *final_form == c)
        .map(|(_, base)| *base)
        .unwrap_or(c)
}

pub fn is_final_form(c: char) -> bool {
    FINAL_FORMS.iter().any(|(final_form, _)| *final_form == c)
}

/// Any Hebrew letter, final forms included.
pub fn is_hebrew_letter(c: char) -> bool {
    (ALEF..=TAV).contains(&c)
}

pub fn is_consonant(c: char) -> bool {
    is_hebrew_letter(c) && !is_final_form(c)
}

pub fn is_hebrew_text(text: &str) -> bool {
    text.chars().any(is_hebrew_letter)
}

fn is_mater(c: char) -> bool {
    c == WAW || c == YOD
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HebrewStats {
    pub consonants: usize,
    pub vowel_points: usize,
    pub final_forms: usize,
    pub has_niqqud: bool,
    pub length: usize,
}

/// Character statistics of the raw (unnormalized) text.
pub fn hebrew_stats(text: &str) -> HebrewStats {
    let mut stats = HebrewStats::default();
    for c in text.chars() {
        stats.length += 1;
        if is_hebrew_letter(c) {
            stats.consonants += 1;
            if is_final_form(c) {
                stats.final_forms += 1;
            }
        }
        if is_combining_mark(c) {
            stats.vowel_points += 1;
        }
    }
    stats.has_niqqud = stats.vowel_points > 0;
    stats
}
