//! Tiered similarity between two Hebrew headwords.
//!
//! Rules are tried in order and the first that applies wins:
//! exact raw equality, equal skeletons, equal skeletons once matres
//! lectionis are removed, then a Levenshtein ratio scaled below the
//! spelling-variant score.

use crate::normalizer::{normalize, remove_matres_lectionis};
use serde::{Deserialize, Serialize};

pub const EXACT_SCORE: f64 = 1.0;
pub const CONSONANTAL_SCORE: f64 = 0.9;
pub const SPELLING_VARIANT_SCORE: f64 = 0.85;
/// Upper bound of the fuzzy tier; strictly below `SPELLING_VARIANT_SCORE`.
pub const FUZZY_CEILING: f64 = 0.84;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Exact,
    Consonantal,
    SpellingVariant,
    Fuzzy,
    None,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Exact => "exact",
            Tier::Consonantal => "consonantal",
            Tier::SpellingVariant => "spelling_variant",
            Tier::Fuzzy => "fuzzy",
            Tier::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Similarity {
    pub score: f64,
    pub tier: Tier,
}

impl Similarity {
    pub const NONE: Similarity = Similarity {
        score: 0.0,
        tier: Tier::None,
    };

    fn new(score: f64, tier: Tier) -> Self {
        Self { score, tier }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreOptions {
    /// Fall back to edit distance when no stricter tier applies.
    pub fuzzy: bool,
}

impl Default for ScoreOptions {
    fn default() -> Self {
        Self { fuzzy: true }
    }
}

/// A headword with its derived forms computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedForm {
    pub raw: String,
    pub skeleton: String,
    pub reduced: String,
    len: usize,
}

impl PreparedForm {
    pub fn new(raw: &str) -> Self {
        let skeleton = normalize(raw);
        let reduced = remove_matres_lectionis(&skeleton);
        let len = skeleton.chars().count();
        Self {
            raw: raw.to_string(),
            skeleton,
            reduced,
            len,
        }
    }

    /// Skeleton length in letters.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

pub fn score(a: &str, b: &str) -> Similarity {
    score_with(a, b, ScoreOptions::default())
}

pub fn score_with(a: &str, b: &str, options: ScoreOptions) -> Similarity {
    score_prepared(&PreparedForm::new(a), &PreparedForm::new(b), options)
}

pub fn score_prepared(a: &PreparedForm, b: &PreparedForm, options: ScoreOptions) -> Similarity {
    if a.is_empty() || b.is_empty() {
        return Similarity::NONE;
    }
    if a.raw == b.raw {
        return Similarity::new(EXACT_SCORE, Tier::Exact);
    }
    if a.skeleton == b.skeleton {
        return Similarity::new(CONSONANTAL_SCORE, Tier::Consonantal);
    }
    if a.reduced == b.reduced {
        return Similarity::new(SPELLING_VARIANT_SCORE, Tier::SpellingVariant);
    }
    if !options.fuzzy {
        return Similarity::NONE;
    }

    let distance = levenshtein(&a.skeleton, &b.skeleton);
    let longest = a.len.max(b.len);
    let ratio = (1.0 - distance as f64 / longest as f64).max(0.0);
    Similarity::new(ratio * FUZZY_CEILING, Tier::Fuzzy)
}

/// Edit distance in characters, not bytes.
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        assert_eq!(score("אהב", "אהב"), Similarity::new(1.0, Tier::Exact));
        assert_eq!(score("מלך", "מלך").tier, Tier::Exact);
    }

    #[test]
    fn consonantal_match() {
        assert_eq!(score("אָהַב", "אהב"), Similarity::new(0.9, Tier::Consonantal));
        assert_eq!(score("מֶלֶךְ", "מלך").tier, Tier::Consonantal);
        assert_eq!(score("מלך", "מלכ").tier, Tier::Consonantal);
    }

    #[test]
    fn spelling_variant_match() {
        assert_eq!(
            score("דָּוִד", "דָּוִיד"),
            Similarity::new(0.85, Tier::SpellingVariant)
        );
    }

    #[test]
    fn fuzzy_stays_below_spelling_variant() {
        let sim = score("אהב", "אהד");
        assert_eq!(sim.tier, Tier::Fuzzy);
        assert!(sim.score > 0.0 && sim.score < SPELLING_VARIANT_SCORE);

        let long = score("אבגדהזחטכלמנסעפצקרשת", "אבגדהזחטכלמנסעפצקרשא");
        assert_eq!(long.tier, Tier::Fuzzy);
        assert!(long.score < SPELLING_VARIANT_SCORE);
    }

    #[test]
    fn unrelated_words_score_low() {
        let sim = score("אהב", "שנא");
        assert_eq!(sim.tier, Tier::Fuzzy);
        assert!(sim.score < 0.5);
    }

    #[test]
    fn empty_content_is_none() {
        assert_eq!(score("", ""), Similarity::NONE);
        assert_eq!(score("אהב", ""), Similarity::NONE);
        assert_eq!(score("abc", "abc"), Similarity::NONE);
    }

    #[test]
    fn fuzzy_can_be_disabled() {
        let sim = score_with("אהב", "אהד", ScoreOptions { fuzzy: false });
        assert_eq!(sim, Similarity::NONE);
    }

    #[test]
    fn rule_is_symmetric() {
        let pairs = [("אָב", "אב"), ("דוד", "דויד"), ("אהב", "אהבה"), ("שׁם", "שמים")];
        for (a, b) in pairs {
            assert_eq!(score(a, b), score(b, a));
        }
    }

    #[test]
    fn levenshtein_counts_characters() {
        assert_eq!(levenshtein("אהב", "אהב"), 0);
        assert_eq!(levenshtein("אהב", "אהד"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("אבג", "דהו"), 3);
    }
}
