use crate::scorer::Tier;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const HIGH_CONFIDENCE: f64 = 0.95;
pub const MEDIUM_CONFIDENCE: f64 = 0.85;

/// A Strong's headword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub id: String,
    pub raw_lemma: String,
    pub glosses: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Hebrew,
    Aramaic,
}

/// A corpus lexeme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEntry {
    pub id: u64,
    pub raw_lemma: String,
    pub language: Language,
    pub gloss: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub target_id: u64,
    pub score: f64,
    pub tier: Tier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
    None,
}

impl Confidence {
    pub fn from_best_score(best: Option<f64>) -> Self {
        match best {
            None => Confidence::None,
            Some(s) if s >= HIGH_CONFIDENCE => Confidence::High,
            Some(s) if s >= MEDIUM_CONFIDENCE => Confidence::Medium,
            Some(_) => Confidence::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRecord {
    pub source_id: String,
    pub raw_lemma: String,
    pub normalized_source: String,
    pub candidates: Vec<MatchCandidate>,
    pub confidence: Confidence,
    pub ambiguous: bool,
    pub glosses: Vec<String>,
}

impl MappingRecord {
    /// `candidates` must already be ranked best first.
    pub fn new(source: &SourceEntry, normalized: String, candidates: Vec<MatchCandidate>) -> Self {
        let confidence = Confidence::from_best_score(candidates.first().map(|c| c.score));
        Self {
            source_id: source.id.clone(),
            raw_lemma: source.raw_lemma.clone(),
            normalized_source: normalized,
            ambiguous: candidates.len() >= 2,
            candidates,
            confidence,
            glosses: source.glosses.clone(),
        }
    }

    /// Keeps only the best `max` candidates. `ambiguous` still reflects every
    /// candidate that passed the threshold.
    pub fn limit_candidates(&mut self, max: usize) {
        self.candidates.truncate(max);
    }

    pub fn best(&self) -> Option<&MatchCandidate> {
        self.candidates.first()
    }

    pub fn is_matched(&self) -> bool {
        self.confidence != Confidence::None
    }
}

/// Score descending, then target id ascending.
pub fn rank_candidates(candidates: &mut [MatchCandidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.target_id.cmp(&b.target_id))
    });
}

/// Natural ordering of source ids: "H2" sorts before "H10".
pub fn compare_source_ids(a: &str, b: &str) -> Ordering {
    split_id(a).cmp(&split_id(b)).then_with(|| a.cmp(b))
}

fn split_id(id: &str) -> (&str, Option<u64>, &str) {
    let start = id.find(|c: char| c.is_ascii_digit()).unwrap_or(id.len());
    let end = id[start..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| start + i)
        .unwrap_or(id.len());
    (&id[..start], id[start..end].parse().ok(), &id[end..])
}
