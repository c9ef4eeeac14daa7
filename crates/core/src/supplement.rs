//! Target-side coverage and a relaxed second pass over what the main
//! mapping left unmatched on both sides.

use crate::builder::TargetIndex;
use crate::error::{ensure_unit_interval, PipelineError};
use crate::models::{Language, MappingRecord, TargetEntry};
use crate::scorer::{score_prepared, PreparedForm, ScoreOptions, Tier};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

pub const SUPPLEMENTARY_THRESHOLD: f64 = 0.6;

fn linked_ids(records: &[MappingRecord]) -> HashSet<u64> {
    records
        .iter()
        .flat_map(|r| r.candidates.iter().map(|c| c.target_id))
        .collect()
}

/// Corpus lexemes that no record lists as a candidate, by node id.
pub fn unmatched_targets<'a>(
    records: &[MappingRecord],
    index: &'a TargetIndex,
) -> Vec<&'a TargetEntry> {
    let linked = linked_ids(records);
    let mut unmatched: Vec<&TargetEntry> = index
        .iter()
        .map(|(entry, _)| entry)
        .filter(|entry| !linked.contains(&entry.id))
        .collect();
    unmatched.sort_by_key(|entry| entry.id);
    unmatched
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplementaryMatch<'a> {
    pub source_id: &'a str,
    pub raw_lemma: &'a str,
    pub score: f64,
    pub tier: Tier,
}

/// Best unmatched source for each unmatched target at `threshold`.
///
/// `records` are expected in source-id order; on equal scores the earlier
/// record wins.
pub fn find_supplementary<'a>(
    records: &'a [MappingRecord],
    index: &TargetIndex,
    threshold: f64,
    fuzzy: bool,
) -> Result<BTreeMap<u64, SupplementaryMatch<'a>>, PipelineError> {
    ensure_unit_interval("matching.supplementary_threshold", threshold)?;
    let options = ScoreOptions { fuzzy };
    let linked = linked_ids(records);
    let sources: Vec<(&MappingRecord, PreparedForm)> = records
        .iter()
        .filter(|r| !r.is_matched())
        .map(|r| (r, PreparedForm::new(&r.raw_lemma)))
        .collect();

    let mut matches = BTreeMap::new();
    for (entry, form) in index.iter().filter(|(e, _)| !linked.contains(&e.id)) {
        let mut best: Option<SupplementaryMatch<'a>> = None;
        for (record, source_form) in &sources {
            let sim = score_prepared(source_form, form, options);
            if sim.tier == Tier::None || sim.score < threshold {
                continue;
            }
            if best.as_ref().map_or(true, |b| sim.score > b.score) {
                best = Some(SupplementaryMatch {
                    source_id: &record.source_id,
                    raw_lemma: &record.raw_lemma,
                    score: sim.score,
                    tier: sim.tier,
                });
            }
        }
        if let Some(found) = best {
            matches.insert(entry.id, found);
        }
    }
    Ok(matches)
}

#[derive(Debug, Serialize)]
pub struct UnmatchedTargetView<'a> {
    pub target_id: u64,
    pub lemma: &'a str,
    pub language: Language,
    pub gloss: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct SupplementaryArtifact<'a> {
    pub total_targets: usize,
    pub linked_targets: usize,
    pub unmatched_targets: usize,
    pub unmatched: Vec<UnmatchedTargetView<'a>>,
    pub supplementary_matches: BTreeMap<u64, SupplementaryMatch<'a>>,
}

pub fn supplementary_artifact<'a>(
    records: &'a [MappingRecord],
    index: &'a TargetIndex,
    threshold: f64,
    fuzzy: bool,
) -> Result<SupplementaryArtifact<'a>, PipelineError> {
    let supplementary_matches = find_supplementary(records, index, threshold, fuzzy)?;
    let unmatched: Vec<UnmatchedTargetView<'a>> = unmatched_targets(records, index)
        .into_iter()
        .map(|t| UnmatchedTargetView {
            target_id: t.id,
            lemma: &t.raw_lemma,
            language: t.language,
            gloss: t.gloss.as_deref(),
        })
        .collect();
    Ok(SupplementaryArtifact {
        total_targets: index.len(),
        linked_targets: index.len() - unmatched.len(),
        unmatched_targets: unmatched.len(),
        unmatched,
        supplementary_matches,
    })
}
