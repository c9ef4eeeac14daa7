//! Builds the source -> target mapping by scoring every pair.
//!
//! Target forms are normalized once into a read-only [`TargetIndex`]; each
//! source entry is then scored against the whole index independently, so
//! entries can be spread across blocking worker tasks sharing the index.

use crate::error::{ensure_unit_interval, PipelineError};
use crate::models::{
    compare_source_ids, rank_candidates, MappingRecord, MatchCandidate, SourceEntry, TargetEntry,
};
use crate::scorer::{score_prepared, PreparedForm, ScoreOptions, Tier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info};

pub const DEFAULT_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOptions {
    pub threshold: f64,
    pub fuzzy: bool,
    /// Only compare skeletons whose lengths differ by at most this much.
    pub length_window: Option<usize>,
    pub max_candidates: Option<usize>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            fuzzy: true,
            length_window: None,
            max_candidates: None,
        }
    }
}

impl MatchOptions {
    pub fn validate(&self) -> Result<(), PipelineError> {
        ensure_unit_interval("matching.threshold", self.threshold)?;
        if self.max_candidates == Some(0) {
            return Err(PipelineError::invalid(
                "matching.max_candidates",
                "must be at least 1 when set",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct IndexedTarget {
    entry: TargetEntry,
    form: PreparedForm,
}

/// Target entries with their normalized forms precomputed.
#[derive(Debug, Clone, Default)]
pub struct TargetIndex {
    targets: Vec<IndexedTarget>,
    by_id: HashMap<u64, usize>,
}

impl TargetIndex {
    pub fn new(entries: Vec<TargetEntry>) -> Self {
        let targets: Vec<IndexedTarget> = entries
            .into_iter()
            .map(|entry| IndexedTarget {
                form: PreparedForm::new(&entry.raw_lemma),
                entry,
            })
            .collect();
        let by_id = targets
            .iter()
            .enumerate()
            .map(|(i, t)| (t.entry.id, i))
            .collect();
        Self { targets, by_id }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Entries with their prepared forms, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&TargetEntry, &PreparedForm)> + '_ {
        self.targets.iter().map(|t| (&t.entry, &t.form))
    }

    pub fn get(&self, id: u64) -> Option<&TargetEntry> {
        self.by_id.get(&id).map(|&i| &self.targets[i].entry)
    }
}

/// Maps every source entry against `targets`.
///
/// Options are validated before any comparison. An empty target list is
/// not an error: every record comes back with no candidates.
pub fn build_mapping(
    sources: &[SourceEntry],
    targets: &[TargetEntry],
    options: &MatchOptions,
) -> Result<Vec<MappingRecord>, PipelineError> {
    options.validate()?;
    let index = TargetIndex::new(targets.to_vec());
    Ok(build_with_index(sources, &index, options))
}

pub fn build_with_index(
    sources: &[SourceEntry],
    index: &TargetIndex,
    options: &MatchOptions,
) -> Vec<MappingRecord> {
    let mut records: Vec<MappingRecord> =
        sources.iter().map(|s| map_entry(s, index, options)).collect();
    sort_records(&mut records);
    records
}

/// Same result as [`build_mapping`], computed on `workers` blocking tasks.
pub async fn build_mapping_parallel(
    sources: &[SourceEntry],
    index: Arc<TargetIndex>,
    options: &MatchOptions,
    workers: usize,
) -> Result<Vec<MappingRecord>, PipelineError> {
    options.validate()?;
    if workers == 0 {
        return Err(PipelineError::invalid("matching.workers", "must be at least 1"));
    }
    let chunk_size = sources.len().div_ceil(workers).max(1);
    info!(
        "Scoring {} entries against {} targets on {} workers",
        sources.len(),
        index.len(),
        workers.min(sources.len().max(1))
    );

    let handles: Vec<_> = sources
        .chunks(chunk_size)
        .map(|chunk| {
            let chunk = chunk.to_vec();
            let index = Arc::clone(&index);
            let options = options.clone();
            task::spawn_blocking(move || {
                chunk
                    .iter()
                    .map(|s| map_entry(s, &index, &options))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut records = Vec::with_capacity(sources.len());
    for handle in handles {
        let part = handle
            .await
            .map_err(|e| PipelineError::Worker(e.to_string()))?;
        debug!("Worker finished {} entries", part.len());
        records.extend(part);
    }
    sort_records(&mut records);
    Ok(records)
}

/// Scores one source entry against the index.
pub fn map_entry(source: &SourceEntry, index: &TargetIndex, options: &MatchOptions) -> MappingRecord {
    let form = PreparedForm::new(&source.raw_lemma);
    let score_options = ScoreOptions {
        fuzzy: options.fuzzy,
    };

    let mut candidates: Vec<MatchCandidate> = index
        .targets
        .iter()
        .filter(|t| within_window(&form, &t.form, options.length_window))
        .filter_map(|t| {
            let sim = score_prepared(&form, &t.form, score_options);
            (sim.tier != Tier::None && sim.score >= options.threshold).then_some(MatchCandidate {
                target_id: t.entry.id,
                score: sim.score,
                tier: sim.tier,
            })
        })
        .collect();

    rank_candidates(&mut candidates);
    let mut record = MappingRecord::new(source, form.skeleton, candidates);
    if let Some(max) = options.max_candidates {
        record.limit_candidates(max);
    }
    record
}

fn within_window(a: &PreparedForm, b: &PreparedForm, window: Option<usize>) -> bool {
    window.map_or(true, |w| a.len().abs_diff(b.len()) <= w)
}

fn sort_records(records: &mut [MappingRecord]) {
    records.sort_by(|a, b| compare_source_ids(&a.source_id, &b.source_id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Confidence, Language};

    fn source(id: &str, lemma: &str) -> SourceEntry {
        SourceEntry {
            id: id.into(),
            raw_lemma: lemma.into(),
            glosses: Vec::new(),
        }
    }

    fn target(id: u64, lemma: &str) -> TargetEntry {
        TargetEntry {
            id,
            raw_lemma: lemma.into(),
            language: Language::Hebrew,
            gloss: None,
        }
    }

    fn fixture() -> (Vec<SourceEntry>, Vec<TargetEntry>) {
        let sources = vec![
            source("H10", "אָהַב"),
            source("H1", "אָב"),
            source("H1732", "דָּוִד"),
            source("H2", "שָׁלוֹם"),
            source("H3", "אבגדהזחט"),
        ];
        let targets = vec![
            target(123, "אב"),
            target(200, "אהב"),
            target(201, "אָהַב"),
            target(300, "דָּוִיד"),
            target(400, "אבגדהזחא"),
            target(500, "שלם"),
            target(501, "שָׁלֹם"),
        ];
        (sources, targets)
    }

    #[test]
    fn consonantal_scenario() {
        let records = build_mapping(
            &[source("H1", "אָב")],
            &[target(123, "אב")],
            &MatchOptions::default(),
        )
        .unwrap();
        let record = &records[0];
        assert_eq!(record.normalized_source, "אב");
        assert_eq!(record.candidates.len(), 1);
        assert_eq!(record.candidates[0].target_id, 123);
        assert_eq!(record.candidates[0].tier, Tier::Consonantal);
        assert_eq!(record.candidates[0].score, 0.9);
        assert_eq!(record.confidence, Confidence::Medium);
        assert!(!record.ambiguous);
    }

    #[test]
    fn records_come_back_in_source_order() {
        let (sources, targets) = fixture();
        let records = build_mapping(&sources, &targets, &MatchOptions::default()).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.source_id.as_str()).collect();
        assert_eq!(ids, vec!["H1", "H2", "H3", "H10", "H1732"]);
    }

    #[test]
    fn never_keeps_candidates_below_threshold() {
        let (sources, targets) = fixture();
        for threshold in [0.0, 0.5, 0.7, 0.86, 0.95, 1.0] {
            let options = MatchOptions {
                threshold,
                ..MatchOptions::default()
            };
            for record in build_mapping(&sources, &targets, &options).unwrap() {
                assert!(record.candidates.iter().all(|c| c.score >= threshold));
                assert_eq!(record.ambiguous, record.candidates.len() >= 2);
            }
        }
    }

    #[test]
    fn ranks_and_flags_ambiguity() {
        let (sources, targets) = fixture();
        let records = build_mapping(&sources, &targets, &MatchOptions::default()).unwrap();
        let ahav = records.iter().find(|r| r.source_id == "H10").unwrap();
        let ids: Vec<u64> = ahav.candidates.iter().map(|c| c.target_id).collect();
        assert_eq!(ids, vec![201, 200]);
        assert_eq!(ahav.candidates[0].tier, Tier::Exact);
        assert_eq!(ahav.confidence, Confidence::High);
        assert!(ahav.ambiguous);

        let david = records.iter().find(|r| r.source_id == "H1732").unwrap();
        assert_eq!(david.candidates[0].tier, Tier::SpellingVariant);
        assert_eq!(david.confidence, Confidence::Medium);

        let shalom = records.iter().find(|r| r.source_id == "H2").unwrap();
        assert_eq!(shalom.candidates.len(), 2);
        assert!(shalom
            .candidates
            .iter()
            .all(|c| c.tier == Tier::SpellingVariant));
    }

    #[test]
    fn fuzzy_matches_land_in_low_bucket() {
        let (sources, targets) = fixture();
        let records = build_mapping(&sources, &targets, &MatchOptions::default()).unwrap();
        let long = records.iter().find(|r| r.source_id == "H3").unwrap();
        assert_eq!(long.candidates.len(), 1);
        assert_eq!(long.candidates[0].tier, Tier::Fuzzy);
        assert!(long.candidates[0].score < 0.85);
        assert_eq!(long.confidence, Confidence::Low);
    }

    #[test]
    fn empty_targets_degrade_to_unmatched() {
        let (sources, _) = fixture();
        let records = build_mapping(&sources, &[], &MatchOptions::default()).unwrap();
        assert_eq!(records.len(), sources.len());
        assert!(records
            .iter()
            .all(|r| r.candidates.is_empty() && r.confidence == Confidence::None));
    }

    #[test]
    fn rejects_invalid_threshold() {
        let options = MatchOptions {
            threshold: 1.5,
            ..MatchOptions::default()
        };
        let err = build_mapping(&[], &[], &options).unwrap_err();
        assert!(err.to_string().contains("matching.threshold"));

        let nan = MatchOptions {
            threshold: f64::NAN,
            ..MatchOptions::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn length_window_and_cap_prune_candidates() {
        let (sources, targets) = fixture();
        let options = MatchOptions {
            max_candidates: Some(1),
            ..MatchOptions::default()
        };
        let records = build_mapping(&sources, &targets, &options).unwrap();
        assert!(records.iter().all(|r| r.candidates.len() <= 1));
        let ahav = records.iter().find(|r| r.source_id == "H10").unwrap();
        assert_eq!(ahav.candidates[0].target_id, 201);
        assert!(ahav.ambiguous);

        let windowed = MatchOptions {
            length_window: Some(0),
            ..MatchOptions::default()
        };
        let records = build_mapping(&[source("H1", "אָב")], &targets, &windowed).unwrap();
        assert_eq!(records[0].candidates.len(), 1);
    }

    #[test]
    fn capped_records_stay_ambiguous() {
        let targets = vec![target(6, "מֶלֶךְ"), target(7, "מָלֵךְ"), target(8, "מלך")];
        let sources = [source("H4428", "מֶלֶךְ")];
        let uncapped = build_mapping(&sources, &targets, &MatchOptions::default()).unwrap();
        assert_eq!(uncapped[0].candidates.len(), 3);
        assert!(uncapped[0].ambiguous);

        let options = MatchOptions {
            max_candidates: Some(1),
            ..MatchOptions::default()
        };
        let capped = build_mapping(&sources, &targets, &options).unwrap();
        assert_eq!(capped[0].candidates.len(), 1);
        assert_eq!(capped[0].candidates[0].target_id, 6);
        assert_eq!(capped[0].confidence, Confidence::High);
        assert!(capped[0].ambiguous);
    }

    #[tokio::test]
    async fn parallel_matches_sequential() {
        let (sources, targets) = fixture();
        let options = MatchOptions::default();
        let sequential = build_mapping(&sources, &targets, &options).unwrap();
        let index = Arc::new(TargetIndex::new(targets));
        for workers in [1, 2, 3, 8] {
            let parallel = build_mapping_parallel(&sources, Arc::clone(&index), &options, workers)
                .await
                .unwrap();
            assert_eq!(
                serde_json::to_string(&parallel).unwrap(),
                serde_json::to_string(&sequential).unwrap()
            );
        }
    }

    #[tokio::test]
    async fn parallel_rejects_zero_workers() {
        let index = Arc::new(TargetIndex::default());
        let err = build_mapping_parallel(&[], index, &MatchOptions::default(), 0)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("matching.workers"));
    }

    #[test]
    fn index_lookup() {
        let index = TargetIndex::new(vec![target(5, "מֶלֶךְ")]);
        assert_eq!(index.get(5).map(|t| t.raw_lemma.as_str()), Some("מֶלֶךְ"));
        assert!(index.get(6).is_none());
    }
}
