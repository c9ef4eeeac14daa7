//! Aggregate statistics and the serialized shapes of the output artifacts.

use crate::builder::TargetIndex;
use crate::models::{Confidence, Language, MappingRecord, HIGH_CONFIDENCE, MEDIUM_CONFIDENCE};
use crate::scorer::Tier;
use crate::supplement::unmatched_targets;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Write};

pub const DEFAULT_COVERAGE_TARGET: f64 = 0.9;

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";
const GLOSS_PREVIEW: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfidenceHistogram {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub none: usize,
}

impl ConfidenceHistogram {
    fn add(&mut self, confidence: Confidence) {
        match confidence {
            Confidence::High => self.high += 1,
            Confidence::Medium => self.medium += 1,
            Confidence::Low => self.low += 1,
            Confidence::None => self.none += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Fraction in `[0, 1]`.
    pub coverage: f64,
    pub coverage_target: f64,
    pub histogram: ConfidenceHistogram,
    pub ambiguous: Vec<MappingRecord>,
}

impl Report {
    pub fn coverage_met(&self) -> bool {
        self.coverage >= self.coverage_target
    }

    /// Human-readable warning when coverage falls short of the target.
    pub fn coverage_warning(&self) -> Option<String> {
        (!self.coverage_met()).then(|| {
            format!(
                "coverage {:.1}% is below target {:.1}%",
                self.coverage * 100.0,
                self.coverage_target * 100.0
            )
        })
    }
}

pub fn build_report(records: &[MappingRecord], coverage_target: f64) -> Report {
    let mut histogram = ConfidenceHistogram::default();
    for record in records {
        histogram.add(record.confidence);
    }
    let total = records.len();
    let matched = total - histogram.none;
    let coverage = if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64
    };
    Report {
        total,
        matched,
        unmatched: histogram.none,
        coverage,
        coverage_target,
        histogram,
        ambiguous: records.iter().filter(|r| r.ambiguous).cloned().collect(),
    }
}

#[derive(Debug, Serialize)]
pub struct CandidateView<'a> {
    pub target_id: u64,
    pub score: f64,
    pub tier: Tier,
    pub target_lemma: Option<&'a str>,
    pub language: Option<Language>,
}

#[derive(Debug, Serialize)]
pub struct MappingView<'a> {
    pub raw_lemma: &'a str,
    pub normalized: &'a str,
    pub candidates: Vec<CandidateView<'a>>,
    pub confidence: Confidence,
    pub ambiguous: bool,
    pub glosses: &'a [String],
}

impl<'a> MappingView<'a> {
    fn new(record: &'a MappingRecord, index: &'a TargetIndex) -> Self {
        Self {
            raw_lemma: &record.raw_lemma,
            normalized: &record.normalized_source,
            candidates: record
                .candidates
                .iter()
                .map(|c| {
                    let target = index.get(c.target_id);
                    CandidateView {
                        target_id: c.target_id,
                        score: c.score,
                        tier: c.tier,
                        target_lemma: target.map(|t| t.raw_lemma.as_str()),
                        language: target.map(|t| t.language),
                    }
                })
                .collect(),
            confidence: record.confidence,
            ambiguous: record.ambiguous,
            glosses: &record.glosses,
        }
    }
}

/// Full mapping keyed by source id, in record order.
pub fn mapping_artifact<'a>(
    records: &'a [MappingRecord],
    index: &'a TargetIndex,
) -> IndexMap<&'a str, MappingView<'a>> {
    keyed(records.iter(), index)
}

/// The subset flagged for manual review.
pub fn ambiguous_artifact<'a>(
    records: &'a [MappingRecord],
    index: &'a TargetIndex,
) -> IndexMap<&'a str, MappingView<'a>> {
    keyed(records.iter().filter(|r| r.ambiguous), index)
}

fn keyed<'a>(
    records: impl Iterator<Item = &'a MappingRecord>,
    index: &'a TargetIndex,
) -> IndexMap<&'a str, MappingView<'a>> {
    records
        .map(|r| (r.source_id.as_str(), MappingView::new(r, index)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReverseLink<'a> {
    pub source_id: &'a str,
    pub score: f64,
    pub tier: Tier,
}

/// Target id -> every source that lists it as a candidate, best first.
pub fn reverse_artifact(records: &[MappingRecord]) -> BTreeMap<u64, Vec<ReverseLink<'_>>> {
    let mut reverse: BTreeMap<u64, Vec<ReverseLink<'_>>> = BTreeMap::new();
    for record in records {
        for candidate in &record.candidates {
            reverse.entry(candidate.target_id).or_default().push(ReverseLink {
                source_id: &record.source_id,
                score: candidate.score,
                tier: candidate.tier,
            });
        }
    }
    for links in reverse.values_mut() {
        links.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| crate::models::compare_source_ids(a.source_id, b.source_id))
        });
    }
    reverse
}

/// Renders the statistics text artifact.
pub fn render_stats(
    report: &Report,
    records: &[MappingRecord],
    index: &TargetIndex,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_stats(&mut out, report, records, index)?;
    Ok(out)
}

fn write_stats(
    out: &mut String,
    report: &Report,
    records: &[MappingRecord],
    index: &TargetIndex,
) -> fmt::Result {
    let pct = |n: usize| {
        if report.total == 0 {
            0.0
        } else {
            100.0 * n as f64 / report.total as f64
        }
    };

    writeln!(out, "Strong's to BHSA Mapping Statistics")?;
    writeln!(out, "{RULE}\n")?;
    writeln!(out, "Total entries: {}", report.total)?;
    writeln!(out, "Matched entries: {} ({:.1}%)", report.matched, pct(report.matched))?;
    writeln!(
        out,
        "Unmatched entries: {} ({:.1}%)\n",
        report.unmatched,
        pct(report.unmatched)
    )?;

    writeln!(out, "Confidence levels:")?;
    writeln!(out, "  High (>= {HIGH_CONFIDENCE}): {}", report.histogram.high)?;
    writeln!(
        out,
        "  Medium ({MEDIUM_CONFIDENCE} - {HIGH_CONFIDENCE}): {}",
        report.histogram.medium
    )?;
    writeln!(out, "  Low (< {MEDIUM_CONFIDENCE}): {}", report.histogram.low)?;
    writeln!(out, "  None: {}\n", report.histogram.none)?;

    writeln!(
        out,
        "Ambiguous mappings (multiple candidates): {}",
        report.ambiguous.len()
    )?;
    writeln!(
        out,
        "Unmatched corpus lexemes: {} of {}\n",
        unmatched_targets(records, index).len(),
        index.len()
    )?;

    match report.coverage_warning() {
        Some(warning) => writeln!(out, "WARNING: {warning}")?,
        None => writeln!(
            out,
            "PASS: coverage {:.1}% meets target {:.1}%",
            report.coverage * 100.0,
            report.coverage_target * 100.0
        )?,
    }

    if report.unmatched > 0 {
        writeln!(out, "\nUnmatched entries:\n{THIN_RULE}")?;
        for record in records.iter().filter(|r| !r.is_matched()) {
            let glosses = record.glosses.join(",");
            let preview: String = glosses.chars().take(GLOSS_PREVIEW).collect();
            let ellipsis = if glosses.chars().count() > GLOSS_PREVIEW { "..." } else { "" };
            writeln!(
                out,
                "{}: {} ({preview}{ellipsis})",
                record.source_id, record.raw_lemma
            )?;
        }
    }

    if report.histogram.medium > 0 {
        writeln!(out, "\nMedium confidence matches:\n{THIN_RULE}")?;
        for record in records.iter().filter(|r| r.confidence == Confidence::Medium) {
            if let Some(best) = record.best() {
                let lemma = index
                    .get(best.target_id)
                    .map(|t| t.raw_lemma.as_str())
                    .unwrap_or("?");
                writeln!(
                    out,
                    "{}: {} -> {} (score: {}, {})",
                    record.source_id,
                    record.raw_lemma,
                    lemma,
                    best.score,
                    best.tier.as_str()
                )?;
            }
        }
    }
    Ok(())
}
