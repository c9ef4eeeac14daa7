//! Views printed by the `lexalign` subcommands.

use lexalign_core::normalizer::{self, HebrewStats};
use lexalign_core::pipeline::PipelineSummary;
use lexalign_core::scorer::{self, ScoreOptions, Tier};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct NormalizedView {
    pub input: String,
    pub normalized: String,
    pub reduced: String,
    pub hebrew: bool,
    pub stats: HebrewStats,
}

impl NormalizedView {
    pub fn new(input: &str) -> Self {
        let normalized = normalizer::normalize(input);
        Self {
            input: input.to_string(),
            reduced: normalizer::remove_matres_lectionis(&normalized),
            hebrew: normalizer::is_hebrew_text(input),
            stats: normalizer::hebrew_stats(input),
            normalized,
        }
    }

    pub fn line(&self) -> String {
        format!(
            "{}\t{}\t{}\tconsonants={} points={} finals={}",
            self.input,
            self.normalized,
            self.reduced,
            self.stats.consonants,
            self.stats.vowel_points,
            self.stats.final_forms
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonView {
    pub a: String,
    pub b: String,
    pub normalized_a: String,
    pub normalized_b: String,
    pub score: f64,
    pub tier: Tier,
}

impl ComparisonView {
    pub fn new(a: &str, b: &str, fuzzy: bool) -> Self {
        let similarity = scorer::score_with(a, b, ScoreOptions { fuzzy });
        Self {
            a: a.to_string(),
            b: b.to_string(),
            normalized_a: normalizer::normalize(a),
            normalized_b: normalizer::normalize(b),
            score: similarity.score,
            tier: similarity.tier,
        }
    }

    pub fn line(&self) -> String {
        format!(
            "{} ~ {}: {:.3} ({})",
            self.normalized_a,
            self.normalized_b,
            self.score,
            self.tier.as_str()
        )
    }
}

pub fn summary_line(summary: &PipelineSummary) -> String {
    let mut line = format!(
        "build: {} entries, matched {}, unmatched {}, ambiguous {}, coverage {:.1}%",
        summary.total,
        summary.matched,
        summary.unmatched,
        summary.ambiguous,
        summary.coverage * 100.0
    );
    if summary.degraded {
        line.push_str(" (no target lexicon)");
    } else {
        line.push_str(&format!(
            ", {} of {} corpus lexemes unlinked",
            summary.unmatched_targets, summary.targets
        ));
    }
    line
}

pub fn summary_json(summary: &PipelineSummary) -> serde_json::Value {
    serde_json::json!({
        "status": if summary.coverage_met { "ok" } else { "below_target" },
        "summary": summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_view_strips_points_and_matres() {
        let view = NormalizedView::new("דָּוִיד");
        assert_eq!(view.normalized, "דויד");
        assert_eq!(view.reduced, "דד");
        assert!(view.hebrew);
        assert!(view.stats.has_niqqud);
        assert_eq!(view.stats.consonants, 4);
        assert_eq!(view.line(), "דָּוִיד\tדויד\tדד\tconsonants=4 points=3 finals=0");
    }

    #[test]
    fn comparison_view_reports_tier() {
        let view = ComparisonView::new("אָב", "אב", true);
        assert_eq!(view.tier, Tier::Consonantal);
        assert_eq!(view.line(), "אב ~ אב: 0.900 (consonantal)");
    }

    #[test]
    fn summary_line_flags_degraded_runs() {
        let summary = PipelineSummary {
            total: 4,
            unmatched: 4,
            degraded: true,
            ..Default::default()
        };
        let line = summary_line(&summary);
        assert!(line.contains("4 entries"));
        assert!(line.contains("coverage 0.0%"));
        assert!(line.ends_with("(no target lexicon)"));
        assert_eq!(summary_json(&summary)["status"], "below_target");

        let linked = PipelineSummary {
            total: 4,
            matched: 4,
            coverage: 1.0,
            targets: 5,
            unmatched_targets: 1,
            ..Default::default()
        };
        assert!(summary_line(&linked).ends_with("1 of 5 corpus lexemes unlinked"));
    }
}
