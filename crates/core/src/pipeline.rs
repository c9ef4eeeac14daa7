use crate::adapters;
use crate::builder::{self, TargetIndex};
use crate::config::AppConfig;
use crate::report;
use crate::supplement;
use anyhow::Context;
use providers::{NoopTargetLexicon, SourceLexicon, StrongsFileProvider, TargetLexicon, TextFabricProvider};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use storage::{
    ArtifactWriter, AMBIGUOUS_FILE, MAPPING_FILE, REVERSE_FILE, STATS_FILE, SUPPLEMENTARY_FILE,
};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub ambiguous: usize,
    pub coverage: f64,
    pub coverage_met: bool,
    pub coverage_warning: Option<String>,
    pub targets: usize,
    /// Corpus lexemes no source entry links to.
    pub unmatched_targets: usize,
    /// Relaxed matches found for those lexemes, when the pass ran.
    pub supplementary_matches: usize,
    pub skipped_sources: usize,
    pub skipped_targets: usize,
    /// True when the run had no target lexicon to compare against.
    pub degraded: bool,
    pub artifacts: Vec<PathBuf>,
}

/// Runs the whole alignment with the providers named in `config`.
pub async fn run(config: AppConfig) -> anyhow::Result<PipelineSummary> {
    config.validate()?;
    let sources = StrongsFileProvider::new(&config.inputs.strongs_path);
    let targets = build_target_provider(&config);
    run_with_providers(&config, &sources, targets.as_ref()).await
}

pub async fn run_with_providers(
    config: &AppConfig,
    sources: &dyn SourceLexicon,
    targets: &dyn TargetLexicon,
) -> anyhow::Result<PipelineSummary> {
    config.validate()?;
    let options = config.matching.options();

    info!("Loading source lexicon...");
    let source_records = sources.load().await.context("load source lexicon")?;
    let sources = adapters::extract_sources(&source_records);
    info!(
        "Loaded {} source entries ({} skipped)",
        sources.entries.len(),
        sources.skipped
    );

    info!("Loading target lexicon from {}...", targets.name());
    let (target_entries, skipped_targets) = match targets.load().await {
        Ok(records) => {
            let extracted = adapters::extract_targets(&records, config.inputs.lemma_field);
            (extracted.entries, extracted.skipped)
        }
        Err(e) => {
            warn!("Target lexicon unavailable: {e}");
            (Vec::new(), 0)
        }
    };
    let degraded = target_entries.is_empty();
    if degraded {
        warn!("No target entries; continuing in degraded mode, every entry will be unmatched.");
    } else {
        info!(
            "Loaded {} target entries ({} skipped)",
            target_entries.len(),
            skipped_targets
        );
    }

    let index = Arc::new(TargetIndex::new(target_entries));
    let records = builder::build_mapping_parallel(
        &sources.entries,
        Arc::clone(&index),
        &options,
        config.matching.worker_count(),
    )
    .await?;
    info!("Mapping complete for {} entries", records.len());

    let summary_report = report::build_report(&records, config.report.coverage_target);
    if let Some(warning) = summary_report.coverage_warning() {
        warn!("{warning}");
    }

    let writer = ArtifactWriter::new(&config.report.output_dir).context("prepare output dir")?;
    let mut artifacts = vec![
        writer
            .write_json(MAPPING_FILE, &report::mapping_artifact(&records, &index))
            .context("write full mapping")?,
        writer
            .write_json(AMBIGUOUS_FILE, &report::ambiguous_artifact(&records, &index))
            .context("write ambiguous mappings")?,
        writer
            .write_text(
                STATS_FILE,
                &report::render_stats(&summary_report, &records, &index)
                    .context("render statistics")?,
            )
            .context("write statistics")?,
    ];
    if config.report.reverse_index {
        artifacts.push(
            writer
                .write_json(REVERSE_FILE, &report::reverse_artifact(&records))
                .context("write reverse index")?,
        );
    }
    let unmatched_targets = supplement::unmatched_targets(&records, &index).len();
    let mut supplementary_matches = 0;
    if config.report.supplementary {
        let artifact = supplement::supplementary_artifact(
            &records,
            &index,
            config.matching.supplementary_threshold,
            config.matching.fuzzy,
        )?;
        supplementary_matches = artifact.supplementary_matches.len();
        info!(
            "Supplementary pass: {} of {} unmatched lexemes paired",
            supplementary_matches, unmatched_targets
        );
        artifacts.push(
            writer
                .write_json(SUPPLEMENTARY_FILE, &artifact)
                .context("write supplementary mapping")?,
        );
    }
    for path in &artifacts {
        info!("Created {}", path.display());
    }

    Ok(PipelineSummary {
        total: summary_report.total,
        matched: summary_report.matched,
        unmatched: summary_report.unmatched,
        ambiguous: summary_report.ambiguous.len(),
        coverage: summary_report.coverage,
        coverage_met: summary_report.coverage_met(),
        coverage_warning: summary_report.coverage_warning(),
        targets: index.len(),
        unmatched_targets,
        supplementary_matches,
        skipped_sources: sources.skipped,
        skipped_targets,
        degraded,
        artifacts,
    })
}

pub fn build_target_provider(config: &AppConfig) -> Box<dyn TargetLexicon> {
    match &config.inputs.bhsa_path {
        Some(path) => Box::new(TextFabricProvider::new(path, adapters::TARGET_FEATURES)),
        None => Box::new(NoopTargetLexicon),
    }
}
