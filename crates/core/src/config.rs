use crate::adapters::LemmaField;
use crate::builder::{MatchOptions, DEFAULT_THRESHOLD};
use crate::error::{ensure_unit_interval, PipelineError};
use crate::report::DEFAULT_COVERAGE_TARGET;
use crate::supplement::SUPPLEMENTARY_THRESHOLD;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub inputs: InputConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Strong's dictionary, JSON or JavaScript-wrapped JSON.
    pub strongs_path: String,
    /// Text-Fabric feature directory of the corpus; unset runs without targets.
    #[serde(default)]
    pub bhsa_path: Option<String>,
    #[serde(default)]
    pub lemma_field: LemmaField,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_true")]
    pub fuzzy: bool,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub length_window: Option<usize>,
    #[serde(default)]
    pub max_candidates: Option<usize>,
    /// Relaxed threshold for the pass over leftovers on both sides.
    #[serde(default = "default_supplementary_threshold")]
    pub supplementary_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            fuzzy: true,
            workers: None,
            length_window: None,
            max_candidates: None,
            supplementary_threshold: SUPPLEMENTARY_THRESHOLD,
        }
    }
}

impl MatchingConfig {
    pub fn options(&self) -> MatchOptions {
        MatchOptions {
            threshold: self.threshold,
            fuzzy: self.fuzzy,
            length_window: self.length_window,
            max_candidates: self.max_candidates,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_coverage_target")]
    pub coverage_target: f64,
    /// Also write the target -> source index.
    #[serde(default)]
    pub reverse_index: bool,
    /// Also write unmatched corpus lexemes and the relaxed matches.
    #[serde(default)]
    pub supplementary: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            coverage_target: DEFAULT_COVERAGE_TARGET,
            reverse_index: false,
            supplementary: false,
        }
    }
}

impl AppConfig {
    pub fn new(strongs_path: impl Into<String>) -> Self {
        Self {
            inputs: InputConfig {
                strongs_path: strongs_path.into(),
                bhsa_path: None,
                lemma_field: LemmaField::default(),
            },
            matching: MatchingConfig::default(),
            report: ReportConfig::default(),
        }
    }

    /// Rejects out-of-range settings before any work starts.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.inputs.strongs_path.trim().is_empty() {
            return Err(PipelineError::invalid("inputs.strongs_path", "must not be empty"));
        }
        self.matching.options().validate()?;
        if self.matching.workers == Some(0) {
            return Err(PipelineError::invalid("matching.workers", "must be at least 1"));
        }
        ensure_unit_interval(
            "matching.supplementary_threshold",
            self.matching.supplementary_threshold,
        )?;
        ensure_unit_interval("report.coverage_target", self.report.coverage_target)?;
        if self.report.output_dir.trim().is_empty() {
            return Err(PipelineError::invalid("report.output_dir", "must not be empty"));
        }
        Ok(())
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_true() -> bool {
    true
}

fn default_supplementary_threshold() -> f64 {
    SUPPLEMENTARY_THRESHOLD
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_coverage_target() -> f64 {
    DEFAULT_COVERAGE_TARGET
}

/// Loads `path` (or `config/default` when absent) with `LEXALIGN__*`
/// environment overrides, e.g. `LEXALIGN__MATCHING__THRESHOLD=0.8`.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("LEXALIGN")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::new("strongs.js");
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.matching.options(), MatchOptions::default());
        assert!(cfg.matching.worker_count() >= 1);
    }

    #[test]
    fn validation_names_the_offending_parameter() {
        let mut cfg = AppConfig::new("strongs.js");
        cfg.matching.threshold = -0.1;
        assert!(cfg.validate().unwrap_err().to_string().contains("matching.threshold"));

        let mut cfg = AppConfig::new("strongs.js");
        cfg.report.coverage_target = 90.0;
        assert!(cfg
            .validate()
            .unwrap_err()
            .to_string()
            .contains("report.coverage_target"));

        let mut cfg = AppConfig::new("strongs.js");
        cfg.matching.supplementary_threshold = 1.5;
        assert!(cfg
            .validate()
            .unwrap_err()
            .to_string()
            .contains("matching.supplementary_threshold"));

        let mut cfg = AppConfig::new("strongs.js");
        cfg.matching.workers = Some(0);
        assert!(cfg.validate().is_err());

        assert!(AppConfig::new(" ").validate().is_err());
    }

    #[test]
    fn loads_toml_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexalign.toml");
        fs::write(
            &path,
            r#"
            [inputs]
            strongs_path = "data/strongs-hebrew-dictionary.js"
            lemma_field = "lex_utf8"

            [matching]
            threshold = 0.8
            workers = 2
            "#,
        )
        .unwrap();
        let cfg = load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(cfg.inputs.lemma_field, LemmaField::LexUtf8);
        assert_eq!(cfg.inputs.bhsa_path, None);
        assert_eq!(cfg.matching.threshold, 0.8);
        assert!(cfg.matching.fuzzy);
        assert_eq!(cfg.matching.worker_count(), 2);
        assert_eq!(cfg.report.coverage_target, DEFAULT_COVERAGE_TARGET);
        assert_eq!(cfg.report.output_dir, ".");
        assert_eq!(cfg.matching.supplementary_threshold, SUPPLEMENTARY_THRESHOLD);
        assert!(!cfg.report.supplementary);
    }
}
