//! Conversion from each lexicon's native record shape to the generic entries.
//!
//! This is the only module that knows native field names. Malformed records
//! are logged and skipped by the batch helpers; they never fail a run.

use crate::models::{Language, SourceEntry, TargetEntry};
use crate::normalizer::is_hebrew_text;
use providers::{LexemeRecord, StrongsRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Headword fields of a Strong's entry, in lookup order.
pub const SOURCE_LEMMA_FIELDS: &[&str] = &["lemma", "hebrew", "word", "text"];
pub const SOURCE_GLOSS_FIELD: &str = "kjv_def";

const LEX_UTF8: &str = "lex_utf8";
const VOC_LEX_UTF8: &str = "voc_lex_utf8";
const LANGUAGE: &str = "language";
const GLOSS: &str = "gloss";

/// Corpus features the target adapter reads.
pub const TARGET_FEATURES: &[&str] = &[LEX_UTF8, VOC_LEX_UTF8, LANGUAGE, GLOSS];

const GLOSS_MARKERS: &[char] = &['X', '+', '×'];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdapterError {
    #[error("source record {id}: entry is not an object")]
    NotAnObject { id: String },
    #[error("source record {id}: no Hebrew headword")]
    MissingSourceLemma { id: String },
    #[error("lexeme node {node}: no Hebrew headword")]
    MissingTargetLemma { node: u64 },
    #[error("lexeme node {node}: unknown language {value:?}")]
    UnknownLanguage { node: u64, value: String },
}

/// Which corpus text feature supplies the target headword.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LemmaField {
    #[default]
    VocLexUtf8,
    LexUtf8,
}

impl LemmaField {
    pub fn feature(&self) -> &'static str {
        match self {
            LemmaField::VocLexUtf8 => VOC_LEX_UTF8,
            LemmaField::LexUtf8 => LEX_UTF8,
        }
    }

    fn fallback(&self) -> LemmaField {
        match self {
            LemmaField::VocLexUtf8 => LemmaField::LexUtf8,
            LemmaField::LexUtf8 => LemmaField::VocLexUtf8,
        }
    }
}

pub fn extract_source(record: &StrongsRecord) -> Result<SourceEntry, AdapterError> {
    let fields = record
        .value
        .as_object()
        .ok_or_else(|| AdapterError::NotAnObject {
            id: record.id.clone(),
        })?;

    let raw_lemma = SOURCE_LEMMA_FIELDS
        .iter()
        .filter_map(|f| fields.get(*f).and_then(|v| v.as_str()))
        .find(|s| is_hebrew_text(s))
        .ok_or_else(|| AdapterError::MissingSourceLemma {
            id: record.id.clone(),
        })?;

    let glosses = fields
        .get(SOURCE_GLOSS_FIELD)
        .and_then(|v| v.as_str())
        .map(clean_glosses)
        .unwrap_or_default();

    Ok(SourceEntry {
        id: record.id.clone(),
        raw_lemma: raw_lemma.trim().to_string(),
        glosses,
    })
}

pub fn extract_target(
    record: &LexemeRecord,
    preferred: LemmaField,
) -> Result<TargetEntry, AdapterError> {
    let raw_lemma = [preferred, preferred.fallback()]
        .iter()
        .filter_map(|f| record.feature(f.feature()))
        .find(|s| is_hebrew_text(s))
        .ok_or(AdapterError::MissingTargetLemma { node: record.node })?;

    let language = match record.feature(LANGUAGE).map(str::trim) {
        None | Some("") => Language::Hebrew,
        Some(value) => parse_language(value).ok_or_else(|| AdapterError::UnknownLanguage {
            node: record.node,
            value: value.to_string(),
        })?,
    };

    let gloss = record
        .feature(GLOSS)
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string);

    Ok(TargetEntry {
        id: record.node,
        raw_lemma: raw_lemma.trim().to_string(),
        language,
        gloss,
    })
}

fn parse_language(value: &str) -> Option<Language> {
    match value.to_lowercase().as_str() {
        "hebrew" | "hbo" => Some(Language::Hebrew),
        "aramaic" | "arc" => Some(Language::Aramaic),
        _ => None,
    }
}

/// Splits a free-text KJV definition into short normalized glosses.
///
/// ```
/// use lexalign_core::adapters::clean_glosses;
///
/// assert_eq!(
///     clean_glosses("chief, (fore-)father(-less), X patrimony, principal."),
///     vec!["chief", "father", "patrimony", "principal"]
/// );
/// ```
pub fn clean_glosses(raw: &str) -> Vec<String> {
    let unmarked: String = strip_enclosed(raw, '[', ']')
        .chars()
        .filter(|c| !GLOSS_MARKERS.contains(c))
        .collect();

    unmarked
        .split(',')
        .map(|part| {
            let lowered = strip_enclosed(part, '(', ')').trim().to_lowercase();
            lowered
                .chars()
                .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
                .collect::<String>()
                .trim()
                .to_string()
        })
        .filter(|g| g.chars().count() > 1)
        .collect()
}

fn strip_enclosed(text: &str, open: char, close: char) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == open {
            depth += 1;
        } else if c == close && depth > 0 {
            depth -= 1;
        } else if depth == 0 {
            out.push(c);
        }
    }
    out
}

/// Entries that converted cleanly plus the number of records skipped.
#[derive(Debug, Clone)]
pub struct Extracted<T> {
    pub entries: Vec<T>,
    pub skipped: usize,
}

pub fn extract_sources(records: &[StrongsRecord]) -> Extracted<SourceEntry> {
    collect(records.iter().map(extract_source))
}

pub fn extract_targets(records: &[LexemeRecord], preferred: LemmaField) -> Extracted<TargetEntry> {
    collect(records.iter().map(|r| extract_target(r, preferred)))
}

fn collect<T>(results: impl Iterator<Item = Result<T, AdapterError>>) -> Extracted<T> {
    let mut entries = Vec::new();
    let mut skipped = 0;
    for result in results {
        match result {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!("Skipping malformed record: {e}");
                skipped += 1;
            }
        }
    }
    Extracted { entries, skipped }
}
