//! Strong's Hebrew dictionary reader.
//!
//! Accepts plain JSON or the JavaScript distribution of the dictionary,
//! where the object is assigned to a variable
//! (`var strongsHebrewDictionary = {...};`).

use crate::{ProviderError, SourceLexicon, StrongsRecord};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct StrongsFileProvider {
    path: PathBuf,
}

impl StrongsFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl SourceLexicon for StrongsFileProvider {
    async fn load(&self) -> Result<Vec<StrongsRecord>, ProviderError> {
        if !self.path.exists() {
            return Err(ProviderError::Unavailable(format!(
                "Strong's dictionary not found at {}",
                self.path.display()
            )));
        }
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ProviderError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        let records = parse_dictionary(&content)?;
        debug!(
            "Parsed {} Strong's records from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }
}

/// Parses the dictionary object into records, one per top-level key.
pub fn parse_dictionary(content: &str) -> Result<Vec<StrongsRecord>, ProviderError> {
    let json = extract_object(content)?;
    let map: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(json).map_err(|e| ProviderError::Parse(e.to_string()))?;
    Ok(map
        .into_iter()
        .map(|(id, value)| StrongsRecord { id, value })
        .collect())
}

fn extract_object(content: &str) -> Result<&str, ProviderError> {
    let trimmed = content.trim();
    if trimmed.starts_with('{') {
        return Ok(trimmed);
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&trimmed[start..=end]),
        _ => Err(ProviderError::Parse(
            "no JSON object found in dictionary file".into(),
        )),
    }
}
