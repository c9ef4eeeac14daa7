//! Lexicon providers: the raw record sources the alignment pipeline consumes.
//!
//! Providers only read and decode files. They do not interpret fields; that
//! is left to the adapters in the core crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub mod noop;
pub mod strongs;
pub mod textfabric;

pub use noop::NoopTargetLexicon;
pub use strongs::StrongsFileProvider;
pub use textfabric::TextFabricProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("lexicon unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error: {0}")]
    Parse(String),
}

/// One entry of the Strong's dictionary, keyed by its Strong's number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrongsRecord {
    pub id: String,
    pub value: serde_json::Value,
}

/// One lexeme node of a Text-Fabric corpus with the feature values it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexemeRecord {
    pub node: u64,
    pub features: BTreeMap<String, String>,
}

impl LexemeRecord {
    pub fn feature(&self, name: &str) -> Option<&str> {
        self.features.get(name).map(String::as_str)
    }
}

#[async_trait::async_trait]
pub trait SourceLexicon: Send + Sync {
    async fn load(&self) -> Result<Vec<StrongsRecord>, ProviderError>;
}

#[async_trait::async_trait]
pub trait TargetLexicon: Send + Sync {
    fn name(&self) -> &str;
    async fn load(&self) -> Result<Vec<LexemeRecord>, ProviderError>;
}
