use crate::{LexemeRecord, ProviderError, TargetLexicon};

/// Target lexicon used when no corpus is configured. Yields no lexemes.
#[derive(Debug, Default)]
pub struct NoopTargetLexicon;

#[async_trait::async_trait]
impl TargetLexicon for NoopTargetLexicon {
    fn name(&self) -> &str {
        "noop"
    }

    async fn load(&self) -> Result<Vec<LexemeRecord>, ProviderError> {
        Ok(Vec::new())
    }
}
