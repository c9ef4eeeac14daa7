use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: `{parameter}` {reason}")]
    InvalidConfig {
        parameter: &'static str,
        reason: String,
    },
    #[error("mapping worker failed: {0}")]
    Worker(String),
}

impl PipelineError {
    pub fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        PipelineError::InvalidConfig {
            parameter,
            reason: reason.into(),
        }
    }
}

/// Checks that `value` lies in `[0, 1]`.
pub fn ensure_unit_interval(parameter: &'static str, value: f64) -> Result<(), PipelineError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PipelineError::invalid(
            parameter,
            format!("must be within [0, 1], got {value}"),
        ))
    }
}
