use thiserror::Error;
use wayfind_core::{CoreError, ExtractionParseError};
use wayfind_enrich::EnrichError;
use wayfind_extract::ExtractionError;
use wayfind_sources::SourceError;

/// Failures that reach the caller of `process_content`. Everything else is
/// logged and degraded inside the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidSource(#[from] CoreError),

    #[error(transparent)]
    ExtractionParse(#[from] ExtractionParseError),
}

impl PipelineError {
    /// Whether retrying the same URL later could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::ExtractionParse(_))
    }
}

/// Failure constructing the production collaborators from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("source fetchers: {0}")]
    Sources(#[from] SourceError),

    #[error("extraction client: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("places client: {0}")]
    Places(#[from] EnrichError),
}
