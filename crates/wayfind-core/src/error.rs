use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    /// The URL does not resolve to a recognizable platform reference.
    #[error("invalid source URL \"{url}\": {reason}")]
    InvalidSource { url: String, reason: String },
}

impl CoreError {
    pub fn invalid_source(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSource {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Model output could not be turned into an extraction result, even after the
/// fallback model was tried.
#[derive(Debug, Error)]
#[error("extraction failed after {attempts} attempt(s): {reason}")]
pub struct ExtractionParseError {
    pub attempts: u32,
    pub reason: String,
}

/// Failure of a single place-data provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("place provider call timed out after {0}s")]
    Timeout(u64),

    #[error("place provider request failed: {0}")]
    Request(String),

    #[error("place provider returned HTTP {status}")]
    Status { status: u16 },

    #[error("place provider response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache serialization error for {context}: {source}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
