use thiserror::Error;
use wayfind_core::ProviderError;

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("places API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<EnrichError> for ProviderError {
    fn from(err: EnrichError) -> Self {
        match err {
            EnrichError::Http(e) => ProviderError::Request(e.to_string()),
            EnrichError::Status { status, .. } => ProviderError::Status { status },
            EnrichError::Decode { context, source } => {
                ProviderError::Decode(format!("{context}: {source}"))
            }
        }
    }
}
