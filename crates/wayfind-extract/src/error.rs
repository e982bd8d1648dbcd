use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model {model} timed out after {secs}s")]
    Timeout { model: String, secs: u64 },

    #[error("model {model} returned HTTP {status}: {body}")]
    Status {
        model: String,
        status: u16,
        body: String,
    },

    #[error("model {model} returned no text (finish reason: {finish_reason})")]
    EmptyResponse {
        model: String,
        finish_reason: String,
    },

    #[error("failed to decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("model output failed validation: {0}")]
    Invalid(String),

    #[error("media unavailable for {url}: {reason}")]
    MediaUnavailable { url: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    pub(crate) fn media(url: &str, reason: impl Into<String>) -> Self {
        Self::MediaUnavailable {
            url: url.to_owned(),
            reason: reason.into(),
        }
    }
}
