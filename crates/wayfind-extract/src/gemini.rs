//! Minimal client for the Gemini `generateContent` REST endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// One element of a request turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    InlineData(Blob),
    FileData(FileRef),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub file_uri: String,
}

#[derive(Debug, Clone, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: &'a [Part],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_json_schema: &'a serde_json::Value,
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

/// A structured-output request: system prompt, user parts, response schema.
#[derive(Debug, Clone)]
pub struct StructuredPrompt {
    pub system: String,
    pub parts: Vec<Part>,
    pub schema: serde_json::Value,
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout_secs: u64,
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns [`ExtractionError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, ExtractionError> {
        Self::with_base_url(api_key, timeout_secs, GEMINI_API_URL)
    }

    /// Same as [`GeminiClient::new`] against an alternate API root (tests).
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ExtractionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout_secs,
        })
    }

    /// Run one structured-output call and return the raw model text.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Timeout`], [`ExtractionError::Status`],
    /// [`ExtractionError::EmptyResponse`], or a transport/decode error.
    pub async fn generate(
        &self,
        model: &str,
        prompt: &StructuredPrompt,
    ) -> Result<String, ExtractionError> {
        let url = format!("{}/models/{model}:generateContent", self.base_url);
        let system_parts = [Part::Text(prompt.system.clone())];
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: &system_parts,
            },
            contents: [Content {
                role: Some("user"),
                parts: &prompt.parts,
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_json_schema: &prompt.schema,
                temperature: 0.2,
            },
        };

        tracing::debug!(model, parts = prompt.parts.len(), "gemini request");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(model, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Status {
                model: model.to_owned(),
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(model, e))?;
        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|source| ExtractionError::Decode {
                context: format!("{model} response envelope"),
                source,
            })?;

        let candidate = parsed.candidates.into_iter().next();
        let finish_reason = candidate
            .as_ref()
            .and_then(|c| c.finish_reason.clone())
            .unwrap_or_else(|| "NONE".to_owned());
        let text: String = candidate
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyResponse {
                model: model.to_owned(),
                finish_reason,
            });
        }
        Ok(text)
    }

    fn transport_error(&self, model: &str, e: reqwest::Error) -> ExtractionError {
        if e.is_timeout() {
            ExtractionError::Timeout {
                model: model.to_owned(),
                secs: self.timeout_secs,
            }
        } else {
            ExtractionError::Http(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_serialize_in_rest_shape() {
        let parts = vec![
            Part::Text("hello".to_owned()),
            Part::InlineData(Blob {
                mime_type: "video/mp4".to_owned(),
                data: "AAAA".to_owned(),
            }),
            Part::FileData(FileRef {
                mime_type: None,
                file_uri: "https://www.youtube.com/watch?v=x".to_owned(),
            }),
        ];
        let value = serde_json::to_value(&parts).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!([
                {"text": "hello"},
                {"inlineData": {"mimeType": "video/mp4", "data": "AAAA"}},
                {"fileData": {"fileUri": "https://www.youtube.com/watch?v=x"}}
            ])
        );
    }
}
