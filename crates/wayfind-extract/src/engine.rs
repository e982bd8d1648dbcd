use async_trait::async_trait;
use wayfind_core::{
    AiExtractionService, AppConfig, ExtractionContext, ExtractionParseError, ExtractionResult,
    MediaRef,
};

use crate::error::ExtractionError;
use crate::gemini::{GeminiClient, Part, StructuredPrompt};
use crate::grounding::ground_intent;
use crate::media::MediaLoader;
use crate::prompts::{metadata_only_prompt, text_prompt, vision_prompt, EXTRACTION_SYSTEM_PROMPT};
use crate::rules;
use crate::schema::{decode_extraction, response_schema, WireExtraction};
use crate::text::truncate_to_char_boundary;

#[derive(Clone)]
pub struct ExtractConfig {
    pub api_key: String,
    pub primary_model: String,
    pub fallback_model: String,
    /// `None` uses the public Gemini endpoint.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_text_bytes: usize,
    pub media_max_bytes: u64,
    pub ground_discovery: bool,
}

impl ExtractConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            api_key: config.gemini_api_key.clone(),
            primary_model: config.model_primary.clone(),
            fallback_model: config.model_fallback.clone(),
            base_url: config.model_base_url.clone(),
            timeout_secs: config.extract_timeout_secs,
            max_text_bytes: config.extract_max_text_bytes,
            media_max_bytes: config.media_max_bytes,
            ground_discovery: config.ground_discovery,
        }
    }
}

/// [`AiExtractionService`] backed by Gemini structured output, with one retry
/// against the fallback model.
pub struct GeminiExtractor {
    client: GeminiClient,
    media: MediaLoader,
    primary_model: String,
    fallback_model: String,
    max_text_bytes: usize,
    ground_discovery: bool,
    schema: serde_json::Value,
}

impl GeminiExtractor {
    /// # Errors
    ///
    /// Returns [`ExtractionError::Http`] if an HTTP client cannot be built.
    pub fn new(config: &ExtractConfig) -> Result<Self, ExtractionError> {
        let client = match config.base_url.as_deref() {
            Some(base_url) => {
                GeminiClient::with_base_url(&config.api_key, config.timeout_secs, base_url)?
            }
            None => GeminiClient::new(&config.api_key, config.timeout_secs)?,
        };
        Ok(Self {
            client,
            media: MediaLoader::new(config.timeout_secs, config.media_max_bytes)?,
            primary_model: config.primary_model.clone(),
            fallback_model: config.fallback_model.clone(),
            max_text_bytes: config.max_text_bytes,
            ground_discovery: config.ground_discovery,
            schema: response_schema::<WireExtraction>(),
        })
    }

    async fn attempt(
        &self,
        model: &str,
        prompt: &StructuredPrompt,
    ) -> Result<ExtractionResult, ExtractionError> {
        let raw = self.client.generate(model, prompt).await?;
        Ok(rules::enforce(decode_extraction(&raw)?))
    }

    /// Primary model, then exactly one retry on the fallback model.
    async fn run(&self, parts: Vec<Part>) -> Result<ExtractionResult, ExtractionParseError> {
        let prompt = StructuredPrompt {
            system: EXTRACTION_SYSTEM_PROMPT.to_owned(),
            parts,
            schema: self.schema.clone(),
        };

        let mut last_error = None;
        for (attempt, model) in [&self.primary_model, &self.fallback_model]
            .into_iter()
            .enumerate()
        {
            match self.attempt(model, &prompt).await {
                Ok(result) => {
                    tracing::info!(
                        model = %model,
                        video_type = %result.video_type,
                        places = result.places.len(),
                        has_intent = result.discovery_intent.is_some(),
                        "extraction succeeded"
                    );
                    return Ok(self.ground(result).await);
                }
                Err(e) => {
                    tracing::warn!(
                        model = %model,
                        attempt = attempt + 1,
                        error = %e,
                        "extraction attempt failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(ExtractionParseError {
            attempts: 2,
            reason: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }

    async fn ground(&self, mut result: ExtractionResult) -> ExtractionResult {
        if !self.ground_discovery {
            return result;
        }
        let Some(intent) = result.discovery_intent.as_mut() else {
            return result;
        };

        match ground_intent(&self.client, &self.primary_model, intent).await {
            Ok(suggestions) if !suggestions.is_empty() => {
                tracing::debug!(count = suggestions.len(), "attached grounded suggestions");
                intent.grounded_suggestions = Some(suggestions);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "grounding failed; intent kept without suggestions"),
        }
        result
    }
}

#[async_trait]
impl AiExtractionService for GeminiExtractor {
    async fn extract_text(
        &self,
        text: &str,
        context: &ExtractionContext,
    ) -> Result<ExtractionResult, ExtractionParseError> {
        let truncated = truncate_to_char_boundary(text, self.max_text_bytes);
        if truncated.len() < text.len() {
            tracing::debug!(
                original_bytes = text.len(),
                kept_bytes = truncated.len(),
                "prompt text truncated"
            );
        }
        self.run(vec![Part::Text(text_prompt(truncated, context))])
            .await
    }

    async fn extract_vision(
        &self,
        media: &MediaRef,
        context: &ExtractionContext,
    ) -> Result<ExtractionResult, ExtractionParseError> {
        let parts = match self.media.to_part(media).await {
            Ok(part) => vec![Part::Text(vision_prompt(context)), part],
            Err(e) => {
                tracing::warn!(
                    url = %media.url,
                    error = %e,
                    "media unavailable; using metadata-only prompt"
                );
                vec![Part::Text(metadata_only_prompt(context))]
            }
        };
        self.run(parts).await
    }
}
