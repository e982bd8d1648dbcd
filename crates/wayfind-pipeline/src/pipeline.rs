//! URL in, cached and enriched places out.

use std::sync::Arc;

use chrono::Utc;
use tracing::Instrument;
use wayfind_core::{
    AiExtractionService, AppConfig, CacheEntry, ContentCache, EnrichedPlace, ExtractionResult,
    PlaceDataProvider, ProcessedContent, RawContent, SourceFetchProvider, SourceReference,
    VideoType,
};
use wayfind_enrich::{GooglePlacesClient, PlaceEnricher};
use wayfind_extract::{ExtractConfig, GeminiExtractor};
use wayfind_sources::{FetchConfig, SourceRouter};

use crate::analysis::{
    extraction_context, fallback_place, howto_tip, media_ref, prefer_vision, select_path,
    AnalysisPath,
};
use crate::config::PipelineConfig;
use crate::error::{BuildError, PipelineError};

pub struct Pipeline {
    fetcher: Arc<dyn SourceFetchProvider>,
    extractor: Arc<dyn AiExtractionService>,
    enricher: PlaceEnricher,
    cache: Arc<dyn ContentCache>,
    config: PipelineConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn SourceFetchProvider>,
        extractor: Arc<dyn AiExtractionService>,
        places: Arc<dyn PlaceDataProvider>,
        cache: Arc<dyn ContentCache>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            enricher: PlaceEnricher::new(places, config.enrich),
            cache,
            config,
        }
    }

    /// Wire the production fetchers, Gemini extractor, and Places client
    /// around the given cache.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if any HTTP client cannot be constructed.
    pub fn from_app_config(
        config: &AppConfig,
        cache: Arc<dyn ContentCache>,
    ) -> Result<Self, BuildError> {
        let fetcher = SourceRouter::new(&FetchConfig::from_app_config(config))?;
        let extractor = GeminiExtractor::new(&ExtractConfig::from_app_config(config))?;
        let places = GooglePlacesClient::from_app_config(config)?;
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(extractor),
            Arc::new(places),
            cache,
            PipelineConfig::from_app_config(config),
        ))
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<dyn ContentCache> {
        &self.cache
    }

    /// Resolve `url` to a cached or freshly extracted result.
    ///
    /// A fresh run returns the row the cache stored, so a live row written
    /// concurrently is merged in and its known places are kept. If the cache
    /// write fails the freshly built entry is returned instead.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidSource`] when the URL is not a
    /// supported platform reference, and [`PipelineError::ExtractionParse`]
    /// when both model attempts fail. Fetch, enrichment, and cache failures
    /// degrade the result instead.
    pub async fn process_content(&self, url: &str) -> Result<ProcessedContent, PipelineError> {
        let source = SourceReference::parse(url)?;
        let span = tracing::info_span!(
            "process_content",
            platform = %source.platform,
            external_id = %source.external_id,
        );
        self.run(source).instrument(span).await
    }

    async fn run(&self, source: SourceReference) -> Result<ProcessedContent, PipelineError> {
        match self.cache.get(source.platform, &source.external_id).await {
            Ok(Some(entry)) => {
                tracing::info!(hit_count = entry.hit_count, "cache hit");
                return Ok(ProcessedContent::from_entry(entry, true));
            }
            Ok(None) => tracing::debug!("cache miss"),
            Err(e) => tracing::warn!(error = %e, "cache lookup failed; treating as miss"),
        }

        let raw = self.fetcher.fetch(&source).await?;
        let result = self.extract(&source, &raw).await?;
        let places = self.resolve_places(&source, &raw, &result).await;

        let entry = build_entry(&source, raw, result, places);
        tracing::info!(
            video_type = %entry.video_type,
            places = entry.places.len(),
            intent = entry.discovery_intent.is_some(),
            "extraction complete"
        );

        let entry = match self.cache.set(entry.clone(), self.config.cache_ttl_days).await {
            Ok(stored) => {
                tracing::debug!(places = stored.places.len(), "cache entry written");
                stored
            }
            Err(e) => {
                tracing::warn!(error = %e, "cache write failed; returning uncached result");
                entry
            }
        };

        Ok(ProcessedContent::from_entry(entry, false))
    }

    async fn extract(
        &self,
        source: &SourceReference,
        raw: &RawContent,
    ) -> Result<ExtractionResult, PipelineError> {
        let context = extraction_context(source, raw);
        let media = media_ref(source, raw);
        let path = select_path(source.platform, raw, media.is_some(), &self.config);
        tracing::info!(
            path = path.as_str(),
            text_chars = raw.primary_text_chars(),
            has_media = media.is_some(),
            "analysis path selected"
        );

        let result = match (path, &media) {
            (AnalysisPath::Vision, Some(media)) => {
                self.extractor.extract_vision(media, &context).await?
            }
            _ => {
                self.extractor
                    .extract_text(&raw.combined_text(), &context)
                    .await?
            }
        };

        let needs_vision_retry = path == AnalysisPath::Text
            && result.places.is_empty()
            && result.video_type != VideoType::Howto;
        let Some(media) = media.filter(|_| needs_vision_retry) else {
            return Ok(result);
        };

        tracing::info!("text path named no places; retrying with vision");
        match self.extractor.extract_vision(&media, &context).await {
            Ok(vision) if prefer_vision(&result, &vision) => Ok(vision),
            Ok(_) => Ok(result),
            Err(e) => {
                tracing::warn!(error = %e, "vision retry failed; keeping text result");
                Ok(result)
            }
        }
    }

    async fn resolve_places(
        &self,
        source: &SourceReference,
        raw: &RawContent,
        result: &ExtractionResult,
    ) -> Vec<EnrichedPlace> {
        let title = raw.title.as_deref();

        if result.video_type == VideoType::Howto {
            return vec![EnrichedPlace::unenriched(howto_tip(source, title, result))];
        }

        if result.places.is_empty() {
            if result.discovery_intent.is_some() && result.video_type != VideoType::Guide {
                return Vec::new();
            }
            tracing::info!("no places extracted; using title fallback");
            return vec![EnrichedPlace::unenriched(fallback_place(
                source, title, result,
            ))];
        }

        self.enricher
            .enrich(result.places.clone(), result.location_hint().as_deref())
            .await
    }
}

fn build_entry(
    source: &SourceReference,
    raw: RawContent,
    result: ExtractionResult,
    places: Vec<EnrichedPlace>,
) -> CacheEntry {
    let discovery_intent = if places.is_empty() {
        result.discovery_intent
    } else {
        None
    };
    CacheEntry {
        platform: source.platform,
        external_id: source.external_id.clone(),
        url: source.url.clone(),
        title: raw.title.unwrap_or_default(),
        author_name: raw.author_name,
        thumbnail_url: raw.thumbnail_url,
        transcript_text: raw.transcript_text,
        summary: result.summary,
        video_type: result.video_type,
        destination: result.destination,
        destination_country: result.destination_country,
        duration_days: result.duration_days,
        places,
        discovery_intent,
        itinerary: result.itinerary,
        created_at: Utc::now(),
        expires_at: None,
        hit_count: 0,
        last_hit_at: None,
    }
}
