//! Analysis-path selection and the synthetic results used when extraction
//! names nothing.

use wayfind_core::{
    ExtractedPlace, ExtractionContext, ExtractionResult, MediaKind, MediaRef, Platform,
    PlaceCategory, RawContent, SourceReference,
};

use crate::config::PipelineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPath {
    Text,
    Vision,
}

impl AnalysisPath {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisPath::Text => "text",
            AnalysisPath::Vision => "vision",
        }
    }
}

/// Short-form video always goes to vision. Otherwise a long enough transcript
/// or caption, or a rich description, selects text; media selects vision; with
/// neither, text runs on whatever exists.
#[must_use]
pub fn select_path(
    platform: Platform,
    raw: &RawContent,
    has_media: bool,
    config: &PipelineConfig,
) -> AnalysisPath {
    if platform.is_short_form() && has_media {
        return AnalysisPath::Vision;
    }
    let text_sufficient = raw.primary_text_chars() > config.min_text_chars
        || raw.description_chars() > config.rich_description_chars;
    if text_sufficient || !has_media {
        AnalysisPath::Text
    } else {
        AnalysisPath::Vision
    }
}

/// YouTube media is handed to the model by URL; everything else is a file the
/// extractor must download, so the post's own page URL never qualifies.
#[must_use]
pub fn media_ref(source: &SourceReference, raw: &RawContent) -> Option<MediaRef> {
    let url = raw.media_url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
    let kind = match source.platform {
        Platform::Youtube | Platform::YoutubeShorts => MediaKind::PlatformUrl,
        Platform::Tiktok | Platform::Instagram | Platform::Reddit => MediaKind::DirectUrl,
    };
    if kind == MediaKind::DirectUrl && url == source.url {
        return None;
    }
    Some(MediaRef {
        platform: source.platform,
        url: url.to_owned(),
        kind,
    })
}

#[must_use]
pub fn extraction_context(source: &SourceReference, raw: &RawContent) -> ExtractionContext {
    ExtractionContext {
        platform: source.platform,
        title: raw.title.clone(),
        author_name: raw.author_name.clone(),
        description: raw.description_text.clone(),
        url: source.url.clone(),
    }
}

/// Whether a vision result should replace a text result that named no places.
#[must_use]
pub fn prefer_vision(text: &ExtractionResult, vision: &ExtractionResult) -> bool {
    !vision.places.is_empty()
        || (text.discovery_intent.is_none() && vision.discovery_intent.is_some())
}

fn display_title(source: &SourceReference, title: Option<&str>) -> String {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map_or_else(
            || format!("{} {}", source.platform.display_name(), source.external_id),
            str::to_owned,
        )
}

/// The single place returned when a non-howto run names nothing.
#[must_use]
pub fn fallback_place(
    source: &SourceReference,
    title: Option<&str>,
    result: &ExtractionResult,
) -> ExtractedPlace {
    let mut place = ExtractedPlace::named(
        display_title(source, title),
        PlaceCategory::Other,
        result.summary.clone(),
    );
    place.location_hint = result.destination.clone();
    place
}

/// The single item a how-to video collapses into.
#[must_use]
pub fn howto_tip(
    source: &SourceReference,
    title: Option<&str>,
    result: &ExtractionResult,
) -> ExtractedPlace {
    let mut tip = ExtractedPlace::named(
        display_title(source, title),
        PlaceCategory::Tip,
        result.summary.clone(),
    );
    tip.location_hint = result.destination.clone();
    tip
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfind_core::VideoType;

    fn source(platform: Platform) -> SourceReference {
        SourceReference {
            platform,
            external_id: "abc123".to_owned(),
            url: "https://example.com/abc123".to_owned(),
        }
    }

    fn raw(transcript: usize, description: usize, media: bool) -> RawContent {
        RawContent {
            title: Some("Title".to_owned()),
            transcript_text: (transcript > 0).then(|| "t".repeat(transcript)),
            description_text: (description > 0).then(|| "d".repeat(description)),
            media_url: media.then(|| "https://cdn.example.com/v.mp4".to_owned()),
            ..RawContent::default()
        }
    }

    fn result() -> ExtractionResult {
        ExtractionResult {
            summary: "A day in Lisbon".to_owned(),
            video_type: VideoType::Places,
            destination: Some("Lisbon".to_owned()),
            destination_country: Some("Portugal".to_owned()),
            duration_days: None,
            places: Vec::new(),
            discovery_intent: None,
            itinerary: None,
        }
    }

    #[test]
    fn long_transcript_selects_text() {
        let config = PipelineConfig::default();
        let path = select_path(Platform::Youtube, &raw(201, 0, true), true, &config);
        assert_eq!(path, AnalysisPath::Text);
    }

    #[test]
    fn transcript_at_threshold_is_not_enough() {
        let config = PipelineConfig::default();
        let path = select_path(Platform::Youtube, &raw(200, 0, true), true, &config);
        assert_eq!(path, AnalysisPath::Vision);
    }

    #[test]
    fn rich_description_selects_text() {
        let config = PipelineConfig::default();
        let path = select_path(Platform::Instagram, &raw(0, 501, true), true, &config);
        assert_eq!(path, AnalysisPath::Text);
    }

    #[test]
    fn short_form_always_selects_vision() {
        let config = PipelineConfig::default();
        let path = select_path(Platform::Tiktok, &raw(5_000, 5_000, true), true, &config);
        assert_eq!(path, AnalysisPath::Vision);
    }

    #[test]
    fn thin_text_without_media_still_uses_text() {
        let config = PipelineConfig::default();
        let path = select_path(Platform::Reddit, &raw(10, 0, false), false, &config);
        assert_eq!(path, AnalysisPath::Text);
    }

    #[test]
    fn media_kind_follows_platform() {
        let content = raw(0, 0, true);
        let yt = media_ref(&source(Platform::YoutubeShorts), &content).expect("media");
        assert_eq!(yt.kind, MediaKind::PlatformUrl);
        let tt = media_ref(&source(Platform::Tiktok), &content).expect("media");
        assert_eq!(tt.kind, MediaKind::DirectUrl);
        assert!(media_ref(&source(Platform::Reddit), &raw(0, 0, false)).is_none());
    }

    #[test]
    fn post_page_url_is_not_downloadable_media() {
        let page = source(Platform::Tiktok);
        let content = RawContent {
            media_url: Some(page.url.clone()),
            ..raw(0, 0, false)
        };
        assert!(media_ref(&page, &content).is_none());

        let shorts = source(Platform::YoutubeShorts);
        let content = RawContent {
            media_url: Some(shorts.url.clone()),
            ..raw(0, 0, false)
        };
        let media = media_ref(&shorts, &content).expect("platform url");
        assert_eq!(media.kind, MediaKind::PlatformUrl);
    }

    #[test]
    fn fallback_place_uses_title_summary_and_destination() {
        let place = fallback_place(&source(Platform::Youtube), Some("Lisbon vlog"), &result());
        assert_eq!(place.name, "Lisbon vlog");
        assert_eq!(place.category, PlaceCategory::Other);
        assert_eq!(place.description, "A day in Lisbon");
        assert_eq!(place.location_hint.as_deref(), Some("Lisbon"));
    }

    #[test]
    fn missing_title_falls_back_to_platform_and_id() {
        let tip = howto_tip(&source(Platform::Tiktok), Some("  "), &result());
        assert_eq!(tip.name, "TikTok abc123");
        assert_eq!(tip.category, PlaceCategory::Tip);
    }
}
