//! Long-form video tiers: watch-page player response with caption download.

use std::sync::Arc;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use wayfind_core::{RawContent, SourceReference};

use crate::client::{HttpFetcher, Route};
use crate::error::SourceError;
use crate::html::{decode_entities, json_after_marker};
use crate::tier::Tier;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    video_details: Option<VideoDetails>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoDetails {
    title: Option<String>,
    author: Option<String>,
    short_description: Option<String>,
    thumbnail: Option<ThumbnailList>,
}

#[derive(Debug, Deserialize)]
struct ThumbnailList {
    #[serde(default)]
    thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
    #[serde(default)]
    width: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CaptionTrack {
    pub(crate) base_url: String,
    pub(crate) language_code: String,
    /// `"asr"` for auto-generated tracks.
    #[serde(default)]
    pub(crate) kind: Option<String>,
}

impl CaptionTrack {
    fn is_auto_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn is_english(&self) -> bool {
        self.language_code == "en" || self.language_code.starts_with("en-")
    }
}

/// Manual English, then auto-generated English, then whatever comes first.
pub(crate) fn select_caption_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.is_english() && !t.is_auto_generated())
        .or_else(|| tracks.iter().find(|t| t.is_english()))
        .or_else(|| tracks.first())
}

/// Scrapes the watch page's embedded `ytInitialPlayerResponse` for metadata
/// and the caption track list, then downloads the preferred track.
pub struct WatchPageTier {
    http: Arc<HttpFetcher>,
    base_url: String,
}

impl WatchPageTier {
    #[must_use]
    pub fn new(http: Arc<HttpFetcher>, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn track_url(&self, track: &CaptionTrack) -> String {
        if track.base_url.starts_with('/') {
            format!("{}{}", self.base_url, track.base_url)
        } else {
            track.base_url.clone()
        }
    }
}

#[async_trait]
impl Tier for WatchPageTier {
    fn name(&self) -> &'static str {
        "watch_page"
    }

    async fn fetch(&self, source: &SourceReference) -> Result<RawContent, SourceError> {
        let url = format!("{}/watch?v={}&hl=en", self.base_url, source.external_id);
        let html = self.http.get_text(&url, Route::Residential).await?;

        let player = json_after_marker(&html, "ytInitialPlayerResponse").ok_or_else(|| {
            SourceError::MissingPayload {
                what: "player response",
                url: url.clone(),
            }
        })?;
        let player: PlayerResponse =
            serde_json::from_value(player).map_err(|e| SourceError::Deserialize {
                context: format!("player response for {}", source.external_id),
                source: e,
            })?;

        let details = player.video_details;
        let mut content = RawContent {
            title: details.as_ref().and_then(|d| d.title.clone()),
            author_name: details.as_ref().and_then(|d| d.author.clone()),
            description_text: details.as_ref().and_then(|d| d.short_description.clone()),
            thumbnail_url: details
                .as_ref()
                .and_then(|d| d.thumbnail.as_ref())
                .and_then(|t| t.thumbnails.iter().max_by_key(|th| th.width))
                .map(|th| th.url.clone()),
            ..RawContent::default()
        };

        let tracks = player
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .map(|r| r.caption_tracks)
            .unwrap_or_default();

        let Some(track) = select_caption_track(&tracks) else {
            tracing::debug!(external_id = %source.external_id, "no caption tracks listed");
            return Ok(content);
        };

        tracing::debug!(
            external_id = %source.external_id,
            language = %track.language_code,
            auto_generated = track.is_auto_generated(),
            "downloading caption track"
        );
        match self
            .http
            .get_text(&self.track_url(track), Route::Residential)
            .await
            .and_then(|xml| parse_timed_text(&xml))
        {
            Ok(transcript) if !transcript.is_empty() => content.transcript_text = Some(transcript),
            Ok(_) => tracing::debug!(external_id = %source.external_id, "caption track was empty"),
            Err(e) => tracing::warn!(
                external_id = %source.external_id,
                error = %e,
                "caption download failed"
            ),
        }

        Ok(content)
    }
}

/// Flatten timed-text XML (`<text>` cues or srv3 `<p>` cues) into one transcript.
pub(crate) fn parse_timed_text(xml: &str) -> Result<String, SourceError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_cue = false;
    let mut current = String::new();
    let mut cues: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if matches!(e.name().as_ref(), b"text" | b"p") {
                    in_cue = true;
                    current.clear();
                }
            }
            Ok(Event::Text(e)) => {
                if in_cue {
                    let text = e.unescape().unwrap_or_default();
                    if !current.is_empty() {
                        current.push(' ');
                    }
                    current.push_str(&text);
                }
            }
            Ok(Event::End(e)) => {
                if matches!(e.name().as_ref(), b"text" | b"p") {
                    in_cue = false;
                    // Cue text is frequently double-escaped (`&amp;#39;`).
                    let cue = decode_entities(current.trim());
                    let cue = cue.split_whitespace().collect::<Vec<_>>().join(" ");
                    if !cue.is_empty() {
                        cues.push(cue);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SourceError::Xml(e)),
            _ => {}
        }
    }

    Ok(cues.join(" "))
}
