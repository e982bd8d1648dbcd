//! `TikTok` video page tier: reads the rehydration state the page ships for
//! its own player and recovers the playable video URL.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use wayfind_core::{RawContent, SourceReference};

use crate::client::{HttpFetcher, Route};
use crate::error::SourceError;
use crate::html::{extract_balanced_json, json_after_marker};
use crate::tier::Tier;

const STATE_SCRIPT_IDS: [&str; 2] = ["__UNIVERSAL_DATA_FOR_REHYDRATION__", "SIGI_STATE"];

/// JSON body of `<script id="ID" ...>{...}</script>`.
fn script_json(html: &str, id: &str) -> Option<serde_json::Value> {
    let tag_start = html.find(&format!("id=\"{id}\""))?;
    let body_start = tag_start + html[tag_start..].find('>')? + 1;
    let raw = extract_balanced_json(html[body_start..].trim_start())?;
    serde_json::from_str(raw).ok()
}

fn rehydration_state(html: &str) -> Option<serde_json::Value> {
    STATE_SCRIPT_IDS
        .iter()
        .find_map(|id| script_json(html, id))
        .or_else(|| json_after_marker(html, "window['SIGI_STATE']"))
}

fn has_video_address(item: &serde_json::Map<String, serde_json::Value>) -> bool {
    item.get("video")
        .and_then(serde_json::Value::as_object)
        .is_some_and(|video| video.contains_key("playAddr") || video.contains_key("downloadAddr"))
}

/// The first object carrying a `video` with a playable address. Covers both
/// `webapp.video-detail.itemInfo.itemStruct` and the older `ItemModule.<id>`.
fn find_item(value: &serde_json::Value) -> Option<&serde_json::Value> {
    match value {
        serde_json::Value::Object(map) if has_video_address(map) => Some(value),
        serde_json::Value::Object(map) => map.values().find_map(find_item),
        serde_json::Value::Array(items) => items.iter().find_map(find_item),
        _ => None,
    }
}

fn non_empty_str(value: Option<&serde_json::Value>) -> Option<String> {
    value
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

pub(crate) fn content_from_page(html: &str) -> Option<RawContent> {
    let state = rehydration_state(html)?;
    let item = find_item(&state)?;
    let media_url = non_empty_str(item.pointer("/video/playAddr"))
        .or_else(|| non_empty_str(item.pointer("/video/downloadAddr")))?;
    let author_name = non_empty_str(item.pointer("/author/uniqueId"))
        .or_else(|| non_empty_str(item.get("author")));

    Some(RawContent {
        caption_text: non_empty_str(item.get("desc")),
        media_url: Some(media_url),
        author_name,
        thumbnail_url: non_empty_str(item.pointer("/video/cover")),
        ..RawContent::default()
    })
}

pub struct TiktokPageTier {
    http: Arc<HttpFetcher>,
    base_url: String,
}

impl TiktokPageTier {
    #[must_use]
    pub fn new(http: Arc<HttpFetcher>, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn page_url(&self, source: &SourceReference) -> String {
        let path = Url::parse(&source.url)
            .map(|u| u.path().to_owned())
            .unwrap_or_else(|_| format!("/t/{}/", source.external_id));
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl Tier for TiktokPageTier {
    fn name(&self) -> &'static str {
        "video_page"
    }

    async fn fetch(&self, source: &SourceReference) -> Result<RawContent, SourceError> {
        let url = self.page_url(source);
        let html = self.http.get_text(&url, Route::Residential).await?;
        content_from_page(&html).ok_or(SourceError::MissingPayload {
            what: "video address",
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universal_rehydration_data_yields_play_address() {
        let html = r#"<html><script id="__UNIVERSAL_DATA_FOR_REHYDRATION__" type="application/json">{"__DEFAULT_SCOPE__":{"webapp.video-detail":{"itemInfo":{"itemStruct":{
  "id":"7234567890123456789",
  "desc":"al pastor at El Vilsito after midnight",
  "author":{"uniqueId":"tacoqueen"},
  "video":{"playAddr":"https:\/\/v16-webapp.tiktok.com\/clip.mp4","downloadAddr":"https://v16.tiktokcdn.com/dl.mp4","cover":"https://p16.tiktokcdn.com/cover.jpg"}
}}}}}</script></html>"#;
        let content = content_from_page(html).expect("content");
        assert_eq!(
            content.media_url.as_deref(),
            Some("https://v16-webapp.tiktok.com/clip.mp4")
        );
        assert_eq!(
            content.caption_text.as_deref(),
            Some("al pastor at El Vilsito after midnight")
        );
        assert_eq!(content.author_name.as_deref(), Some("tacoqueen"));
        assert_eq!(
            content.thumbnail_url.as_deref(),
            Some("https://p16.tiktokcdn.com/cover.jpg")
        );
    }

    #[test]
    fn sigi_state_item_module_falls_back_to_download_address() {
        let html = r#"<script id="SIGI_STATE" type="application/json">{"ItemModule":{"7234567890123456789":{
  "desc":"churros","author":"churro.fan",
  "video":{"playAddr":"","downloadAddr":"https://v16.tiktokcdn.com/dl.mp4"}
}}}</script>"#;
        let content = content_from_page(html).expect("content");
        assert_eq!(content.media_url.as_deref(), Some("https://v16.tiktokcdn.com/dl.mp4"));
        assert_eq!(content.author_name.as_deref(), Some("churro.fan"));
    }

    #[test]
    fn page_without_state_yields_nothing() {
        assert!(content_from_page("<html><body>Log in to TikTok</body></html>").is_none());
        let no_video = r#"<script id="SIGI_STATE">{"ItemModule":{}}</script>"#;
        assert!(content_from_page(no_video).is_none());
    }
}
