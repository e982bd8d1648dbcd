//! Social-post tier: caption scrape of the public embed page.
//!
//! Strategies run in priority order against one `/p/CODE/embed/captioned/`
//! page: script payload, description meta tags, embed DOM caption block.
//! The first strategy yielding a caption of at least [`MIN_CAPTION_CHARS`]
//! characters wins.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use wayfind_core::{RawContent, SourceReference};

use crate::client::{HttpFetcher, Route};
use crate::error::SourceError;
use crate::html::{decode_entities, html_to_text, json_after_marker, meta_content};
use crate::tier::Tier;

pub const MIN_CAPTION_CHARS: usize = 20;

static ENGAGEMENT_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)^[\d.,]+[KkMm]?\s+likes?,\s+[\d.,]+[KkMm]?\s+comments?\s+-\s+([A-Za-z0-9._]+)\s+on\s+[^:]+:\s+["“](.*)["”]\.?\s*$"#)
        .expect("valid regex")
});
static CAPTION_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div\s+class="Caption"[^>]*>(.*?)<div\s+class="CaptionComments""#)
        .expect("valid regex")
});
static CAPTION_USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s+class="CaptionUsername"[^>]*>(.*?)</a>"#).expect("valid regex")
});
static CONTEXT_JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""contextJSON"\s*:\s*("(?:[^"\\]|\\.)*")"#).expect("valid regex"));

const MEDIA_KEYS: [&str; 2] = ["shortcode_media", "xdt_shortcode_media"];

/// What one strategy recovered from the page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct CaptionCandidate {
    pub(crate) caption: Option<String>,
    pub(crate) author: Option<String>,
    pub(crate) video_url: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) thumbnail_url: Option<String>,
}

impl CaptionCandidate {
    fn is_sufficient(&self) -> bool {
        self.caption
            .as_deref()
            .is_some_and(|c| c.trim().chars().count() >= MIN_CAPTION_CHARS)
    }
}

type Strategy = fn(&str) -> Option<CaptionCandidate>;

const STRATEGIES: [(&str, Strategy); 3] = [
    ("script_payload", from_script_payload),
    ("meta_description", from_meta_tags),
    ("embed_dom", from_embed_dom),
];

/// Run the strategies in order and combine their output.
///
/// The caption comes from the first sufficient strategy; author, media URLs
/// and thumbnail are taken from whichever strategy found them first.
pub(crate) fn extract_post(html: &str) -> CaptionCandidate {
    let mut combined = CaptionCandidate::default();

    for (name, strategy) in STRATEGIES {
        let Some(candidate) = strategy(html) else {
            continue;
        };
        let sufficient = candidate.is_sufficient();
        tracing::debug!(strategy = name, sufficient, "instagram caption strategy matched");

        if combined.caption.is_none() && sufficient {
            combined.caption = candidate.caption;
        }
        combined.author = combined.author.or(candidate.author);
        combined.video_url = combined.video_url.or(candidate.video_url);
        combined.image_url = combined.image_url.or(candidate.image_url);
        combined.thumbnail_url = combined.thumbnail_url.or(candidate.thumbnail_url);
    }

    combined.thumbnail_url = combined
        .thumbnail_url
        .or_else(|| meta_content(html, "og:image"));
    combined
}

fn find_media_object(value: &serde_json::Value) -> Option<&serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => {
            for key in MEDIA_KEYS {
                if let Some(media) = map.get(key).filter(|m| m.is_object()) {
                    return Some(media);
                }
            }
            map.values().find_map(find_media_object)
        }
        serde_json::Value::Array(items) => items.iter().find_map(find_media_object),
        _ => None,
    }
}

fn media_to_candidate(media: &serde_json::Value) -> CaptionCandidate {
    let caption = media
        .pointer("/edge_media_to_caption/edges/0/node/text")
        .or_else(|| media.pointer("/caption/text"))
        .or_else(|| media.get("caption").filter(|c| c.is_string()))
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned);
    let str_field = |path: &str| {
        media
            .pointer(path)
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
    };

    CaptionCandidate {
        caption,
        author: str_field("/owner/username"),
        video_url: str_field("/video_url"),
        image_url: str_field("/display_url"),
        thumbnail_url: str_field("/display_url").or_else(|| str_field("/thumbnail_src")),
    }
}

/// Strategy 1: JSON payload embedded in a page script.
fn from_script_payload(html: &str) -> Option<CaptionCandidate> {
    for key in MEDIA_KEYS {
        let marker = format!("\"{key}\"");
        if let Some(media) = json_after_marker(html, &marker) {
            return Some(media_to_candidate(&media));
        }
    }

    // The captioned embed also ships the payload as an escaped JSON string.
    let literal = CONTEXT_JSON_RE.captures(html)?.get(1)?.as_str();
    let inner: String = serde_json::from_str(literal).ok()?;
    let context: serde_json::Value = serde_json::from_str(&inner).ok()?;
    find_media_object(&context).map(media_to_candidate)
}

/// Strategy 2: `og:description` / `description` meta tags.
fn from_meta_tags(html: &str) -> Option<CaptionCandidate> {
    let raw = meta_content(html, "og:description").or_else(|| meta_content(html, "description"))?;

    if let Some(caps) = ENGAGEMENT_PREFIX_RE.captures(&raw) {
        return Some(CaptionCandidate {
            caption: caps.get(2).map(|m| m.as_str().trim().to_owned()),
            author: caps.get(1).map(|m| m.as_str().to_owned()),
            ..CaptionCandidate::default()
        });
    }

    Some(CaptionCandidate {
        caption: Some(raw.trim().to_owned()),
        ..CaptionCandidate::default()
    })
}

/// Strategy 3: the rendered caption block in the embed markup.
fn from_embed_dom(html: &str) -> Option<CaptionCandidate> {
    let block = CAPTION_BLOCK_RE.captures(html)?.get(1)?.as_str();
    let author = CAPTION_USERNAME_RE
        .captures(block)
        .and_then(|c| c.get(1))
        .map(|m| decode_entities(m.as_str().trim()));
    let without_username = CAPTION_USERNAME_RE.replace(block, "");
    let caption = html_to_text(&without_username);

    Some(CaptionCandidate {
        caption: Some(caption).filter(|c| !c.is_empty()),
        author,
        ..CaptionCandidate::default()
    })
}

pub struct InstagramEmbedTier {
    http: Arc<HttpFetcher>,
    base_url: String,
}

impl InstagramEmbedTier {
    #[must_use]
    pub fn new(http: Arc<HttpFetcher>, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl Tier for InstagramEmbedTier {
    fn name(&self) -> &'static str {
        "embed_page"
    }

    async fn fetch(&self, source: &SourceReference) -> Result<RawContent, SourceError> {
        let url = format!("{}/p/{}/embed/captioned/", self.base_url, source.external_id);
        let html = self.http.get_text(&url, Route::Direct).await?;
        let post = extract_post(&html);

        if post.caption.is_none() {
            return Err(SourceError::MissingPayload {
                what: "caption",
                url,
            });
        }

        Ok(RawContent {
            caption_text: post.caption,
            media_url: post.video_url.or(post.image_url),
            author_name: post.author,
            thumbnail_url: post.thumbnail_url,
            ..RawContent::default()
        })
    }
}
