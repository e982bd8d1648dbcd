use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Youtube,
    YoutubeShorts,
    Tiktok,
    Instagram,
    Reddit,
}

/// Fetch strategy family a platform belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFamily {
    LongFormVideo,
    ShortFormVideo,
    DiscussionThread,
    SocialPost,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Youtube,
        Platform::YoutubeShorts,
        Platform::Tiktok,
        Platform::Instagram,
        Platform::Reddit,
    ];

    /// Storage form, used as the first half of the cache key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::YoutubeShorts => "youtube_shorts",
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Reddit => "reddit",
        }
    }

    /// Human-readable name used in fallback titles and log output.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Platform::Youtube => "YouTube",
            Platform::YoutubeShorts => "YouTube Shorts",
            Platform::Tiktok => "TikTok",
            Platform::Instagram => "Instagram",
            Platform::Reddit => "Reddit",
        }
    }

    #[must_use]
    pub fn family(self) -> PlatformFamily {
        match self {
            Platform::Youtube => PlatformFamily::LongFormVideo,
            Platform::YoutubeShorts | Platform::Tiktok => PlatformFamily::ShortFormVideo,
            Platform::Reddit => PlatformFamily::DiscussionThread,
            Platform::Instagram => PlatformFamily::SocialPost,
        }
    }

    #[must_use]
    pub fn is_short_form(self) -> bool {
        self.family() == PlatformFamily::ShortFormVideo
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CoreError::invalid_source(s, "unknown platform"))
    }
}

/// A URL resolved to a platform and its stable content identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReference {
    pub platform: Platform,
    pub external_id: String,
    /// Canonical URL for the content, rebuilt from `platform` and `external_id`
    /// where the platform allows it.
    pub url: String,
}

impl SourceReference {
    /// Resolve a user-supplied URL into a `SourceReference`.
    ///
    /// Scheme-less input (`youtu.be/abc`) is accepted. No network calls are made.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSource`] when the URL cannot be parsed, the
    /// host is not a supported platform, or the path has no valid content id.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CoreError::invalid_source(input, "empty URL"));
        }

        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        let url = Url::parse(&with_scheme)
            .map_err(|e| CoreError::invalid_source(input, format!("unparsable URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::invalid_source(input, "unsupported URL scheme"));
        }

        let host = url
            .host_str()
            .map(normalize_host)
            .ok_or_else(|| CoreError::invalid_source(input, "URL has no host"))?;
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        let resolved = match host.as_str() {
            "youtube.com" | "youtube-nocookie.com" => parse_youtube(&url, &segments),
            "youtu.be" => segments
                .first()
                .filter(|id| is_youtube_video_id(id))
                .map(|id| (Platform::Youtube, (*id).to_string())),
            "tiktok.com" => parse_tiktok(&segments),
            "vm.tiktok.com" | "vt.tiktok.com" => segments
                .first()
                .filter(|code| is_alphanumeric_id(code))
                .map(|code| (Platform::Tiktok, (*code).to_string())),
            "instagram.com" => parse_instagram(&segments),
            "reddit.com" => parse_reddit(&segments),
            "redd.it" => segments
                .first()
                .filter(|id| is_base36_id(id))
                .map(|id| (Platform::Reddit, id.to_ascii_lowercase())),
            _ => {
                return Err(CoreError::invalid_source(
                    input,
                    format!("unsupported host \"{host}\""),
                ))
            }
        };

        let (platform, external_id) = resolved
            .ok_or_else(|| CoreError::invalid_source(input, "no content id found in URL"))?;

        let canonical = canonical_url(platform, &external_id, &host, &segments);

        Ok(Self {
            platform,
            external_id,
            url: canonical,
        })
    }
}

/// Lowercase the host and strip one `www.`, `m.` or `old.` prefix.
fn normalize_host(host: &str) -> String {
    let lower = host.to_ascii_lowercase();
    for prefix in ["www.", "m.", "old."] {
        if let Some(rest) = lower.strip_prefix(prefix) {
            return rest.to_string();
        }
    }
    lower
}

fn parse_youtube(url: &Url, segments: &[&str]) -> Option<(Platform, String)> {
    match segments {
        ["watch", ..] => url
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned())
            .filter(|id| is_youtube_video_id(id))
            .map(|id| (Platform::Youtube, id)),
        ["shorts", id, ..] if is_youtube_video_id(id) => {
            Some((Platform::YoutubeShorts, (*id).to_string()))
        }
        ["embed" | "live" | "v", id, ..] if is_youtube_video_id(id) => {
            Some((Platform::Youtube, (*id).to_string()))
        }
        _ => None,
    }
}

fn parse_tiktok(segments: &[&str]) -> Option<(Platform, String)> {
    match segments {
        [user, "video", id, ..] if user.starts_with('@') && is_numeric_id(id) => {
            Some((Platform::Tiktok, (*id).to_string()))
        }
        // tiktok.com/t/CODE is the in-app share form of a short link.
        ["t", code, ..] if is_alphanumeric_id(code) => Some((Platform::Tiktok, (*code).to_string())),
        _ => None,
    }
}

fn parse_instagram(segments: &[&str]) -> Option<(Platform, String)> {
    match segments {
        ["p" | "reel" | "reels" | "tv", code, ..] if is_shortcode(code) => {
            Some((Platform::Instagram, (*code).to_string()))
        }
        // Profile-prefixed permalinks: instagram.com/USER/p/CODE
        [_, "p" | "reel", code, ..] if is_shortcode(code) => {
            Some((Platform::Instagram, (*code).to_string()))
        }
        _ => None,
    }
}

fn parse_reddit(segments: &[&str]) -> Option<(Platform, String)> {
    match segments {
        ["r", _, "comments", id, ..] | ["comments", id, ..] if is_base36_id(id) => {
            Some((Platform::Reddit, id.to_ascii_lowercase()))
        }
        _ => None,
    }
}

fn canonical_url(platform: Platform, id: &str, host: &str, segments: &[&str]) -> String {
    match platform {
        Platform::Youtube => format!("https://www.youtube.com/watch?v={id}"),
        Platform::YoutubeShorts => format!("https://www.youtube.com/shorts/{id}"),
        Platform::Tiktok => {
            if host == "tiktok.com" && segments.len() >= 3 && segments[1] == "video" {
                format!("https://www.tiktok.com/{}/video/{id}", segments[0])
            } else if host == "tiktok.com" {
                format!("https://www.tiktok.com/t/{id}/")
            } else {
                format!("https://{host}/{id}/")
            }
        }
        Platform::Instagram => format!("https://www.instagram.com/p/{id}/"),
        Platform::Reddit => format!("https://www.reddit.com/comments/{id}/"),
    }
}

fn is_youtube_video_id(s: &str) -> bool {
    s.len() == 11
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn is_alphanumeric_id(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_shortcode(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_base36_id(s: &str) -> bool {
    !s.is_empty() && s.len() <= 12 && s.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
