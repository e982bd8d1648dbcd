//! Small HTML scraping helpers shared by the page-based tiers.

use std::sync::LazyLock;

use regex::Regex;

static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid regex"));
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z:_-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid regex"));
static BR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));
static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("valid regex"));

/// Returns `true` when the body is an anti-bot or consent interstitial rather
/// than the requested page.
pub(crate) fn looks_like_bot_challenge(body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    let has_cloudflare_banner = lowered.contains("attention required! | cloudflare");
    let has_challenge_platform = lowered.contains("/cdn-cgi/challenge-platform/");
    let has_just_a_moment = lowered.contains("just a moment...");
    let has_cookie_gate = lowered.contains("please enable cookies");
    let has_cf_chl = lowered.contains("cf-chl-");
    let has_google_sorry = lowered.contains("our systems have detected unusual traffic");
    let has_consent_wall = lowered.contains("consent.youtube.com")
        && lowered.contains("before you continue");

    has_cloudflare_banner
        || has_challenge_platform
        || has_google_sorry
        || has_consent_wall
        || (has_just_a_moment && has_cookie_gate)
        || (has_just_a_moment && has_cf_chl)
}

/// Content of the first `<meta>` whose `property` or `name` equals `key`.
pub(crate) fn meta_content(html: &str, key: &str) -> Option<String> {
    for tag in META_TAG_RE.find_iter(html) {
        let mut matched = false;
        let mut content = None;
        for cap in ATTR_RE.captures_iter(tag.as_str()) {
            let name = cap.get(1).map_or("", |m| m.as_str()).to_ascii_lowercase();
            let value = cap.get(2).or_else(|| cap.get(3)).map_or("", |m| m.as_str());
            match name.as_str() {
                "property" | "name" if value.eq_ignore_ascii_case(key) => matched = true,
                "content" => content = Some(value.to_owned()),
                _ => {}
            }
        }
        if matched {
            return content
                .map(|c| decode_entities(&c))
                .filter(|c| !c.trim().is_empty());
        }
    }
    None
}

/// Decode the handful of named entities that appear in scraped captions,
/// plus decimal and hex numeric references.
pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_owned();
    }
    let numeric = NUMERIC_ENTITY_RE.replace_all(s, |caps: &regex::Captures<'_>| {
        let raw = &caps[1];
        let code = if let Some(hex) = raw.strip_prefix('x') {
            u32::from_str_radix(hex, 16).ok()
        } else {
            raw.parse::<u32>().ok()
        };
        code.and_then(char::from_u32)
            .map_or_else(|| caps[0].to_owned(), |c| c.to_string())
    });
    numeric
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Strip tags (line breaks become newlines), decode entities and collapse
/// runs of spaces.
pub(crate) fn html_to_text(fragment: &str) -> String {
    let with_breaks = BR_RE.replace_all(fragment, "\n");
    let stripped = TAG_RE.replace_all(&with_breaks, " ");
    let decoded = decode_entities(&stripped);
    decoded
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract a balanced JSON object or array from the start of `s`.
///
/// Tracks bracket depth while respecting string literals and escapes.
/// Returns `None` if `s` does not start with `{`/`[` or is unterminated.
pub(crate) fn extract_balanced_json(s: &str) -> Option<&str> {
    let open = s.chars().next()?;
    if open != '{' && open != '[' {
        return None;
    }
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Find `marker` in `html` and parse the JSON value that follows it.
pub(crate) fn json_after_marker(html: &str, marker: &str) -> Option<serde_json::Value> {
    let start = html.find(marker)? + marker.len();
    let rest = html[start..].trim_start();
    let rest = rest.strip_prefix('=').map_or(rest, str::trim_start);
    let rest = rest.strip_prefix(':').map_or(rest, str::trim_start);
    let raw = extract_balanced_json(rest)?;
    serde_json::from_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_cloudflare_challenge() {
        let html = "<html><title>Just a moment...</title><div class=\"cf-chl-widget\"></div></html>";
        assert!(looks_like_bot_challenge(html));
        assert!(!looks_like_bot_challenge("<html><title>Ramen guide</title></html>"));
    }

    #[test]
    fn detects_unusual_traffic_page() {
        let html = "<p>Our systems have detected unusual traffic from your computer network.</p>";
        assert!(looks_like_bot_challenge(html));
    }

    #[test]
    fn meta_content_matches_property_in_either_order() {
        let html = r#"<head>
            <meta content="A &quot;great&quot; spot" property="og:description">
            <meta name='description' content='fallback'>
        </head>"#;
        assert_eq!(
            meta_content(html, "og:description").as_deref(),
            Some("A \"great\" spot")
        );
        assert_eq!(meta_content(html, "description").as_deref(), Some("fallback"));
        assert!(meta_content(html, "og:image").is_none());
    }

    #[test]
    fn decode_entities_handles_numeric_references() {
        assert_eq!(decode_entities("caf&#233; &amp; bar &#x1F35C;"), "café & bar 🍜");
        assert_eq!(decode_entities("it&#39;s"), "it's");
    }

    #[test]
    fn html_to_text_keeps_line_breaks() {
        let text = html_to_text("<span>Day 1:</span><br/>  Tsukiji   market<br>Day 2");
        assert_eq!(text, "Day 1:\nTsukiji market\nDay 2");
    }

    #[test]
    fn balanced_json_respects_strings() {
        let s = r#"{"a":"}{","b":[1,2]};var x=1;"#;
        assert_eq!(extract_balanced_json(s), Some(r#"{"a":"}{","b":[1,2]}"#));
        assert_eq!(extract_balanced_json("[1,[2,3]] tail"), Some("[1,[2,3]]"));
        assert!(extract_balanced_json("{\"open\": true").is_none());
        assert!(extract_balanced_json("nope").is_none());
    }

    #[test]
    fn json_after_marker_skips_assignment() {
        let html = r#"<script>var ytInitialPlayerResponse = {"videoDetails":{"title":"T"}};</script>"#;
        let value = json_after_marker(html, "ytInitialPlayerResponse").expect("json");
        assert_eq!(value["videoDetails"]["title"], "T");
    }
}
