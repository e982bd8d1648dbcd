//! Discussion-thread tier: Reddit's public `/comments/ID.json` listing.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use wayfind_core::{RawContent, SourceReference};

use crate::client::HttpFetcher;
use crate::error::SourceError;
use crate::tier::Tier;

/// Reddit listing wrapper.
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
    data: ThingData,
}

#[derive(Debug, Default, Deserialize)]
struct ThingData {
    title: Option<String>,
    selftext: Option<String>,
    body: Option<String>,
    author: Option<String>,
    score: Option<i64>,
    #[serde(default)]
    stickied: bool,
    thumbnail: Option<String>,
}

pub struct RedditThreadTier {
    http: Arc<HttpFetcher>,
    base_url: String,
    top_comments: usize,
}

impl RedditThreadTier {
    #[must_use]
    pub fn new(http: Arc<HttpFetcher>, base_url: &str, top_comments: usize) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            top_comments,
        }
    }
}

#[async_trait]
impl Tier for RedditThreadTier {
    fn name(&self) -> &'static str {
        "thread_json"
    }

    async fn fetch(&self, source: &SourceReference) -> Result<RawContent, SourceError> {
        let url = format!(
            "{}/comments/{}.json?raw_json=1&sort=top",
            self.base_url, source.external_id
        );
        let listings: Vec<Listing> = self
            .http
            .get_json(&url, &format!("reddit thread {}", source.external_id))
            .await?;
        Ok(thread_to_content(listings, self.top_comments))
    }
}

fn is_removed(text: &str) -> bool {
    matches!(text.trim(), "" | "[deleted]" | "[removed]")
}

fn thread_to_content(listings: Vec<Listing>, top_comments: usize) -> RawContent {
    let mut listings = listings.into_iter();

    let post = listings
        .next()
        .and_then(|l| l.data.children.into_iter().find(|t| t.kind == "t3"))
        .map(|t| t.data)
        .unwrap_or_default();

    let mut comments: Vec<ThingData> = listings
        .next()
        .map(|l| l.data.children)
        .unwrap_or_default()
        .into_iter()
        .filter(|t| t.kind == "t1")
        .map(|t| t.data)
        .filter(|c| !c.stickied && c.body.as_deref().is_some_and(|b| !is_removed(b)))
        .collect();
    comments.sort_by(|a, b| b.score.unwrap_or(0).cmp(&a.score.unwrap_or(0)));
    comments.truncate(top_comments);

    let comment_text = comments
        .iter()
        .filter_map(|c| c.body.as_deref())
        .map(|body| format!("- {}", body.trim()))
        .collect::<Vec<_>>()
        .join("\n");

    RawContent {
        title: post.title.filter(|t| !t.trim().is_empty()),
        description_text: post.selftext.filter(|s| !is_removed(s)),
        caption_text: Some(comment_text).filter(|t| !t.is_empty()),
        author_name: post
            .author
            .filter(|a| a != "[deleted]")
            .map(|a| format!("u/{a}")),
        thumbnail_url: post.thumbnail.filter(|t| t.starts_with("http")),
        ..RawContent::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listings(value: serde_json::Value) -> Vec<Listing> {
        serde_json::from_value(value).expect("fixture")
    }

    fn comment(body: &str, score: i64, stickied: bool) -> serde_json::Value {
        json!({"kind": "t1", "data": {"body": body, "score": score, "stickied": stickied, "author": "x"}})
    }

    #[test]
    fn picks_top_comments_by_score_and_skips_noise() {
        let value = json!([
            {"data": {"children": [{"kind": "t3", "data": {
                "title": "Best ramen in Tokyo?",
                "selftext": "Going next month",
                "author": "noodlefan",
                "thumbnail": "self"
            }}]}},
            {"data": {"children": [
                comment("Fuunji in Shinjuku", 40, false),
                comment("[deleted]", 500, false),
                comment("Read the rules", 1000, true),
                comment("Ichiran is touristy but fine", 75, false),
                comment("Afuri for yuzu shio", 12, false),
                {"kind": "more", "data": {}}
            ]}}
        ]);

        let content = thread_to_content(listings(value), 2);
        assert_eq!(content.title.as_deref(), Some("Best ramen in Tokyo?"));
        assert_eq!(content.description_text.as_deref(), Some("Going next month"));
        assert_eq!(content.author_name.as_deref(), Some("u/noodlefan"));
        assert!(content.thumbnail_url.is_none());
        assert_eq!(
            content.caption_text.as_deref(),
            Some("- Ichiran is touristy but fine\n- Fuunji in Shinjuku")
        );
    }

    #[test]
    fn missing_comment_listing_is_tolerated() {
        let value = json!([
            {"data": {"children": [{"kind": "t3", "data": {"title": "Solo post", "selftext": "[removed]"}}]}}
        ]);
        let content = thread_to_content(listings(value), 10);
        assert_eq!(content.title.as_deref(), Some("Solo post"));
        assert!(content.description_text.is_none());
        assert!(content.caption_text.is_none());
    }
}
