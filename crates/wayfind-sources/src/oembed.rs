//! Metadata-only tier backed by a public oEmbed endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use wayfind_core::{RawContent, SourceReference};

use crate::client::HttpFetcher;
use crate::error::SourceError;
use crate::tier::Tier;

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    author_name: Option<String>,
    thumbnail_url: Option<String>,
}

/// What to do with the oEmbed `title` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleUse {
    /// The title is only a title (YouTube).
    TitleOnly,
    /// The title is the post caption as well (`TikTok`).
    TitleAndCaption,
}

pub struct OEmbedTier {
    http: Arc<HttpFetcher>,
    endpoint: String,
    title_use: TitleUse,
}

impl OEmbedTier {
    #[must_use]
    pub fn new(http: Arc<HttpFetcher>, endpoint: &str, title_use: TitleUse) -> Self {
        Self {
            http,
            endpoint: endpoint.to_owned(),
            title_use,
        }
    }

    fn request_url(&self, source: &SourceReference) -> String {
        let encoded = utf8_percent_encode(&source.url, NON_ALPHANUMERIC);
        format!("{}?url={encoded}&format=json", self.endpoint)
    }
}

#[async_trait]
impl Tier for OEmbedTier {
    fn name(&self) -> &'static str {
        "oembed"
    }

    async fn fetch(&self, source: &SourceReference) -> Result<RawContent, SourceError> {
        let url = self.request_url(source);
        let response: OEmbedResponse = self
            .http
            .get_json(&url, &format!("oEmbed for {}", source.url))
            .await?;

        let title = response.title.filter(|t| !t.trim().is_empty());
        let caption_text = match self.title_use {
            TitleUse::TitleAndCaption => title.clone(),
            TitleUse::TitleOnly => None,
        };

        Ok(RawContent {
            title,
            caption_text,
            author_name: response.author_name,
            thumbnail_url: response.thumbnail_url,
            ..RawContent::default()
        })
    }
}
