//! One fetcher per platform family, plus a router that dispatches by platform.

use std::sync::Arc;

use async_trait::async_trait;
use wayfind_core::{
    CoreError, Platform, PlatformFamily, RawContent, SourceFetchProvider, SourceReference,
};

use crate::client::{Endpoints, FetchConfig, HttpFetcher};
use crate::error::SourceError;
use crate::instagram::InstagramEmbedTier;
use crate::oembed::{OEmbedTier, TitleUse};
use crate::reddit::RedditThreadTier;
use crate::tier::{has_primary_text, has_text_and_media, Tier, TierChain};
use crate::tiktok::TiktokPageTier;
use crate::youtube::WatchPageTier;

fn ensure_family(
    source: &SourceReference,
    family: PlatformFamily,
    label: &'static str,
) -> Result<(), CoreError> {
    if source.platform.family() != family {
        let err = SourceError::PlatformMismatch {
            expected: label,
            actual: source.platform.to_string(),
        };
        return Err(CoreError::invalid_source(&source.url, err.to_string()));
    }
    let id = &source.external_id;
    let well_formed = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !well_formed {
        return Err(CoreError::invalid_source(
            &source.url,
            format!("malformed {} id \"{id}\"", source.platform),
        ));
    }
    Ok(())
}

/// `youtube`: watch page with captions, then oEmbed metadata.
pub struct LongFormVideoFetcher {
    chain: TierChain,
}

impl LongFormVideoFetcher {
    #[must_use]
    pub fn new(http: &Arc<HttpFetcher>, endpoints: &Endpoints) -> Self {
        Self {
            chain: TierChain::new(
                vec![
                    Box::new(WatchPageTier::new(Arc::clone(http), &endpoints.youtube)),
                    Box::new(OEmbedTier::new(
                        Arc::clone(http),
                        &endpoints.youtube_oembed,
                        TitleUse::TitleOnly,
                    )),
                ],
                has_primary_text,
            ),
        }
    }
}

#[async_trait]
impl SourceFetchProvider for LongFormVideoFetcher {
    async fn fetch(&self, source: &SourceReference) -> Result<RawContent, CoreError> {
        ensure_family(source, PlatformFamily::LongFormVideo, "long-form video")?;
        let mut content = self.chain.walk(source).await;
        content.media_url.get_or_insert_with(|| source.url.clone());
        Ok(content)
    }
}

/// `youtube_shorts`: oEmbed only, with the watch URL as the media reference.
/// `tiktok`: oEmbed, then the video page for a playable file address.
pub struct ShortFormVideoFetcher {
    shorts: TierChain,
    tiktok: TierChain,
}

impl ShortFormVideoFetcher {
    #[must_use]
    pub fn new(http: &Arc<HttpFetcher>, endpoints: &Endpoints) -> Self {
        let oembed = |endpoint: &str| -> Box<dyn Tier> {
            Box::new(OEmbedTier::new(
                Arc::clone(http),
                endpoint,
                TitleUse::TitleAndCaption,
            ))
        };
        Self {
            shorts: TierChain::new(vec![oembed(&endpoints.youtube_oembed)], has_primary_text),
            tiktok: TierChain::new(
                vec![
                    oembed(&endpoints.tiktok_oembed),
                    Box::new(TiktokPageTier::new(Arc::clone(http), &endpoints.tiktok)),
                ],
                has_text_and_media,
            ),
        }
    }
}

#[async_trait]
impl SourceFetchProvider for ShortFormVideoFetcher {
    async fn fetch(&self, source: &SourceReference) -> Result<RawContent, CoreError> {
        ensure_family(source, PlatformFamily::ShortFormVideo, "short-form video")?;
        if source.platform == Platform::Tiktok {
            // Only the page tier yields media; a page URL is not analysable.
            return Ok(self.tiktok.walk(source).await);
        }
        let mut content = self.shorts.walk(source).await;
        content.media_url = Some(source.url.clone());
        Ok(content)
    }
}

/// `reddit`: one JSON tier, no fallback.
pub struct DiscussionThreadFetcher {
    chain: TierChain,
}

impl DiscussionThreadFetcher {
    #[must_use]
    pub fn new(http: &Arc<HttpFetcher>, endpoints: &Endpoints, top_comments: usize) -> Self {
        Self {
            chain: TierChain::new(
                vec![Box::new(RedditThreadTier::new(
                    Arc::clone(http),
                    &endpoints.reddit,
                    top_comments,
                ))],
                has_primary_text,
            ),
        }
    }
}

#[async_trait]
impl SourceFetchProvider for DiscussionThreadFetcher {
    async fn fetch(&self, source: &SourceReference) -> Result<RawContent, CoreError> {
        ensure_family(source, PlatformFamily::DiscussionThread, "discussion thread")?;
        Ok(self.chain.walk(source).await)
    }
}

/// `instagram`: embed-page caption scrape. The post video, or the image for
/// photo posts, becomes the media reference.
pub struct SocialPostFetcher {
    chain: TierChain,
}

impl SocialPostFetcher {
    #[must_use]
    pub fn new(http: &Arc<HttpFetcher>, endpoints: &Endpoints) -> Self {
        Self {
            chain: TierChain::new(
                vec![Box::new(InstagramEmbedTier::new(
                    Arc::clone(http),
                    &endpoints.instagram,
                ))],
                has_primary_text,
            ),
        }
    }
}

#[async_trait]
impl SourceFetchProvider for SocialPostFetcher {
    async fn fetch(&self, source: &SourceReference) -> Result<RawContent, CoreError> {
        ensure_family(source, PlatformFamily::SocialPost, "social post")?;
        Ok(self.chain.walk(source).await)
    }
}

/// Dispatches each reference to the fetcher for its platform family.
pub struct SourceRouter {
    long_form: LongFormVideoFetcher,
    short_form: ShortFormVideoFetcher,
    thread: DiscussionThreadFetcher,
    social: SocialPostFetcher,
}

impl SourceRouter {
    /// Build every fetcher over one shared HTTP client pair.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP clients cannot be constructed.
    pub fn new(config: &FetchConfig) -> Result<Self, SourceError> {
        let http = Arc::new(HttpFetcher::new(config)?);
        let endpoints = &config.endpoints;
        Ok(Self {
            long_form: LongFormVideoFetcher::new(&http, endpoints),
            short_form: ShortFormVideoFetcher::new(&http, endpoints),
            thread: DiscussionThreadFetcher::new(&http, endpoints, config.reddit_top_comments),
            social: SocialPostFetcher::new(&http, endpoints),
        })
    }
}

#[async_trait]
impl SourceFetchProvider for SourceRouter {
    async fn fetch(&self, source: &SourceReference) -> Result<RawContent, CoreError> {
        match source.platform.family() {
            PlatformFamily::LongFormVideo => self.long_form.fetch(source).await,
            PlatformFamily::ShortFormVideo => self.short_form.fetch(source).await,
            PlatformFamily::DiscussionThread => self.thread.fetch(source).await,
            PlatformFamily::SocialPost => self.social.fetch(source).await,
        }
    }
}
