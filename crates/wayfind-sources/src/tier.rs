//! Ordered fallback chains of fetch tiers.

use async_trait::async_trait;
use wayfind_core::{RawContent, SourceReference};

use crate::error::SourceError;

/// One strategy in a fetcher's fallback chain.
#[async_trait]
pub trait Tier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch whatever this tier can provide. Fields it cannot fill stay `None`.
    async fn fetch(&self, source: &SourceReference) -> Result<RawContent, SourceError>;
}

/// Decides when the walk may stop early.
pub type Sufficiency = fn(&RawContent) -> bool;

/// Stops once a transcript or caption is present.
#[must_use]
pub fn has_primary_text(content: &RawContent) -> bool {
    content.has_transcript_or_caption()
}

/// Stops once there is both primary text and a downloadable media address.
#[must_use]
pub fn has_text_and_media(content: &RawContent) -> bool {
    content.has_transcript_or_caption()
        && content
            .media_url
            .as_deref()
            .is_some_and(|u| !u.trim().is_empty())
}

/// An explicit, ordered list of tiers walked richest-first.
pub struct TierChain {
    tiers: Vec<Box<dyn Tier>>,
    sufficient: Sufficiency,
}

impl TierChain {
    #[must_use]
    pub fn new(tiers: Vec<Box<dyn Tier>>, sufficient: Sufficiency) -> Self {
        Self { tiers, sufficient }
    }

    #[must_use]
    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// Walk the tiers in order, merging each partial result into one
    /// accumulator. Tier failures are logged and skipped; the walk ends
    /// early once the sufficiency check passes.
    ///
    /// Never fails: the result always carries at least a fallback title.
    pub async fn walk(&self, source: &SourceReference) -> RawContent {
        let mut acc = RawContent::default();

        for tier in &self.tiers {
            match tier.fetch(source).await {
                Ok(partial) => {
                    tracing::debug!(
                        platform = %source.platform,
                        external_id = %source.external_id,
                        tier = tier.name(),
                        "tier succeeded"
                    );
                    acc.merge_from(partial);
                }
                Err(e) => {
                    tracing::warn!(
                        platform = %source.platform,
                        external_id = %source.external_id,
                        tier = tier.name(),
                        error = %e,
                        "source tier failed"
                    );
                }
            }

            if (self.sufficient)(&acc) {
                break;
            }
        }

        if acc.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
            acc.title = Some(fallback_title(source));
        }
        acc
    }
}

/// `"<Platform> <externalId>"`, used when no tier produced a title.
#[must_use]
pub fn fallback_title(source: &SourceReference) -> String {
    format!("{} {}", source.platform.display_name(), source.external_id)
}
