//! Source fetchers: one tiered fallback chain per content-platform family.

pub mod client;
pub mod error;
pub mod fetchers;
pub(crate) mod html;
pub mod instagram;
pub mod oembed;
pub mod reddit;
pub(crate) mod retry;
pub mod tier;
pub mod tiktok;
pub mod youtube;

pub use client::{Endpoints, FetchConfig, HttpFetcher, Route};
pub use error::SourceError;
pub use fetchers::{
    DiscussionThreadFetcher, LongFormVideoFetcher, ShortFormVideoFetcher, SocialPostFetcher,
    SourceRouter,
};
pub use tier::{fallback_title, has_primary_text, has_text_and_media, Tier, TierChain};
