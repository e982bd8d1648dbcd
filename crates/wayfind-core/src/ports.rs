//! Outbound collaborator traits. Implementations are constructed at the entry
//! points and injected into the pipeline as `Arc<dyn Trait>`.

use async_trait::async_trait;

use crate::error::{CacheError, CoreError, ExtractionParseError, ProviderError};
use crate::source::{Platform, SourceReference};
use crate::types::{
    CacheEntry, CacheStats, ExtractionContext, ExtractionResult, MediaRef, PlaceDetails,
    RawContent,
};

#[async_trait]
pub trait SourceFetchProvider: Send + Sync {
    /// Gather whatever content is obtainable for `source`.
    ///
    /// Missing data is not an error; the returned `RawContent` is simply sparse.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSource`] when the reference cannot be handled.
    async fn fetch(&self, source: &SourceReference) -> Result<RawContent, CoreError>;
}

#[async_trait]
pub trait AiExtractionService: Send + Sync {
    async fn extract_text(
        &self,
        text: &str,
        context: &ExtractionContext,
    ) -> Result<ExtractionResult, ExtractionParseError>;

    async fn extract_vision(
        &self,
        media: &MediaRef,
        context: &ExtractionContext,
    ) -> Result<ExtractionResult, ExtractionParseError>;
}

#[async_trait]
pub trait PlaceDataProvider: Send + Sync {
    /// Resolve a free-text query to a provider place id. `Ok(None)` is a miss.
    async fn search(&self, query: &str) -> Result<Option<String>, ProviderError>;

    async fn details(&self, place_id: &str) -> Result<PlaceDetails, ProviderError>;
}

#[async_trait]
pub trait ContentCache: Send + Sync {
    /// Look up a live entry. A hit increments `hit_count` and stamps
    /// `last_hit_at` atomically; expired rows read as absent.
    async fn get(
        &self,
        platform: Platform,
        external_id: &str,
    ) -> Result<Option<CacheEntry>, CacheError>;

    /// Insert or merge `entry`, returning the stored row.
    async fn set(&self, entry: CacheEntry, ttl_days: Option<u32>)
        -> Result<CacheEntry, CacheError>;

    /// Delete expired rows and rows created more than `older_than_days` ago.
    async fn cleanup(&self, older_than_days: u32) -> Result<u64, CacheError>;

    async fn stats(&self) -> Result<CacheStats, CacheError>;
}
