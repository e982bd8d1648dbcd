//! Shared domain types, configuration, and collaborator traits for wayfind.

pub mod app_config;
pub mod config;
pub mod error;
pub mod ports;
pub mod source;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{CacheError, ConfigError, CoreError, ExtractionParseError, ProviderError};
pub use ports::{AiExtractionService, ContentCache, PlaceDataProvider, SourceFetchProvider};
pub use source::{Platform, PlatformFamily, SourceReference};
pub use types::{
    AddressComponent, CacheEntry, CacheStats, DaySegment, DiscoveryIntent, EnrichedPlace,
    ExtractedPlace, ExtractionContext, ExtractionResult, GroundedSuggestion, MediaKind, MediaRef,
    Photo, PlaceCategory, PlaceDetails, ProcessedContent, RawContent, VideoType,
};
