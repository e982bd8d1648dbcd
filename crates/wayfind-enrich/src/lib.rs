//! Place enrichment against Google Places, under a bounded fan-out.

pub mod enricher;
pub mod error;
pub mod places;
pub mod pool;

pub use enricher::{resolve_area_name, EnrichConfig, PlaceEnricher};
pub use error::EnrichError;
pub use places::{GooglePlacesClient, MAX_PHOTOS};
pub use pool::BoundedPool;
