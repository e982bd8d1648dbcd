//! Bounded fan-out that resolves extracted places against a place-data provider.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use wayfind_core::{
    AddressComponent, AppConfig, EnrichedPlace, ExtractedPlace, PlaceDataProvider, PlaceDetails,
    ProviderError,
};

use crate::places::MAX_PHOTOS;
use crate::pool::BoundedPool;

const AREA_PRIORITY: [&str; 4] = [
    "locality",
    "sublocality_level_1",
    "neighborhood",
    "administrative_area_level_2",
];

/// Locality, then sublocality, then neighborhood, then county-level area:
/// first non-empty wins.
#[must_use]
pub fn resolve_area_name(components: &[AddressComponent]) -> Option<String> {
    AREA_PRIORITY.iter().find_map(|wanted| {
        components
            .iter()
            .find(|c| c.types.iter().any(|t| t == wanted) && !c.long_name.trim().is_empty())
            .map(|c| c.long_name.trim().to_owned())
    })
}

/// `ramen_restaurant` -> `ramen`. Plain `restaurant` carries no cuisine.
fn cuisine_from_type(primary_type: &str) -> Option<String> {
    primary_type
        .strip_suffix("_restaurant")
        .filter(|c| !c.is_empty())
        .map(|c| c.replace('_', " "))
}

fn same_label(a: &str, b: &str) -> bool {
    let norm = |s: &str| s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    norm(a) == norm(b)
}

/// Fill AI gaps from the provider's primary type; when both are present and
/// disagree the AI value stays.
fn reconcile_categories(place: &mut ExtractedPlace, primary_type: Option<&str>) {
    let Some(primary) = primary_type.filter(|t| !t.is_empty()) else {
        return;
    };

    match place.place_type.as_deref() {
        None => place.place_type = Some(primary.to_owned()),
        Some(ai) if !same_label(ai, primary) => tracing::debug!(
            place = %place.name,
            ai_type = ai,
            provider_type = primary,
            "place type disagrees with provider; keeping extracted value"
        ),
        Some(_) => {}
    }

    if let Some(provider_cuisine) = cuisine_from_type(primary) {
        match place.cuisine_type.as_deref() {
            None => place.cuisine_type = Some(provider_cuisine),
            Some(ai) if !same_label(ai, &provider_cuisine) => tracing::debug!(
                place = %place.name,
                ai_cuisine = ai,
                provider_cuisine = %provider_cuisine,
                "cuisine disagrees with provider; keeping extracted value"
            ),
            Some(_) => {}
        }
    }
}

fn apply_details(mut place: ExtractedPlace, details: PlaceDetails) -> EnrichedPlace {
    reconcile_categories(&mut place, details.primary_type.as_deref());
    EnrichedPlace {
        area_name: resolve_area_name(&details.address_components),
        place,
        provider_place_id: Some(details.place_id),
        rating: details.rating,
        rating_count: details.rating_count,
        price_level: details.price_level,
        formatted_address: details.formatted_address,
        photos: details.photos.into_iter().take(MAX_PHOTOS).collect(),
        opening_hours: details.opening_hours,
        lat: details.lat,
        lng: details.lng,
        website: details.website,
        google_maps_uri: details.google_maps_uri,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnrichConfig {
    pub concurrency: usize,
    pub call_timeout: Duration,
}

impl EnrichConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            concurrency: config.enrich_concurrency,
            call_timeout: Duration::from_secs(config.enrich_timeout_secs),
        }
    }
}

pub struct PlaceEnricher {
    provider: Arc<dyn PlaceDataProvider>,
    pool: BoundedPool,
    call_timeout: Duration,
}

impl PlaceEnricher {
    #[must_use]
    pub fn new(provider: Arc<dyn PlaceDataProvider>, config: EnrichConfig) -> Self {
        Self {
            provider,
            pool: BoundedPool::new(config.concurrency),
            call_timeout: config.call_timeout,
        }
    }

    /// Enrich every place, in input order. A place whose lookup fails comes
    /// back un-enriched; the batch itself never fails.
    pub async fn enrich(
        &self,
        places: Vec<ExtractedPlace>,
        location_hint: Option<&str>,
    ) -> Vec<EnrichedPlace> {
        let total = places.len();
        let enriched = self
            .pool
            .run(places, |place| self.enrich_one(place, location_hint))
            .await;

        let resolved = enriched.iter().filter(|p| p.is_enriched()).count();
        tracing::info!(total, resolved, "enrichment finished");
        enriched
    }

    async fn enrich_one(&self, place: ExtractedPlace, batch_hint: Option<&str>) -> EnrichedPlace {
        let hint = place.location_hint.as_deref().or(batch_hint);
        let query = match hint.filter(|h| !h.trim().is_empty()) {
            Some(h) => format!("{} {h}", place.name),
            None => place.name.clone(),
        };

        match self.lookup(&query).await {
            Ok(Some(details)) => apply_details(place, details),
            Ok(None) => {
                tracing::warn!(place = %place.name, query = %query, "no provider match");
                EnrichedPlace::unenriched(place)
            }
            Err(e) => {
                tracing::warn!(place = %place.name, error = %e, "enrichment failed");
                EnrichedPlace::unenriched(place)
            }
        }
    }

    async fn lookup(&self, query: &str) -> Result<Option<PlaceDetails>, ProviderError> {
        let Some(place_id) = self.timed(self.provider.search(query)).await? else {
            return Ok(None);
        };
        self.timed(self.provider.details(&place_id)).await.map(Some)
    }

    async fn timed<T>(
        &self,
        call: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| ProviderError::Timeout(self.call_timeout.as_secs()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfind_core::PlaceCategory;

    fn component(name: &str, types: &[&str]) -> AddressComponent {
        AddressComponent {
            long_name: name.to_owned(),
            short_name: name.to_owned(),
            types: types.iter().map(|t| (*t).to_owned()).collect(),
        }
    }

    #[test]
    fn area_prefers_locality_then_sublocality() {
        let components = vec![
            component("Tokyo", &["administrative_area_level_1", "political"]),
            component("Shibuya", &["sublocality_level_1", "political"]),
            component("Minato", &["administrative_area_level_2"]),
        ];
        assert_eq!(resolve_area_name(&components).as_deref(), Some("Shibuya"));

        let with_locality = vec![
            component("Shibuya", &["sublocality_level_1"]),
            component("Shibuya City", &["locality", "political"]),
        ];
        assert_eq!(
            resolve_area_name(&with_locality).as_deref(),
            Some("Shibuya City")
        );
    }

    #[test]
    fn area_skips_empty_names_and_falls_through() {
        let components = vec![
            component(" ", &["locality"]),
            component("Ebisu", &["neighborhood"]),
        ];
        assert_eq!(resolve_area_name(&components).as_deref(), Some("Ebisu"));
        assert!(resolve_area_name(&[component("13", &["street_number"])]).is_none());
    }

    #[test]
    fn provider_type_fills_gaps() {
        let mut place = ExtractedPlace::named("Fuunji", PlaceCategory::Food, "");
        reconcile_categories(&mut place, Some("ramen_restaurant"));
        assert_eq!(place.place_type.as_deref(), Some("ramen_restaurant"));
        assert_eq!(place.cuisine_type.as_deref(), Some("ramen"));
    }

    #[test]
    fn extracted_values_win_on_disagreement() {
        let mut place = ExtractedPlace::named("Fuunji", PlaceCategory::Food, "");
        place.place_type = Some("noodle shop".to_owned());
        place.cuisine_type = Some("tsukemen".to_owned());
        reconcile_categories(&mut place, Some("ramen_restaurant"));
        assert_eq!(place.place_type.as_deref(), Some("noodle shop"));
        assert_eq!(place.cuisine_type.as_deref(), Some("tsukemen"));
    }

    #[test]
    fn plain_restaurant_has_no_cuisine() {
        assert!(cuisine_from_type("restaurant").is_none());
        assert_eq!(
            cuisine_from_type("south_indian_restaurant").as_deref(),
            Some("south indian")
        );
    }
}
