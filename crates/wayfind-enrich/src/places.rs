//! Google Places API (New) client: text search for an id, then details.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wayfind_core::{
    AddressComponent, AppConfig, PlaceDataProvider, PlaceDetails, Photo, ProviderError,
};

use crate::error::EnrichError;

const PLACES_API_URL: &str = "https://places.googleapis.com/v1";
const SEARCH_FIELD_MASK: &str = "places.id";
const DETAILS_FIELD_MASK: &str = "id,displayName,rating,userRatingCount,priceLevel,\
formattedAddress,addressComponents,photos,regularOpeningHours.weekdayDescriptions,\
location,primaryType,types,websiteUri,googleMapsUri";

pub const MAX_PHOTOS: usize = 5;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    text_query: &'a str,
    max_result_count: u8,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    places: Vec<SearchPlace>,
}

#[derive(Deserialize)]
struct SearchPlace {
    id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailsResponse {
    id: String,
    display_name: Option<LocalizedText>,
    rating: Option<f64>,
    user_rating_count: Option<u32>,
    price_level: Option<String>,
    formatted_address: Option<String>,
    #[serde(default)]
    address_components: Vec<WireAddressComponent>,
    #[serde(default)]
    photos: Vec<WirePhoto>,
    regular_opening_hours: Option<OpeningHours>,
    location: Option<LatLng>,
    primary_type: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    website_uri: Option<String>,
    google_maps_uri: Option<String>,
}

#[derive(Deserialize)]
struct LocalizedText {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAddressComponent {
    long_text: Option<String>,
    short_text: Option<String>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePhoto {
    name: String,
    width_px: Option<u32>,
    height_px: Option<u32>,
    #[serde(default)]
    author_attributions: Vec<AuthorAttribution>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorAttribution {
    display_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpeningHours {
    #[serde(default)]
    weekday_descriptions: Vec<String>,
}

#[derive(Deserialize)]
struct LatLng {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl From<DetailsResponse> for PlaceDetails {
    fn from(wire: DetailsResponse) -> Self {
        PlaceDetails {
            place_id: wire.id,
            display_name: wire.display_name.and_then(|t| t.text),
            rating: wire.rating,
            rating_count: wire.user_rating_count,
            price_level: wire.price_level,
            formatted_address: wire.formatted_address,
            address_components: wire
                .address_components
                .into_iter()
                .map(|c| AddressComponent {
                    long_name: c.long_text.unwrap_or_default(),
                    short_name: c.short_text.unwrap_or_default(),
                    types: c.types,
                })
                .collect(),
            photos: wire
                .photos
                .into_iter()
                .take(MAX_PHOTOS)
                .map(|p| Photo {
                    reference: p.name,
                    width_px: p.width_px,
                    height_px: p.height_px,
                    attribution: p
                        .author_attributions
                        .into_iter()
                        .find_map(|a| a.display_name),
                })
                .collect(),
            opening_hours: wire
                .regular_opening_hours
                .map(|h| h.weekday_descriptions)
                .filter(|d| !d.is_empty()),
            lat: wire.location.as_ref().and_then(|l| l.latitude),
            lng: wire.location.as_ref().and_then(|l| l.longitude),
            primary_type: wire.primary_type,
            types: wire.types,
            website: wire.website_uri,
            google_maps_uri: wire.google_maps_uri,
        }
    }
}

pub struct GooglePlacesClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout_secs: u64,
}

impl GooglePlacesClient {
    /// # Errors
    ///
    /// Returns [`EnrichError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, EnrichError> {
        Self::with_base_url(api_key, timeout_secs, PLACES_API_URL)
    }

    /// # Errors
    ///
    /// Returns [`EnrichError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, EnrichError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout_secs,
        })
    }

    /// Build from the places key and enrichment settings.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError::Http`] if the HTTP client cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, EnrichError> {
        Self::with_base_url(
            &config.google_places_api_key,
            config.enrich_timeout_secs,
            config.places_base_url.as_deref().unwrap_or(PLACES_API_URL),
        )
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> Result<T, EnrichError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(EnrichError::Status {
                status: status.as_u16(),
                body: body.chars().take(300).collect(),
            });
        }
        serde_json::from_str(&body).map_err(|source| EnrichError::Decode {
            context: context.to_owned(),
            source,
        })
    }

    /// Text search; the first candidate's id, if any.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError`] on transport, status, or decode failure.
    pub async fn search_text(&self, query: &str) -> Result<Option<String>, EnrichError> {
        let response = self
            .http
            .post(format!("{}/places:searchText", self.base_url))
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", SEARCH_FIELD_MASK)
            .json(&SearchRequest {
                text_query: query,
                max_result_count: 1,
            })
            .send()
            .await?;
        let parsed: SearchResponse = Self::read_json(response, "places search").await?;
        Ok(parsed.places.into_iter().find_map(|p| p.id))
    }

    /// # Errors
    ///
    /// Returns [`EnrichError`] on transport, status, or decode failure.
    pub async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, EnrichError> {
        let response = self
            .http
            .get(format!("{}/places/{place_id}", self.base_url))
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", DETAILS_FIELD_MASK)
            .send()
            .await?;
        let parsed: DetailsResponse = Self::read_json(response, "place details").await?;
        Ok(parsed.into())
    }

    fn provider_error(&self, err: EnrichError) -> ProviderError {
        match err {
            EnrichError::Http(e) if e.is_timeout() => ProviderError::Timeout(self.timeout_secs),
            other => other.into(),
        }
    }
}

#[async_trait]
impl PlaceDataProvider for GooglePlacesClient {
    async fn search(&self, query: &str) -> Result<Option<String>, ProviderError> {
        self.search_text(query)
            .await
            .map_err(|e| self.provider_error(e))
    }

    async fn details(&self, place_id: &str) -> Result<PlaceDetails, ProviderError> {
        self.place_details(place_id)
            .await
            .map_err(|e| self.provider_error(e))
    }
}
