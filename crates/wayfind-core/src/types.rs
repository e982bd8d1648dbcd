use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::source::{Platform, SourceReference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    Places,
    Guide,
    Howto,
}

impl VideoType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            VideoType::Places => "places",
            VideoType::Guide => "guide",
            VideoType::Howto => "howto",
        }
    }
}

impl std::fmt::Display for VideoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VideoType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "places" => Ok(VideoType::Places),
            "guide" => Ok(VideoType::Guide),
            "howto" | "how-to" | "how_to" => Ok(VideoType::Howto),
            other => Err(format!("unknown video type \"{other}\"")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceCategory {
    Food,
    Drinks,
    Stay,
    Activity,
    Sight,
    Shopping,
    Nightlife,
    Nature,
    Tip,
    Other,
}

impl PlaceCategory {
    pub const ALL: [PlaceCategory; 10] = [
        PlaceCategory::Food,
        PlaceCategory::Drinks,
        PlaceCategory::Stay,
        PlaceCategory::Activity,
        PlaceCategory::Sight,
        PlaceCategory::Shopping,
        PlaceCategory::Nightlife,
        PlaceCategory::Nature,
        PlaceCategory::Tip,
        PlaceCategory::Other,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PlaceCategory::Food => "food",
            PlaceCategory::Drinks => "drinks",
            PlaceCategory::Stay => "stay",
            PlaceCategory::Activity => "activity",
            PlaceCategory::Sight => "sight",
            PlaceCategory::Shopping => "shopping",
            PlaceCategory::Nightlife => "nightlife",
            PlaceCategory::Nature => "nature",
            PlaceCategory::Tip => "tip",
            PlaceCategory::Other => "other",
        }
    }

    /// Map a free-form label onto a category. Unknown labels become `Other`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let lower = label.trim().to_ascii_lowercase();
        PlaceCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .unwrap_or(match lower.as_str() {
                "restaurant" | "cafe" | "bakery" | "street food" => PlaceCategory::Food,
                "bar" | "pub" | "drink" => PlaceCategory::Drinks,
                "hotel" | "hostel" | "accommodation" | "lodging" => PlaceCategory::Stay,
                "attraction" | "landmark" | "museum" => PlaceCategory::Sight,
                "shop" | "market" | "store" => PlaceCategory::Shopping,
                "club" => PlaceCategory::Nightlife,
                "park" | "beach" | "hike" | "trail" => PlaceCategory::Nature,
                _ => PlaceCategory::Other,
            })
    }
}

impl std::fmt::Display for PlaceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedPlace {
    pub name: String,
    pub category: PlaceCategory,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
}

impl ExtractedPlace {
    /// A place with only the required fields set.
    #[must_use]
    pub fn named(
        name: impl Into<String>,
        category: PlaceCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            description: description.into(),
            location_hint: None,
            parent_location: None,
            cuisine_type: None,
            place_type: None,
            tags: Vec::new(),
            day: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundedSuggestion {
    pub name: String,
    pub area_hint: String,
    pub rationale: String,
    /// Always `false`: suggestions come from model knowledge, not a place lookup.
    pub verified: bool,
}

/// A goal description returned when no named business could be extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryIntent {
    #[serde(rename = "type")]
    pub intent_type: String,
    pub item: String,
    pub city: String,
    #[serde(default)]
    pub vibe: Option<String>,
    pub scout_query: String,
    pub confidence_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounded_suggestions: Option<Vec<GroundedSuggestion>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySegment {
    /// 1-based.
    pub day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub place_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub summary: String,
    pub video_type: VideoType,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub destination_country: Option<String>,
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub places: Vec<ExtractedPlace>,
    #[serde(default)]
    pub discovery_intent: Option<DiscoveryIntent>,
    #[serde(default)]
    pub itinerary: Option<Vec<DaySegment>>,
}

impl ExtractionResult {
    /// Location string used as the batch-wide enrichment hint.
    #[must_use]
    pub fn location_hint(&self) -> Option<String> {
        match (&self.destination, &self.destination_country) {
            (Some(city), Some(country)) if !city.contains(country.as_str()) => {
                Some(format!("{city}, {country}"))
            }
            (Some(city), _) => Some(city.clone()),
            (None, Some(country)) => Some(country.clone()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Provider photo resource name.
    pub reference: String,
    #[serde(default)]
    pub width_px: Option<u32>,
    #[serde(default)]
    pub height_px: Option<u32>,
    #[serde(default)]
    pub attribution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// Provider-side detail record for a single place id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetails {
    pub place_id: String,
    pub display_name: Option<String>,
    pub rating: Option<f64>,
    pub rating_count: Option<u32>,
    pub price_level: Option<String>,
    pub formatted_address: Option<String>,
    pub address_components: Vec<AddressComponent>,
    pub photos: Vec<Photo>,
    pub opening_hours: Option<Vec<String>>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub primary_type: Option<String>,
    pub types: Vec<String>,
    pub website: Option<String>,
    pub google_maps_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedPlace {
    #[serde(flatten)]
    pub place: ExtractedPlace,
    #[serde(default)]
    pub provider_place_id: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub rating_count: Option<u32>,
    #[serde(default)]
    pub price_level: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub area_name: Option<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default)]
    pub opening_hours: Option<Vec<String>>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub google_maps_uri: Option<String>,
}

impl EnrichedPlace {
    /// Wrap an extracted place with no provider data attached.
    #[must_use]
    pub fn unenriched(place: ExtractedPlace) -> Self {
        Self {
            place,
            provider_place_id: None,
            rating: None,
            rating_count: None,
            price_level: None,
            formatted_address: None,
            area_name: None,
            photos: Vec::new(),
            opening_hours: None,
            lat: None,
            lng: None,
            website: None,
            google_maps_uri: None,
        }
    }

    #[must_use]
    pub fn is_enriched(&self) -> bool {
        self.provider_place_id.is_some()
    }
}

/// Content gathered by a source fetcher. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContent {
    pub title: Option<String>,
    pub description_text: Option<String>,
    pub transcript_text: Option<String>,
    pub caption_text: Option<String>,
    pub media_url: Option<String>,
    pub author_name: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl RawContent {
    /// Fill every field still missing in `self` from `other`. Present fields are kept.
    pub fn merge_from(&mut self, other: RawContent) {
        fn fill(slot: &mut Option<String>, value: Option<String>) {
            if slot.as_deref().is_none_or(|s| s.trim().is_empty()) {
                if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                    *slot = Some(v);
                }
            }
        }

        fill(&mut self.title, other.title);
        fill(&mut self.description_text, other.description_text);
        fill(&mut self.transcript_text, other.transcript_text);
        fill(&mut self.caption_text, other.caption_text);
        fill(&mut self.media_url, other.media_url);
        fill(&mut self.author_name, other.author_name);
        fill(&mut self.thumbnail_url, other.thumbnail_url);
    }

    /// Whether a transcript or caption is present and non-blank.
    #[must_use]
    pub fn has_transcript_or_caption(&self) -> bool {
        [&self.transcript_text, &self.caption_text]
            .into_iter()
            .any(|t| t.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }

    /// Character count of the longer of transcript and caption.
    #[must_use]
    pub fn primary_text_chars(&self) -> usize {
        [&self.transcript_text, &self.caption_text]
            .into_iter()
            .filter_map(|t| t.as_deref())
            .map(|s| s.trim().chars().count())
            .max()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn description_chars(&self) -> usize {
        self.description_text
            .as_deref()
            .map_or(0, |s| s.trim().chars().count())
    }

    /// All text signals joined into one labelled prompt body.
    #[must_use]
    pub fn combined_text(&self) -> String {
        let sections = [
            ("Title", &self.title),
            ("Description", &self.description_text),
            ("Caption", &self.caption_text),
            ("Transcript", &self.transcript_text),
        ];

        sections
            .into_iter()
            .filter_map(|(label, value)| {
                value
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(|v| format!("{label}:\n{v}"))
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Metadata passed alongside text or media into extraction prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionContext {
    pub platform: Platform,
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub description: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// A page URL the model provider can resolve on its own (YouTube).
    PlatformUrl,
    /// A direct media file URL that must be downloaded before upload.
    DirectUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub platform: Platform,
    pub url: String,
    pub kind: MediaKind,
}

/// One persisted extraction result, keyed by `(platform, external_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub platform: Platform,
    pub external_id: String,
    pub url: String,
    pub title: String,
    pub author_name: Option<String>,
    pub thumbnail_url: Option<String>,
    pub transcript_text: Option<String>,
    pub summary: String,
    pub video_type: VideoType,
    pub destination: Option<String>,
    pub destination_country: Option<String>,
    pub duration_days: Option<u32>,
    pub places: Vec<EnrichedPlace>,
    pub discovery_intent: Option<DiscoveryIntent>,
    pub itinerary: Option<Vec<DaySegment>>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub hit_count: i64,
    pub last_hit_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    #[must_use]
    pub fn source(&self) -> SourceReference {
        SourceReference {
            platform: self.platform,
            external_id: self.external_id.clone(),
            url: self.url.clone(),
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Expiry timestamp for a TTL given in days, relative to `now`.
    #[must_use]
    pub fn expiry_for(ttl_days: Option<u32>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        ttl_days.map(|days| now + Duration::days(i64::from(days)))
    }

    /// Merge a freshly produced entry into the stored one for the same key.
    ///
    /// Optional scalars take the new value when present. `places` is replaced
    /// only by a non-empty list, `discovery_intent` and `itinerary` only by a
    /// present value. Hit accounting and `created_at` stay with the stored row.
    /// A discovery intent never survives alongside places.
    #[must_use]
    pub fn merged_with(
        self,
        incoming: CacheEntry,
        ttl_days: Option<u32>,
        now: DateTime<Utc>,
    ) -> CacheEntry {
        let places = if incoming.places.is_empty() {
            self.places
        } else {
            incoming.places
        };
        let discovery_intent = if places.is_empty() {
            incoming.discovery_intent.or(self.discovery_intent)
        } else {
            None
        };

        CacheEntry {
            platform: self.platform,
            external_id: self.external_id,
            url: incoming.url,
            title: if incoming.title.trim().is_empty() {
                self.title
            } else {
                incoming.title
            },
            author_name: incoming.author_name.or(self.author_name),
            thumbnail_url: incoming.thumbnail_url.or(self.thumbnail_url),
            transcript_text: incoming.transcript_text.or(self.transcript_text),
            summary: if incoming.summary.trim().is_empty() {
                self.summary
            } else {
                incoming.summary
            },
            video_type: incoming.video_type,
            destination: incoming.destination.or(self.destination),
            destination_country: incoming.destination_country.or(self.destination_country),
            duration_days: incoming.duration_days.or(self.duration_days),
            places,
            discovery_intent,
            itinerary: incoming.itinerary.or(self.itinerary),
            created_at: self.created_at,
            expires_at: Self::expiry_for(ttl_days, now).or(self.expires_at),
            hit_count: self.hit_count,
            last_hit_at: self.last_hit_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_cached: i64,
    pub total_hits: i64,
}

/// The inbound operation's return value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedContent {
    pub summary: String,
    pub video_type: VideoType,
    pub destination: Option<String>,
    pub destination_country: Option<String>,
    pub duration_days: Option<u32>,
    pub places: Vec<EnrichedPlace>,
    pub discovery_intent: Option<DiscoveryIntent>,
    pub itinerary: Option<Vec<DaySegment>>,
    pub cached: bool,
    pub hit_count: i64,
    pub source: SourceReference,
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl ProcessedContent {
    #[must_use]
    pub fn from_entry(entry: CacheEntry, cached: bool) -> Self {
        let source = entry.source();
        Self {
            summary: entry.summary,
            video_type: entry.video_type,
            destination: entry.destination,
            destination_country: entry.destination_country,
            duration_days: entry.duration_days,
            places: entry.places,
            discovery_intent: entry.discovery_intent,
            itinerary: entry.itinerary,
            cached,
            hit_count: entry.hit_count,
            source,
            title: Some(entry.title).filter(|t| !t.is_empty()),
            author_name: entry.author_name,
            thumbnail_url: entry.thumbnail_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(now: DateTime<Utc>) -> CacheEntry {
        CacheEntry {
            platform: Platform::Youtube,
            external_id: "dQw4w9WgXcQ".to_string(),
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            title: "Tokyo in 3 days".to_string(),
            author_name: Some("Traveller".to_string()),
            thumbnail_url: None,
            transcript_text: Some("old transcript".to_string()),
            summary: "old summary".to_string(),
            video_type: VideoType::Guide,
            destination: Some("Tokyo".to_string()),
            destination_country: Some("Japan".to_string()),
            duration_days: Some(3),
            places: vec![EnrichedPlace::unenriched(ExtractedPlace::named(
                "Ichiran Shibuya",
                PlaceCategory::Food,
                "ramen",
            ))],
            discovery_intent: None,
            itinerary: Some(vec![DaySegment {
                day: 1,
                title: None,
                place_names: vec!["Ichiran Shibuya".to_string()],
            }]),
            created_at: now - Duration::days(5),
            expires_at: Some(now + Duration::days(25)),
            hit_count: 7,
            last_hit_at: Some(now - Duration::hours(1)),
        }
    }

    #[test]
    fn merge_keeps_existing_when_incoming_is_null() {
        let now = Utc::now();
        let existing = entry(now);
        let mut incoming = entry(now);
        incoming.destination = None;
        incoming.author_name = None;
        incoming.places.clear();
        incoming.itinerary = None;
        incoming.hit_count = 0;
        incoming.created_at = now;

        let merged = existing.clone().merged_with(incoming, None, now);
        assert_eq!(merged.destination.as_deref(), Some("Tokyo"));
        assert_eq!(merged.author_name.as_deref(), Some("Traveller"));
        assert_eq!(merged.places.len(), 1);
        assert!(merged.itinerary.is_some());
        assert_eq!(merged.hit_count, 7);
        assert_eq!(merged.created_at, existing.created_at);
        assert_eq!(merged.expires_at, existing.expires_at);
    }

    #[test]
    fn merge_overwrites_with_non_null_values() {
        let now = Utc::now();
        let existing = entry(now);
        let mut incoming = entry(now);
        incoming.destination = Some("Osaka".to_string());
        incoming.summary = "new summary".to_string();
        incoming.places = vec![
            EnrichedPlace::unenriched(ExtractedPlace::named("Dotonbori", PlaceCategory::Sight, "")),
            EnrichedPlace::unenriched(ExtractedPlace::named("Kuromon", PlaceCategory::Food, "")),
        ];

        let merged = existing.merged_with(incoming, Some(30), now);
        assert_eq!(merged.destination.as_deref(), Some("Osaka"));
        assert_eq!(merged.summary, "new summary");
        assert_eq!(merged.places.len(), 2);
        assert_eq!(merged.expires_at, Some(now + Duration::days(30)));
    }

    #[test]
    fn merge_drops_intent_when_places_survive() {
        let now = Utc::now();
        let existing = entry(now);
        let mut incoming = entry(now);
        incoming.places.clear();
        incoming.discovery_intent = Some(DiscoveryIntent {
            intent_type: "food".to_string(),
            item: "ramen".to_string(),
            city: "Tokyo".to_string(),
            vibe: None,
            scout_query: "best ramen in Tokyo".to_string(),
            confidence_score: 0.8,
            grounded_suggestions: None,
        });

        let merged = existing.merged_with(incoming, None, now);
        assert_eq!(merged.places.len(), 1);
        assert!(merged.discovery_intent.is_none());
    }

    #[test]
    fn expiry_is_inclusive_of_now() {
        let now = Utc::now();
        let mut e = entry(now);
        e.expires_at = Some(now);
        assert!(e.is_expired(now));
        e.expires_at = None;
        assert!(!e.is_expired(now + Duration::days(10_000)));
    }

    #[test]
    fn raw_content_merge_fills_only_missing_fields() {
        let mut acc = RawContent {
            title: Some("First".to_string()),
            author_name: Some("   ".to_string()),
            ..RawContent::default()
        };
        acc.merge_from(RawContent {
            title: Some("Second".to_string()),
            author_name: Some("Author".to_string()),
            thumbnail_url: Some("https://img".to_string()),
            ..RawContent::default()
        });
        assert_eq!(acc.title.as_deref(), Some("First"));
        assert_eq!(acc.author_name.as_deref(), Some("Author"));
        assert_eq!(acc.thumbnail_url.as_deref(), Some("https://img"));
    }

    #[test]
    fn primary_text_chars_counts_characters_not_bytes() {
        let raw = RawContent {
            caption_text: Some("ラーメン".to_string()),
            ..RawContent::default()
        };
        assert_eq!(raw.primary_text_chars(), 4);
        assert!(raw.has_transcript_or_caption());
    }

    #[test]
    fn category_labels_are_lenient() {
        assert_eq!(PlaceCategory::from_label("Food"), PlaceCategory::Food);
        assert_eq!(PlaceCategory::from_label("restaurant"), PlaceCategory::Food);
        assert_eq!(PlaceCategory::from_label("spaceport"), PlaceCategory::Other);
    }

    #[test]
    fn enriched_place_serializes_flat() {
        let place = EnrichedPlace::unenriched(ExtractedPlace::named(
            "Louvre",
            PlaceCategory::Sight,
            "museum",
        ));
        let value = serde_json::to_value(&place).expect("serialize");
        assert_eq!(value["name"], "Louvre");
        assert_eq!(value["category"], "sight");
        assert!(value.get("place").is_none());
    }

    #[test]
    fn location_hint_joins_city_and_country() {
        let result = ExtractionResult {
            summary: String::new(),
            video_type: VideoType::Places,
            destination: Some("Lisbon".to_string()),
            destination_country: Some("Portugal".to_string()),
            duration_days: None,
            places: vec![],
            discovery_intent: None,
            itinerary: None,
        };
        assert_eq!(result.location_hint().as_deref(), Some("Lisbon, Portugal"));
    }
}
