//! Wire types for model output, the JSON schema sent with each request, and
//! the strict decode step that turns model text into an `ExtractionResult`.

use std::str::FromStr;

use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use wayfind_core::{
    DaySegment, DiscoveryIntent, ExtractedPlace, ExtractionResult, PlaceCategory, VideoType,
};

use crate::error::ExtractionError;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct WireExtraction {
    /// Two or three sentence summary of the content.
    pub(crate) summary: String,
    /// One of `places`, `guide`, `howto`.
    pub(crate) video_type: String,
    pub(crate) destination: Option<String>,
    pub(crate) destination_country: Option<String>,
    pub(crate) duration_days: Option<u32>,
    pub(crate) places: Vec<WirePlace>,
    pub(crate) discovery_intent: Option<WireIntent>,
    pub(crate) itinerary: Option<Vec<WireDay>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct WirePlace {
    /// Official business or landmark name.
    pub(crate) name: String,
    /// One of food, drinks, stay, activity, sight, shopping, nightlife, nature, tip, other.
    pub(crate) category: String,
    #[serde(default)]
    pub(crate) description: String,
    pub(crate) location_hint: Option<String>,
    /// The named complex this place sits inside, if any.
    pub(crate) parent_location: Option<String>,
    pub(crate) cuisine_type: Option<String>,
    pub(crate) place_type: Option<String>,
    #[serde(default)]
    pub(crate) tags: Vec<String>,
    pub(crate) day: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct WireIntent {
    #[serde(rename = "type")]
    pub(crate) intent_type: String,
    pub(crate) item: String,
    pub(crate) city: String,
    pub(crate) vibe: Option<String>,
    pub(crate) scout_query: String,
    /// Between 0 and 1.
    pub(crate) confidence_score: f64,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct WireDay {
    pub(crate) day: u32,
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) place_names: Vec<String>,
}

/// JSON schema for `T` with every `$ref` inlined and the `definitions`
/// and `$schema` keys removed.
pub(crate) fn response_schema<T: JsonSchema>() -> serde_json::Value {
    let schema = schema_for!(T);
    let mut value = serde_json::to_value(schema).unwrap_or_default();

    let definitions = value.get("definitions").cloned();
    if let Some(defs) = definitions {
        inline_refs(&mut value, &defs);
    }
    if let serde_json::Value::Object(map) = &mut value {
        map.remove("definitions");
        map.remove("$schema");
    }
    value
}

fn inline_refs(value: &mut serde_json::Value, definitions: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(ref_path)) = map.get("$ref").cloned() {
                if let Some(def) = ref_path
                    .strip_prefix("#/definitions/")
                    .and_then(|name| definitions.get(name))
                {
                    *value = def.clone();
                    inline_refs(value, definitions);
                    return;
                }
            }
            for v in map.values_mut() {
                inline_refs(v, definitions);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                inline_refs(item, definitions);
            }
        }
        _ => {}
    }
}

/// Drop one surrounding markdown code fence, if present.
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Decode model text into a validated `ExtractionResult`.
///
/// # Errors
///
/// Returns [`ExtractionError::Decode`] when the text is not JSON of the
/// expected shape, or [`ExtractionError::Invalid`] when it fails validation.
pub(crate) fn decode_extraction(raw: &str) -> Result<ExtractionResult, ExtractionError> {
    let wire: WireExtraction =
        serde_json::from_str(strip_code_fence(raw)).map_err(|source| ExtractionError::Decode {
            context: "extraction result".to_owned(),
            source,
        })?;
    wire.into_result()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl WireExtraction {
    fn into_result(self) -> Result<ExtractionResult, ExtractionError> {
        let video_type = VideoType::from_str(&self.video_type).map_err(ExtractionError::Invalid)?;

        let mut places = Vec::with_capacity(self.places.len());
        for (idx, place) in self.places.into_iter().enumerate() {
            let name = place.name.trim().to_owned();
            if name.is_empty() {
                return Err(ExtractionError::Invalid(format!(
                    "place at index {idx} has an empty name"
                )));
            }
            places.push(ExtractedPlace {
                name,
                category: PlaceCategory::from_label(&place.category),
                description: place.description.trim().to_owned(),
                location_hint: non_blank(place.location_hint),
                parent_location: non_blank(place.parent_location),
                cuisine_type: non_blank(place.cuisine_type),
                place_type: non_blank(place.place_type),
                tags: place
                    .tags
                    .into_iter()
                    .map(|t| t.trim().to_owned())
                    .filter(|t| !t.is_empty())
                    .collect(),
                day: place.day.filter(|d| *d > 0),
            });
        }

        let discovery_intent = match self.discovery_intent {
            Some(intent) => {
                let score = intent.confidence_score;
                if !(0.0..=1.0).contains(&score) {
                    return Err(ExtractionError::Invalid(format!(
                        "confidence score {score} outside [0, 1]"
                    )));
                }
                if intent.scout_query.trim().is_empty() {
                    return Err(ExtractionError::Invalid(
                        "discovery intent without a scout query".to_owned(),
                    ));
                }
                Some(DiscoveryIntent {
                    intent_type: intent.intent_type.trim().to_owned(),
                    item: intent.item.trim().to_owned(),
                    city: intent.city.trim().to_owned(),
                    vibe: non_blank(intent.vibe),
                    scout_query: intent.scout_query.trim().to_owned(),
                    confidence_score: score,
                    grounded_suggestions: None,
                })
            }
            None => None,
        };

        let itinerary = match self.itinerary {
            Some(days) => {
                if let Some(bad) = days.iter().find(|d| d.day == 0) {
                    return Err(ExtractionError::Invalid(format!(
                        "itinerary day {} is not 1-based",
                        bad.day
                    )));
                }
                let days: Vec<DaySegment> = days
                    .into_iter()
                    .map(|d| DaySegment {
                        day: d.day,
                        title: non_blank(d.title),
                        place_names: d.place_names,
                    })
                    .collect();
                Some(days).filter(|d| !d.is_empty())
            }
            None => None,
        };

        Ok(ExtractionResult {
            summary: self.summary.trim().to_owned(),
            video_type,
            destination: non_blank(self.destination),
            destination_country: non_blank(self.destination_country),
            duration_days: self.duration_days.filter(|d| *d > 0),
            places,
            discovery_intent,
            itinerary,
        })
    }
}
