//! Optional second pass that attaches candidate venues to a discovery intent.

use schemars::JsonSchema;
use serde::Deserialize;
use wayfind_core::{DiscoveryIntent, GroundedSuggestion};

use crate::error::ExtractionError;
use crate::gemini::{GeminiClient, Part, StructuredPrompt};
use crate::prompts::{grounding_prompt, GROUNDING_SYSTEM_PROMPT};
use crate::schema::{response_schema, strip_code_fence};

pub const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct WireSuggestions {
    suggestions: Vec<WireSuggestion>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct WireSuggestion {
    name: String,
    area_hint: String,
    rationale: String,
}

pub(crate) async fn ground_intent(
    client: &GeminiClient,
    model: &str,
    intent: &DiscoveryIntent,
) -> Result<Vec<GroundedSuggestion>, ExtractionError> {
    let prompt = StructuredPrompt {
        system: GROUNDING_SYSTEM_PROMPT.to_owned(),
        parts: vec![Part::Text(grounding_prompt(intent, MAX_SUGGESTIONS))],
        schema: response_schema::<WireSuggestions>(),
    };
    let raw = client.generate(model, &prompt).await?;
    parse_suggestions(&raw)
}

fn parse_suggestions(raw: &str) -> Result<Vec<GroundedSuggestion>, ExtractionError> {
    let wire: WireSuggestions =
        serde_json::from_str(strip_code_fence(raw)).map_err(|source| ExtractionError::Decode {
            context: "grounded suggestions".to_owned(),
            source,
        })?;

    Ok(wire
        .suggestions
        .into_iter()
        .filter(|s| !s.name.trim().is_empty())
        .take(MAX_SUGGESTIONS)
        .map(|s| GroundedSuggestion {
            name: s.name.trim().to_owned(),
            area_hint: s.area_hint.trim().to_owned(),
            rationale: s.rationale.trim().to_owned(),
            verified: false,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_and_marks_unverified() {
        let raw = serde_json::json!({"suggestions": [
            {"name": "Guisados", "areaHint": "Boyle Heights", "rationale": "braised tacos"},
            {"name": " ", "areaHint": "", "rationale": ""},
            {"name": "Teddy's Red Tacos", "areaHint": "Venice", "rationale": "birria"},
            {"name": "Birrieria Gonzalez", "areaHint": "Harbor City", "rationale": "consome"},
            {"name": "Extra", "areaHint": "Echo Park", "rationale": "one too many"}
        ]})
        .to_string();
        let suggestions = parse_suggestions(&raw).expect("parse");
        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
        assert!(suggestions.iter().all(|s| !s.verified));
        assert_eq!(suggestions[1].name, "Teddy's Red Tacos");
    }
}
