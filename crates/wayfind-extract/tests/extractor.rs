//! Integration tests for `GeminiExtractor` against a wiremock model endpoint.

use base64::Engine;
use serde_json::json;
use wayfind_core::{
    AiExtractionService, ExtractionContext, MediaKind, MediaRef, Platform, VideoType,
};
use wayfind_extract::{ExtractConfig, GeminiExtractor};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRIMARY: &str = "/models/gemini-primary:generateContent";
const FALLBACK: &str = "/models/gemini-fallback:generateContent";

fn config(base_url: &str, ground_discovery: bool) -> ExtractConfig {
    ExtractConfig {
        api_key: "test-key".to_owned(),
        primary_model: "gemini-primary".to_owned(),
        fallback_model: "gemini-fallback".to_owned(),
        base_url: Some(base_url.to_owned()),
        timeout_secs: 5,
        max_text_bytes: 60_000,
        media_max_bytes: 1024,
        ground_discovery,
    }
}

fn extractor(base_url: &str) -> GeminiExtractor {
    GeminiExtractor::new(&config(base_url, false)).expect("extractor construction should not fail")
}

fn context(platform: Platform) -> ExtractionContext {
    ExtractionContext {
        platform,
        title: Some("Eating through Tokyo".to_owned()),
        author_name: Some("Wander Often".to_owned()),
        description: None,
        url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_owned(),
    }
}

fn model_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    }))
}

fn one_place_result() -> String {
    json!({
        "summary": "Ramen crawl in Shinjuku",
        "videoType": "places",
        "destination": "Tokyo",
        "destinationCountry": "Japan",
        "durationDays": null,
        "places": [{
            "name": "Fuunji",
            "category": "food",
            "description": "Tsukemen with a long queue",
            "locationHint": "Shinjuku",
            "parentLocation": null,
            "cuisineType": "ramen",
            "placeType": null,
            "tags": ["tsukemen"],
            "day": null
        }],
        "discoveryIntent": null,
        "itinerary": null
    })
    .to_string()
}

fn intent_result() -> String {
    json!({
        "summary": "Street tacos in LA, no spot named",
        "videoType": "places",
        "destination": "Los Angeles",
        "destinationCountry": "United States",
        "durationDays": null,
        "places": [],
        "discoveryIntent": {
            "type": "food",
            "item": "birria tacos",
            "city": "Los Angeles",
            "vibe": "late night",
            "scoutQuery": "best birria tacos in Los Angeles",
            "confidenceScore": 0.85
        },
        "itinerary": null
    })
    .to_string()
}

#[tokio::test]
async fn text_extraction_uses_primary_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRIMARY))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_string_contains("Fuunji is worth the wait"))
        .respond_with(model_reply(&one_place_result()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(FALLBACK))
        .respond_with(model_reply(&one_place_result()))
        .expect(0)
        .mount(&server)
        .await;

    let result = extractor(&server.uri())
        .extract_text("Fuunji is worth the wait", &context(Platform::Youtube))
        .await
        .expect("extraction");

    assert_eq!(result.video_type, VideoType::Places);
    assert_eq!(result.places.len(), 1);
    assert_eq!(result.places[0].name, "Fuunji");
    assert_eq!(result.places[0].cuisine_type.as_deref(), Some("ramen"));
    assert!(result.discovery_intent.is_none());
}

#[tokio::test]
async fn primary_failure_retries_once_on_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRIMARY))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(FALLBACK))
        .respond_with(model_reply(&format!("```json\n{}\n```", one_place_result())))
        .expect(1)
        .mount(&server)
        .await;

    let result = extractor(&server.uri())
        .extract_text("ramen", &context(Platform::Youtube))
        .await
        .expect("fallback should succeed");
    assert_eq!(result.places[0].name, "Fuunji");
}

#[tokio::test]
async fn two_malformed_responses_surface_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRIMARY))
        .respond_with(model_reply("Sure! Here are the places: Fuunji"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(FALLBACK))
        .respond_with(model_reply("{\"summary\": 3}"))
        .expect(1)
        .mount(&server)
        .await;

    let err = extractor(&server.uri())
        .extract_text("ramen", &context(Platform::Youtube))
        .await
        .expect_err("both attempts malformed");
    assert_eq!(err.attempts, 2);
}

#[tokio::test]
async fn youtube_vision_passes_url_by_reference() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRIMARY))
        .and(body_string_contains("\"fileUri\":\"https://www.youtube.com/shorts/abcdefghijk\""))
        .respond_with(model_reply(&one_place_result()))
        .expect(1)
        .mount(&server)
        .await;

    let media = MediaRef {
        platform: Platform::YoutubeShorts,
        url: "https://www.youtube.com/shorts/abcdefghijk".to_owned(),
        kind: MediaKind::PlatformUrl,
    };
    let result = extractor(&server.uri())
        .extract_vision(&media, &context(Platform::YoutubeShorts))
        .await
        .expect("vision");
    assert_eq!(result.places.len(), 1);
}

#[tokio::test]
async fn tiktok_clip_is_downloaded_and_inlined() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video/tos/clip.mp4"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "video/mp4")
                .set_body_bytes(b"tiktok-clip".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;
    let encoded = base64::engine::general_purpose::STANDARD.encode(b"tiktok-clip");
    Mock::given(method("POST"))
        .and(path(PRIMARY))
        .and(body_string_contains(format!(
            "\"inlineData\":{{\"mimeType\":\"video/mp4\",\"data\":\"{encoded}\"}}"
        )))
        .respond_with(model_reply(&one_place_result()))
        .expect(1)
        .mount(&server)
        .await;

    let media = MediaRef {
        platform: Platform::Tiktok,
        url: format!("{}/video/tos/clip.mp4", server.uri()),
        kind: MediaKind::DirectUrl,
    };
    let result = extractor(&server.uri())
        .extract_vision(&media, &context(Platform::Tiktok))
        .await
        .expect("vision");
    assert_eq!(result.places.len(), 1);
    assert_eq!(result.places[0].name, "Fuunji");
}

#[tokio::test]
async fn unreachable_media_degrades_to_metadata_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video/tos/expired.mp4"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(PRIMARY))
        .and(body_string_contains("The video itself is unavailable"))
        .respond_with(model_reply(&intent_result()))
        .expect(1)
        .mount(&server)
        .await;

    let media = MediaRef {
        platform: Platform::Tiktok,
        url: format!("{}/video/tos/expired.mp4", server.uri()),
        kind: MediaKind::DirectUrl,
    };
    let result = extractor(&server.uri())
        .extract_vision(&media, &context(Platform::Tiktok))
        .await
        .expect("metadata-only extraction");

    assert!(result.places.is_empty());
    let intent = result.discovery_intent.expect("intent");
    assert_eq!(intent.scout_query, "best birria tacos in Los Angeles");
    assert!(intent.grounded_suggestions.is_none());
}

#[tokio::test]
async fn grounding_attaches_unverified_suggestions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRIMARY))
        .and(body_string_contains("Extract the places"))
        .respond_with(model_reply(&intent_result()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(PRIMARY))
        .and(body_string_contains("Suggest up to 3"))
        .respond_with(model_reply(
            &json!({"suggestions": [
                {"name": "Teddy's Red Tacos", "areaHint": "Venice", "rationale": "birria specialist"}
            ]})
            .to_string(),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let extractor =
        GeminiExtractor::new(&config(&server.uri(), true)).expect("extractor construction");
    let result = extractor
        .extract_text("birria tacos at 2am in LA", &context(Platform::Tiktok))
        .await
        .expect("extraction");

    let suggestions = result
        .discovery_intent
        .and_then(|i| i.grounded_suggestions)
        .expect("suggestions");
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].name, "Teddy's Red Tacos");
    assert!(!suggestions[0].verified);
}
