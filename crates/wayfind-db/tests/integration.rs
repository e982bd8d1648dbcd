//! Offline tests for wayfind-db pool configuration and row decoding.
//! These tests do not require a live database connection.

use chrono::Utc;
use serde_json::json;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use wayfind_core::{AppConfig, Environment, Platform, VideoType};
use wayfind_db::{ContentCacheRow, DbError, PoolConfig};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: Some("postgres://example".to_string()),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        fetch_timeout_secs: 20,
        fetch_user_agent: "ua".to_string(),
        fetch_max_retries: 2,
        fetch_retry_backoff_base_ms: 500,
        residential_proxy_url: None,
        reddit_top_comments: 10,
        gemini_api_key: "key".to_string(),
        model_primary: "primary".to_string(),
        model_fallback: "fallback".to_string(),
        model_base_url: None,
        extract_timeout_secs: 120,
        extract_max_text_bytes: 60_000,
        media_max_bytes: 1024,
        ground_discovery: false,
        google_places_api_key: "key".to_string(),
        places_base_url: None,
        enrich_concurrency: 3,
        enrich_timeout_secs: 10,
        cache_ttl_days: Some(30),
        cache_cleanup_days: 90,
        min_text_chars: 200,
        rich_description_chars: 500,
    }
}

fn row() -> ContentCacheRow {
    ContentCacheRow {
        platform: "reddit".to_string(),
        external_id: "1abc2d".to_string(),
        url: "https://www.reddit.com/comments/1abc2d/".to_string(),
        title: "Best ramen in Tokyo?".to_string(),
        author_name: Some("u/noodles".to_string()),
        thumbnail_url: None,
        transcript_text: None,
        summary: "Thread recommending ramen shops".to_string(),
        video_type: "places".to_string(),
        destination: Some("Tokyo".to_string()),
        destination_country: Some("Japan".to_string()),
        duration_days: None,
        places: json!([{
            "name": "Fuunji",
            "category": "food",
            "description": "Tsukemen near Shinjuku station",
            "tags": ["ramen"],
            "rating": 4.5,
            "photos": []
        }]),
        discovery_intent: None,
        itinerary: None,
        hit_count: 3,
        last_hit_at: None,
        created_at: Utc::now(),
        expires_at: None,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout, std::time::Duration::from_secs(9));
}

#[test]
fn row_decodes_into_cache_entry() {
    let entry = row().into_entry().expect("valid row");
    assert_eq!(entry.platform, Platform::Reddit);
    assert_eq!(entry.video_type, VideoType::Places);
    assert_eq!(entry.places.len(), 1);
    assert_eq!(entry.places[0].place.name, "Fuunji");
    assert_eq!(entry.places[0].rating, Some(4.5));
    assert_eq!(entry.hit_count, 3);
}

#[test]
fn row_with_unknown_platform_is_invalid() {
    let mut bad = row();
    bad.platform = "myspace".to_string();
    assert!(matches!(
        bad.into_entry(),
        Err(DbError::InvalidRow { table: "content_cache", .. })
    ));
}

#[test]
fn row_with_malformed_places_reports_column() {
    let mut bad = row();
    bad.places = json!({"not": "an array"});
    match bad.into_entry() {
        Err(DbError::Json { context, .. }) => assert_eq!(context, "content_cache.places"),
        other => panic!("expected Json error, got {other:?}"),
    }
}
