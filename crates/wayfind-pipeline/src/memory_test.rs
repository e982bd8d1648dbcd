use super::*;
use wayfind_core::{EnrichedPlace, ExtractedPlace, PlaceCategory, VideoType};

fn entry(places: &[&str]) -> CacheEntry {
    CacheEntry {
        platform: Platform::Youtube,
        external_id: "dQw4w9WgXcQ".to_owned(),
        url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_owned(),
        title: "Osaka eats".to_owned(),
        author_name: None,
        thumbnail_url: None,
        transcript_text: None,
        summary: "street food".to_owned(),
        video_type: VideoType::Places,
        destination: Some("Osaka".to_owned()),
        destination_country: None,
        duration_days: None,
        places: places
            .iter()
            .map(|n| EnrichedPlace::unenriched(ExtractedPlace::named(*n, PlaceCategory::Food, "")))
            .collect(),
        discovery_intent: None,
        itinerary: None,
        created_at: Utc::now(),
        expires_at: None,
        hit_count: 0,
        last_hit_at: None,
    }
}

#[tokio::test]
async fn get_counts_hits() {
    let cache = MemoryContentCache::new();
    cache.set(entry(&["Kukuru"]), Some(30)).await.unwrap();

    let first = cache.get(Platform::Youtube, "dQw4w9WgXcQ").await.unwrap().unwrap();
    let second = cache.get(Platform::Youtube, "dQw4w9WgXcQ").await.unwrap().unwrap();
    assert_eq!(first.hit_count, 1);
    assert_eq!(second.hit_count, 2);
    assert!(second.last_hit_at.is_some());
    assert!(cache.get(Platform::Tiktok, "dQw4w9WgXcQ").await.unwrap().is_none());
}

#[tokio::test]
async fn expired_entries_read_as_absent_and_are_replaced() {
    let cache = MemoryContentCache::new();
    let mut stale = entry(&["Old Place"]);
    stale.expires_at = Some(Utc::now() - Duration::days(1));
    stale.hit_count = 9;
    cache.insert_raw(stale).await;

    assert!(cache.get(Platform::Youtube, "dQw4w9WgXcQ").await.unwrap().is_none());

    let stored = cache.set(entry(&[]), Some(30)).await.unwrap();
    assert!(stored.places.is_empty());
    assert_eq!(stored.hit_count, 0);
    assert!(stored.expires_at.is_some_and(|at| at > Utc::now()));
}

#[tokio::test]
async fn live_entries_merge_without_losing_places() {
    let cache = MemoryContentCache::new();
    cache.set(entry(&["Kukuru"]), Some(30)).await.unwrap();
    cache.get(Platform::Youtube, "dQw4w9WgXcQ").await.unwrap();

    let mut update = entry(&[]);
    update.summary = "newer summary".to_owned();
    let stored = cache.set(update, None).await.unwrap();

    assert_eq!(stored.places.len(), 1);
    assert_eq!(stored.summary, "newer summary");
    assert_eq!(stored.hit_count, 1);
}

#[tokio::test]
async fn cleanup_drops_expired_and_old_rows() {
    let cache = MemoryContentCache::new();
    let mut old = entry(&["A"]);
    old.created_at = Utc::now() - Duration::days(120);
    cache.insert_raw(old).await;

    let mut expired = entry(&["B"]);
    expired.external_id = "expired0001".to_owned();
    expired.expires_at = Some(Utc::now() - Duration::hours(1));
    cache.insert_raw(expired).await;

    let mut fresh = entry(&["C"]);
    fresh.external_id = "fresh000001".to_owned();
    cache.insert_raw(fresh).await;

    assert_eq!(cache.cleanup(90).await.unwrap(), 2);
    let stats = cache.stats().await.unwrap();
    assert_eq!(stats.total_cached, 1);
}
