//! Database operations for the `content_cache` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use wayfind_core::{
    CacheEntry, CacheError, CacheStats, ContentCache, DaySegment, DiscoveryIntent, EnrichedPlace,
    Platform, VideoType,
};

use crate::DbError;

const COLUMNS: &str = "platform, external_id, url, title, author_name, thumbnail_url, \
     transcript_text, summary, video_type, destination, destination_country, duration_days, \
     places, discovery_intent, itinerary, hit_count, last_hit_at, created_at, expires_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `content_cache` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContentCacheRow {
    pub platform: String,
    pub external_id: String,
    pub url: String,
    pub title: String,
    pub author_name: Option<String>,
    pub thumbnail_url: Option<String>,
    pub transcript_text: Option<String>,
    pub summary: String,
    pub video_type: String,
    pub destination: Option<String>,
    pub destination_country: Option<String>,
    pub duration_days: Option<i32>,
    pub places: serde_json::Value,
    pub discovery_intent: Option<serde_json::Value>,
    pub itinerary: Option<serde_json::Value>,
    pub hit_count: i64,
    pub last_hit_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ContentCacheRow {
    /// Decode the row's text and JSON columns into a domain [`CacheEntry`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRow`] for unknown enum values and
    /// [`DbError::Json`] when a JSON column does not match its domain type.
    pub fn into_entry(self) -> Result<CacheEntry, DbError> {
        let platform: Platform = self.platform.parse().map_err(|_| DbError::InvalidRow {
            table: "content_cache",
            reason: format!("unknown platform \"{}\"", self.platform),
        })?;
        let video_type: VideoType =
            self.video_type
                .parse()
                .map_err(|reason: String| DbError::InvalidRow {
                    table: "content_cache",
                    reason,
                })?;

        let places: Vec<EnrichedPlace> = decode_json(self.places, "content_cache.places")?;
        let discovery_intent: Option<DiscoveryIntent> = self
            .discovery_intent
            .map(|v| decode_json(v, "content_cache.discovery_intent"))
            .transpose()?;
        let itinerary: Option<Vec<DaySegment>> = self
            .itinerary
            .map(|v| decode_json(v, "content_cache.itinerary"))
            .transpose()?;

        Ok(CacheEntry {
            platform,
            external_id: self.external_id,
            url: self.url,
            title: self.title,
            author_name: self.author_name,
            thumbnail_url: self.thumbnail_url,
            transcript_text: self.transcript_text,
            summary: self.summary,
            video_type,
            destination: self.destination,
            destination_country: self.destination_country,
            duration_days: self.duration_days.and_then(|d| u32::try_from(d).ok()),
            places,
            discovery_intent,
            itinerary,
            created_at: self.created_at,
            expires_at: self.expires_at,
            hit_count: self.hit_count,
            last_hit_at: self.last_hit_at,
        })
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
    context: &str,
) -> Result<T, DbError> {
    serde_json::from_value(value).map_err(|source| DbError::Json {
        context: context.to_string(),
        source,
    })
}

fn encode_json<T: serde::Serialize>(value: &T, context: &str) -> Result<serde_json::Value, DbError> {
    serde_json::to_value(value).map_err(|source| DbError::Json {
        context: context.to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Fetch a live row and record the hit in the same statement.
///
/// Expired rows are left untouched and reported as absent.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn get_and_touch_content(
    pool: &PgPool,
    platform: Platform,
    external_id: &str,
) -> Result<Option<ContentCacheRow>, DbError> {
    let sql = format!(
        "UPDATE content_cache \
         SET hit_count = hit_count + 1, last_hit_at = NOW() \
         WHERE platform = $1 AND external_id = $2 \
           AND (expires_at IS NULL OR expires_at > NOW()) \
         RETURNING {COLUMNS}"
    );
    Ok(sqlx::query_as::<_, ContentCacheRow>(&sql)
        .bind(platform.as_str())
        .bind(external_id)
        .fetch_optional(pool)
        .await?)
}

/// Insert or merge a cache entry and return the stored row.
///
/// A row for the same key that has already expired is deleted first, so the
/// new entry starts with fresh hit accounting. For a live row, optional
/// columns use `COALESCE` so a partial result never erases known data;
/// `places` is only replaced by a non-empty array, and a discovery intent is
/// cleared whenever the merged row has places.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure or JSON encoding failure.
pub async fn upsert_content(
    pool: &PgPool,
    entry: &CacheEntry,
    expires_at: Option<DateTime<Utc>>,
) -> Result<ContentCacheRow, DbError> {
    let places = encode_json(&entry.places, "content_cache.places")?;
    let discovery_intent = entry
        .discovery_intent
        .as_ref()
        .map(|v| encode_json(v, "content_cache.discovery_intent"))
        .transpose()?;
    let itinerary = entry
        .itinerary
        .as_ref()
        .map(|v| encode_json(v, "content_cache.itinerary"))
        .transpose()?;
    let duration_days = entry
        .duration_days
        .and_then(|d| i32::try_from(d).ok());

    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM content_cache \
         WHERE platform = $1 AND external_id = $2 \
           AND expires_at IS NOT NULL AND expires_at <= NOW()",
    )
    .bind(entry.platform.as_str())
    .bind(&entry.external_id)
    .execute(&mut *tx)
    .await?;

    let sql = format!(
        "INSERT INTO content_cache \
           (platform, external_id, url, title, author_name, thumbnail_url, transcript_text, \
            summary, video_type, destination, destination_country, duration_days, \
            places, discovery_intent, itinerary, expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
         ON CONFLICT (platform, external_id) DO UPDATE SET \
           url                 = EXCLUDED.url, \
           title               = CASE WHEN BTRIM(EXCLUDED.title) = '' \
                                      THEN content_cache.title ELSE EXCLUDED.title END, \
           author_name         = COALESCE(EXCLUDED.author_name,         content_cache.author_name), \
           thumbnail_url       = COALESCE(EXCLUDED.thumbnail_url,       content_cache.thumbnail_url), \
           transcript_text     = COALESCE(EXCLUDED.transcript_text,     content_cache.transcript_text), \
           summary             = CASE WHEN BTRIM(EXCLUDED.summary) = '' \
                                      THEN content_cache.summary ELSE EXCLUDED.summary END, \
           video_type          = EXCLUDED.video_type, \
           destination         = COALESCE(EXCLUDED.destination,         content_cache.destination), \
           destination_country = COALESCE(EXCLUDED.destination_country, content_cache.destination_country), \
           duration_days       = COALESCE(EXCLUDED.duration_days,       content_cache.duration_days), \
           places              = CASE WHEN jsonb_array_length(EXCLUDED.places) > 0 \
                                      THEN EXCLUDED.places ELSE content_cache.places END, \
           discovery_intent    = CASE WHEN jsonb_array_length(EXCLUDED.places) > 0 \
                                        OR jsonb_array_length(content_cache.places) > 0 \
                                      THEN NULL \
                                      ELSE COALESCE(EXCLUDED.discovery_intent, content_cache.discovery_intent) END, \
           itinerary           = COALESCE(EXCLUDED.itinerary,           content_cache.itinerary), \
           expires_at          = COALESCE(EXCLUDED.expires_at,          content_cache.expires_at), \
           updated_at          = NOW() \
         RETURNING {COLUMNS}"
    );

    let row = sqlx::query_as::<_, ContentCacheRow>(&sql)
        .bind(entry.platform.as_str())
        .bind(&entry.external_id)
        .bind(&entry.url)
        .bind(&entry.title)
        .bind(entry.author_name.as_deref())
        .bind(entry.thumbnail_url.as_deref())
        .bind(entry.transcript_text.as_deref())
        .bind(&entry.summary)
        .bind(entry.video_type.as_str())
        .bind(entry.destination.as_deref())
        .bind(entry.destination_country.as_deref())
        .bind(duration_days)
        .bind(places)
        .bind(discovery_intent)
        .bind(itinerary)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(row)
}

/// Delete expired rows and rows created more than `older_than_days` days ago.
///
/// Returns the number of rows removed.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn cleanup_content_cache(pool: &PgPool, older_than_days: u32) -> Result<u64, DbError> {
    let days = i32::try_from(older_than_days).unwrap_or(i32::MAX);
    let result = sqlx::query(
        "DELETE FROM content_cache \
         WHERE (expires_at IS NOT NULL AND expires_at <= NOW()) \
            OR created_at < NOW() - make_interval(days => $1)",
    )
    .bind(days)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Row count and summed hit count across the whole table.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn content_cache_stats(pool: &PgPool) -> Result<CacheStats, DbError> {
    let (total_cached, total_hits) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*)::BIGINT, COALESCE(SUM(hit_count), 0)::BIGINT FROM content_cache",
    )
    .fetch_one(pool)
    .await?;
    Ok(CacheStats {
        total_cached,
        total_hits,
    })
}

// ---------------------------------------------------------------------------
// ContentCache adapter
// ---------------------------------------------------------------------------

/// Postgres-backed [`ContentCache`].
#[derive(Debug, Clone)]
pub struct PgContentCache {
    pool: PgPool,
}

impl PgContentCache {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ContentCache for PgContentCache {
    async fn get(
        &self,
        platform: Platform,
        external_id: &str,
    ) -> Result<Option<CacheEntry>, CacheError> {
        let row = get_and_touch_content(&self.pool, platform, external_id).await?;
        Ok(row.map(ContentCacheRow::into_entry).transpose()?)
    }

    async fn set(
        &self,
        entry: CacheEntry,
        ttl_days: Option<u32>,
    ) -> Result<CacheEntry, CacheError> {
        let expires_at = CacheEntry::expiry_for(ttl_days, Utc::now());
        let row = upsert_content(&self.pool, &entry, expires_at).await?;
        tracing::debug!(
            platform = %entry.platform,
            external_id = %entry.external_id,
            "content cache row upserted"
        );
        Ok(row.into_entry()?)
    }

    async fn cleanup(&self, older_than_days: u32) -> Result<u64, CacheError> {
        Ok(cleanup_content_cache(&self.pool, older_than_days).await?)
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        Ok(content_cache_stats(&self.pool).await?)
    }
}
