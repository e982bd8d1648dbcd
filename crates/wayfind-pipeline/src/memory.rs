use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use wayfind_core::{CacheEntry, CacheError, CacheStats, ContentCache, Platform};

/// Process-local [`ContentCache`] with the same hit, merge, and expiry rules
/// as the Postgres store. Used by the CLI's `--memory-cache` and in tests.
#[derive(Debug, Default)]
pub struct MemoryContentCache {
    entries: Mutex<HashMap<(Platform, String), CacheEntry>>,
}

impl MemoryContentCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw read without hit accounting.
    pub async fn peek(&self, platform: Platform, external_id: &str) -> Option<CacheEntry> {
        self.entries
            .lock()
            .await
            .get(&(platform, external_id.to_owned()))
            .cloned()
    }

    /// Store `entry` verbatim, bypassing the merge.
    pub async fn insert_raw(&self, entry: CacheEntry) {
        let key = (entry.platform, entry.external_id.clone());
        self.entries.lock().await.insert(key, entry);
    }
}

#[async_trait]
impl ContentCache for MemoryContentCache {
    async fn get(
        &self,
        platform: Platform,
        external_id: &str,
    ) -> Result<Option<CacheEntry>, CacheError> {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.get_mut(&(platform, external_id.to_owned())) else {
            return Ok(None);
        };
        if entry.is_expired(now) {
            return Ok(None);
        }
        entry.hit_count += 1;
        entry.last_hit_at = Some(now);
        Ok(Some(entry.clone()))
    }

    async fn set(
        &self,
        entry: CacheEntry,
        ttl_days: Option<u32>,
    ) -> Result<CacheEntry, CacheError> {
        let now = Utc::now();
        let key = (entry.platform, entry.external_id.clone());
        let mut entries = self.entries.lock().await;

        let stored = match entries.remove(&key) {
            Some(existing) if !existing.is_expired(now) => {
                existing.merged_with(entry, ttl_days, now)
            }
            _ => CacheEntry {
                expires_at: CacheEntry::expiry_for(ttl_days, now),
                ..entry
            },
        };
        entries.insert(key, stored.clone());
        Ok(stored)
    }

    async fn cleanup(&self, older_than_days: u32) -> Result<u64, CacheError> {
        let now = Utc::now();
        let cutoff = now - Duration::days(i64::from(older_than_days));
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now) && e.created_at >= cutoff);
        Ok(u64::try_from(before - entries.len()).unwrap_or(u64::MAX))
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let entries = self.entries.lock().await;
        Ok(CacheStats {
            total_cached: i64::try_from(entries.len()).unwrap_or(i64::MAX),
            total_hits: entries.values().map(|e| e.hit_count).sum(),
        })
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
