//! Postgres storage for the content cache.

pub mod content_cache;
mod error;
mod pool;

use sqlx::PgPool;

pub use content_cache::{
    cleanup_content_cache, content_cache_stats, get_and_touch_content, upsert_content,
    ContentCacheRow, PgContentCache,
};
pub use error::DbError;
pub use pool::{connect_pool, connect_pool_from_config, health_check, PoolConfig};

// Resolves to <workspace-root>/migrations/ from this crate's manifest.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

async fn applied_migrations(pool: &PgPool) -> i64 {
    // Missing bookkeeping table on a fresh database counts as nothing applied.
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Apply pending migrations and report how many ran.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    let before = applied_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let after = applied_migrations(pool).await;
    let ran = usize::try_from(after.saturating_sub(before)).unwrap_or(0);
    if ran > 0 {
        tracing::info!(ran, total = MIGRATOR.iter().count(), "migrations applied");
    }
    Ok(ran)
}
