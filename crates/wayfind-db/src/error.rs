use thiserror::Error;
use wayfind_core::CacheError;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("invalid row in {table}: {reason}")]
    InvalidRow { table: &'static str, reason: String },
    #[error("JSON error for {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<DbError> for CacheError {
    fn from(err: DbError) -> Self {
        if let DbError::Json { context, source } = err {
            CacheError::Serialization { context, source }
        } else {
            CacheError::Backend(err.to_string())
        }
    }
}
