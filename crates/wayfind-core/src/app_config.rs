use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,

    pub fetch_timeout_secs: u64,
    pub fetch_user_agent: String,
    pub fetch_max_retries: u32,
    pub fetch_retry_backoff_base_ms: u64,
    pub residential_proxy_url: Option<String>,
    pub reddit_top_comments: usize,

    pub gemini_api_key: String,
    pub model_primary: String,
    pub model_fallback: String,
    pub model_base_url: Option<String>,
    pub extract_timeout_secs: u64,
    pub extract_max_text_bytes: usize,
    pub media_max_bytes: u64,
    pub ground_discovery: bool,

    pub google_places_api_key: String,
    pub places_base_url: Option<String>,
    pub enrich_concurrency: usize,
    pub enrich_timeout_secs: u64,

    /// `None` disables automatic expiry.
    pub cache_ttl_days: Option<u32>,
    pub cache_cleanup_days: u32,
    pub min_text_chars: usize,
    pub rich_description_chars: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("fetch_user_agent", &self.fetch_user_agent)
            .field("fetch_max_retries", &self.fetch_max_retries)
            .field(
                "fetch_retry_backoff_base_ms",
                &self.fetch_retry_backoff_base_ms,
            )
            .field(
                "residential_proxy_url",
                &self.residential_proxy_url.as_ref().map(|_| "[redacted]"),
            )
            .field("reddit_top_comments", &self.reddit_top_comments)
            .field("gemini_api_key", &"[redacted]")
            .field("model_primary", &self.model_primary)
            .field("model_fallback", &self.model_fallback)
            .field("model_base_url", &self.model_base_url)
            .field("extract_timeout_secs", &self.extract_timeout_secs)
            .field("extract_max_text_bytes", &self.extract_max_text_bytes)
            .field("media_max_bytes", &self.media_max_bytes)
            .field("ground_discovery", &self.ground_discovery)
            .field("google_places_api_key", &"[redacted]")
            .field("places_base_url", &self.places_base_url)
            .field("enrich_concurrency", &self.enrich_concurrency)
            .field("enrich_timeout_secs", &self.enrich_timeout_secs)
            .field("cache_ttl_days", &self.cache_ttl_days)
            .field("cache_cleanup_days", &self.cache_cleanup_days)
            .field("min_text_chars", &self.min_text_chars)
            .field("rich_description_chars", &self.rich_description_chars)
            .finish()
    }
}
