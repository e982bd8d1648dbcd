use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = optional("DATABASE_URL");
    let env = parse_environment(&or_default("WAYFIND_ENV", "development"))?;

    let bind_addr: SocketAddr = parse_var(&lookup, "WAYFIND_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("WAYFIND_LOG_LEVEL", "info");

    let db_max_connections = parse_var(&lookup, "WAYFIND_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_var(&lookup, "WAYFIND_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_var(&lookup, "WAYFIND_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let fetch_timeout_secs = parse_var(&lookup, "WAYFIND_FETCH_TIMEOUT_SECS", "20")?;
    let fetch_user_agent = or_default("WAYFIND_FETCH_USER_AGENT", DEFAULT_USER_AGENT);
    let fetch_max_retries = parse_var(&lookup, "WAYFIND_FETCH_MAX_RETRIES", "2")?;
    let fetch_retry_backoff_base_ms =
        parse_var(&lookup, "WAYFIND_FETCH_RETRY_BACKOFF_BASE_MS", "500")?;
    let residential_proxy_url = optional("WAYFIND_RESIDENTIAL_PROXY_URL");
    let reddit_top_comments = parse_var(&lookup, "WAYFIND_REDDIT_TOP_COMMENTS", "10")?;

    let gemini_api_key = require("GEMINI_API_KEY")?;
    let model_primary = or_default("WAYFIND_MODEL_PRIMARY", "gemini-2.5-flash");
    let model_fallback = or_default("WAYFIND_MODEL_FALLBACK", "gemini-2.5-flash-lite");
    let model_base_url = optional("WAYFIND_MODEL_BASE_URL");
    let extract_timeout_secs = parse_var(&lookup, "WAYFIND_EXTRACT_TIMEOUT_SECS", "120")?;
    let extract_max_text_bytes = parse_var(&lookup, "WAYFIND_EXTRACT_MAX_TEXT_BYTES", "60000")?;
    let media_max_bytes = parse_var(&lookup, "WAYFIND_MEDIA_MAX_BYTES", "20971520")?;
    let ground_discovery = parse_bool(
        "WAYFIND_GROUND_DISCOVERY",
        &or_default("WAYFIND_GROUND_DISCOVERY", "false"),
    )?;

    let google_places_api_key = require("GOOGLE_PLACES_API_KEY")?;
    let places_base_url = optional("WAYFIND_PLACES_BASE_URL");
    let enrich_concurrency: usize = parse_var(&lookup, "WAYFIND_ENRICH_CONCURRENCY", "3")?;
    let enrich_timeout_secs = parse_var(&lookup, "WAYFIND_ENRICH_TIMEOUT_SECS", "10")?;

    let cache_ttl_days: u32 = parse_var(&lookup, "WAYFIND_CACHE_TTL_DAYS", "30")?;
    let cache_cleanup_days = parse_var(&lookup, "WAYFIND_CACHE_CLEANUP_DAYS", "90")?;
    let min_text_chars = parse_var(&lookup, "WAYFIND_MIN_TEXT_CHARS", "200")?;
    let rich_description_chars = parse_var(&lookup, "WAYFIND_RICH_DESCRIPTION_CHARS", "500")?;

    if enrich_concurrency == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "WAYFIND_ENRICH_CONCURRENCY".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        fetch_timeout_secs,
        fetch_user_agent,
        fetch_max_retries,
        fetch_retry_backoff_base_ms,
        residential_proxy_url,
        reddit_top_comments,
        gemini_api_key,
        model_primary,
        model_fallback,
        model_base_url,
        extract_timeout_secs,
        extract_max_text_bytes,
        media_max_bytes,
        ground_discovery,
        google_places_api_key,
        places_base_url,
        enrich_concurrency,
        enrich_timeout_secs,
        cache_ttl_days: (cache_ttl_days > 0).then_some(cache_ttl_days),
        cache_cleanup_days,
        min_text_chars,
        rich_description_chars,
    })
}

/// Parse `var` (or `default` when unset) into any `FromStr` type.
fn parse_var<F, T>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got \"{other}\""),
        }),
    }
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "WAYFIND_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
