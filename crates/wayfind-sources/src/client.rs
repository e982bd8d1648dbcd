//! Shared HTTP plumbing for all source fetchers.

use std::time::Duration;

use reqwest::{Client, Proxy};
use serde::de::DeserializeOwned;
use wayfind_core::AppConfig;

use crate::error::SourceError;
use crate::html::looks_like_bot_challenge;
use crate::retry::retry_with_backoff;

/// Base URLs for every host the fetchers talk to. Overridable so tests can
/// point each fetcher at a mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub youtube: String,
    pub youtube_oembed: String,
    pub tiktok: String,
    pub tiktok_oembed: String,
    pub reddit: String,
    pub instagram: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            youtube: "https://www.youtube.com".to_owned(),
            youtube_oembed: "https://www.youtube.com/oembed".to_owned(),
            tiktok: "https://www.tiktok.com".to_owned(),
            tiktok_oembed: "https://www.tiktok.com/oembed".to_owned(),
            reddit: "https://www.reddit.com".to_owned(),
            instagram: "https://www.instagram.com".to_owned(),
        }
    }
}

impl Endpoints {
    /// Every endpoint rooted at one base URL (for wiremock).
    #[must_use]
    pub fn all_at(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            youtube: base.to_owned(),
            youtube_oembed: format!("{base}/oembed"),
            tiktok: base.to_owned(),
            tiktok_oembed: format!("{base}/tiktok/oembed"),
            reddit: base.to_owned(),
            instagram: base.to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub residential_proxy_url: Option<String>,
    pub reddit_top_comments: usize,
    pub endpoints: Endpoints,
}

impl FetchConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.fetch_timeout_secs,
            user_agent: config.fetch_user_agent.clone(),
            max_retries: config.fetch_max_retries,
            retry_backoff_base_ms: config.fetch_retry_backoff_base_ms,
            residential_proxy_url: config.residential_proxy_url.clone(),
            reddit_top_comments: config.reddit_top_comments,
            endpoints: Endpoints::default(),
        }
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

/// Which client a request goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Direct,
    /// Through the residential proxy when one is configured, otherwise direct.
    Residential,
}

/// HTTP client pair (direct + optional residential proxy) with retry policy.
pub struct HttpFetcher {
    direct: Client,
    residential: Option<Client>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if a `reqwest::Client` cannot be built or
    /// the proxy URL is invalid.
    pub fn new(config: &FetchConfig) -> Result<Self, SourceError> {
        let direct = Self::builder(config).build()?;
        let residential = config
            .residential_proxy_url
            .as_deref()
            .map(|proxy_url| -> Result<Client, SourceError> {
                Ok(Self::builder(config).proxy(Proxy::all(proxy_url)?).build()?)
            })
            .transpose()?;

        Ok(Self {
            direct,
            residential,
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        })
    }

    fn builder(config: &FetchConfig) -> reqwest::ClientBuilder {
        Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
    }

    fn client(&self, route: Route) -> &Client {
        match (route, &self.residential) {
            (Route::Residential, Some(proxied)) => proxied,
            _ => &self.direct,
        }
    }

    /// GET a page as text. HTML that is a bot challenge counts as a failure.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on non-2xx status, network failure after
    /// retries, or a bot-challenge body.
    pub async fn get_text(&self, url: &str, route: Route) -> Result<String, SourceError> {
        let body = self.get_body(url, route, "text/html,application/xhtml+xml,*/*;q=0.8").await?;
        if looks_like_bot_challenge(&body) {
            return Err(SourceError::BotChallenge {
                url: url.to_owned(),
            });
        }
        Ok(body)
    }

    /// GET a resource and decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Deserialize`] if the body does not match `T`,
    /// or any status/network error from the request.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        context: &str,
    ) -> Result<T, SourceError> {
        let body = self.get_body(url, Route::Direct, "application/json").await?;
        serde_json::from_str(&body).map_err(|source| SourceError::Deserialize {
            context: context.to_owned(),
            source,
        })
    }

    async fn get_body(&self, url: &str, route: Route, accept: &str) -> Result<String, SourceError> {
        let client = self.client(route);
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = client
                .get(url)
                .header(reqwest::header::ACCEPT, accept)
                .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                .send()
                .await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(SourceError::RateLimited {
                    url: url.to_owned(),
                    retry_after_secs,
                });
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(SourceError::NotFound {
                    url: url.to_owned(),
                });
            }

            if !status.is_success() {
                return Err(SourceError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            Ok(response.text().await?)
        })
        .await
    }
}
