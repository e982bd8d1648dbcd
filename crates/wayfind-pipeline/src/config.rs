use wayfind_core::AppConfig;
use wayfind_enrich::EnrichConfig;

const DEFAULT_MIN_TEXT_CHARS: usize = 200;
const DEFAULT_RICH_DESCRIPTION_CHARS: usize = 500;
const DEFAULT_CACHE_TTL_DAYS: u32 = 30;

/// Orchestrator knobs: analysis-path thresholds, cache TTL, enrichment width.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Transcript or caption length above which the text path is taken.
    pub min_text_chars: usize,
    /// Description length that alone justifies the text path.
    pub rich_description_chars: usize,
    /// `None` stores entries without expiry.
    pub cache_ttl_days: Option<u32>,
    pub enrich: EnrichConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
            rich_description_chars: DEFAULT_RICH_DESCRIPTION_CHARS,
            cache_ttl_days: Some(DEFAULT_CACHE_TTL_DAYS),
            enrich: EnrichConfig {
                concurrency: 3,
                call_timeout: std::time::Duration::from_secs(10),
            },
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            min_text_chars: config.min_text_chars,
            rich_description_chars: config.rich_description_chars,
            cache_ttl_days: config.cache_ttl_days,
            enrich: EnrichConfig::from_app_config(config),
        }
    }
}
