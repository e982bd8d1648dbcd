use std::fmt::Write as _;
use std::sync::Arc;

use wayfind_core::{AppConfig, ContentCache, EnrichedPlace, ProcessedContent};
use wayfind_db::PgContentCache;
use wayfind_pipeline::{MemoryContentCache, Pipeline, PipelineError};

/// Run one URL through the pipeline and print the result.
///
/// # Errors
///
/// Returns an error if the cache or clients cannot be built, or if the
/// pipeline rejects the URL or fails extraction.
pub(crate) async fn run_process(
    config: &AppConfig,
    url: &str,
    memory_cache: bool,
    json: bool,
) -> anyhow::Result<()> {
    let cache: Arc<dyn ContentCache> = if memory_cache {
        Arc::new(MemoryContentCache::new())
    } else {
        let pool = wayfind_db::connect_pool_from_config(config).await?;
        Arc::new(PgContentCache::new(pool))
    };
    let pipeline = Pipeline::from_app_config(config, cache)?;

    let processed = match pipeline.process_content(url).await {
        Ok(p) => p,
        Err(PipelineError::InvalidSource(e)) => anyhow::bail!("{e}"),
        Err(e) => {
            tracing::error!(error = %e, "processing failed");
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&processed)?);
    } else {
        print!("{}", render_summary(&processed));
    }
    Ok(())
}

fn render_place(out: &mut String, index: usize, place: &EnrichedPlace) {
    let p = &place.place;
    let _ = write!(out, "{:>3}. {} [{}]", index + 1, p.name, p.category);
    if let Some(area) = place.area_name.as_deref().or(p.location_hint.as_deref()) {
        let _ = write!(out, " - {area}");
    }
    if let Some(rating) = place.rating {
        let _ = write!(out, " ({rating:.1}");
        if let Some(count) = place.rating_count {
            let _ = write!(out, ", {count} reviews");
        }
        out.push(')');
    }
    out.push('\n');
    if !p.description.is_empty() {
        let _ = writeln!(out, "     {}", p.description);
    }
}

/// Plain-text summary for terminal output.
pub(crate) fn render_summary(processed: &ProcessedContent) -> String {
    let mut out = String::new();
    let title = processed.title.as_deref().unwrap_or("(untitled)");
    let _ = writeln!(
        out,
        "{title} [{} {}]",
        processed.source.platform.display_name(),
        processed.source.external_id
    );
    let _ = writeln!(
        out,
        "type: {}{}",
        processed.video_type,
        if processed.cached {
            format!(" (cached, {} hits)", processed.hit_count)
        } else {
            String::new()
        }
    );
    if let Some(destination) = processed.destination.as_deref() {
        match processed.destination_country.as_deref() {
            Some(country) => {
                let _ = writeln!(out, "destination: {destination}, {country}");
            }
            None => {
                let _ = writeln!(out, "destination: {destination}");
            }
        }
    }
    if !processed.summary.is_empty() {
        let _ = writeln!(out, "\n{}", processed.summary);
    }

    if let Some(intent) = &processed.discovery_intent {
        let _ = writeln!(out, "\nno named places; search for: {}", intent.scout_query);
        for suggestion in intent.grounded_suggestions.iter().flatten() {
            let _ = writeln!(
                out,
                "  - {} ({}, unverified)",
                suggestion.name, suggestion.area_hint
            );
        }
        return out;
    }

    let enriched = processed.places.iter().filter(|p| p.is_enriched()).count();
    let _ = writeln!(
        out,
        "\nplaces: {} ({enriched} enriched)",
        processed.places.len()
    );
    for (i, place) in processed.places.iter().enumerate() {
        render_place(&mut out, i, place);
    }
    out
}
