//! Prompt text for text, vision, metadata-only and grounding calls.

use wayfind_core::{DiscoveryIntent, ExtractionContext};

pub(crate) const EXTRACTION_SYSTEM_PROMPT: &str = "\
You extract real-world places from travel and food content for display on a map.

Classify the content:
- places: a list of specific spots (restaurants, bars, hotels, sights, shops).
- guide: a day-by-day trip plan. Return an itinerary with 1-based day numbers \
and set each place's day.
- howto: practical advice (packing, visas, transport, budgeting). Return zero places.

Rules:
1. Use the official business or landmark name, not a nickname or a dish.
2. Mention each place once. Merge repeated mentions into one entry.
3. When several spots are inside one named complex (a mall, market, food hall, \
resort, airport), return one place for the complex and list the spots in its \
description. Set parentLocation on any place that sits inside a named complex.
4. Always infer destination (city) and destinationCountry, even with zero places.
5. If no specific business is named but the content is clearly about a specific \
food or activity in a specific city, return zero places and a discoveryIntent \
with a scoutQuery such as \"best birria tacos in Los Angeles\". Otherwise \
discoveryIntent is null.
6. category is one of: food, drinks, stay, activity, sight, shopping, \
nightlife, nature, tip, other.

Respond with JSON matching the provided schema and nothing else.";

pub(crate) const GROUNDING_SYSTEM_PROMPT: &str = "\
You suggest well-known venues that match a search goal in a city. Only name \
places you are confident exist. Respond with JSON matching the provided schema.";

fn context_block(context: &ExtractionContext) -> String {
    let mut lines = vec![
        format!("Platform: {}", context.platform.display_name()),
        format!("URL: {}", context.url),
    ];
    if let Some(title) = context.title.as_deref().filter(|t| !t.trim().is_empty()) {
        lines.push(format!("Title: {title}"));
    }
    if let Some(author) = context.author_name.as_deref() {
        lines.push(format!("Author: {author}"));
    }
    lines.join("\n")
}

pub(crate) fn text_prompt(text: &str, context: &ExtractionContext) -> String {
    format!(
        "{}\n\nContent:\n{text}\n\nExtract the places.",
        context_block(context)
    )
}

pub(crate) fn vision_prompt(context: &ExtractionContext) -> String {
    let mut prompt = format!(
        "{}\n\nWatch the attached video. On-screen text (captions, signs, \
         overlays, menus) is as important as speech; read it carefully.",
        context_block(context)
    );
    if let Some(description) = context.description.as_deref().filter(|d| !d.trim().is_empty()) {
        prompt.push_str("\n\nPost description:\n");
        prompt.push_str(description);
    }
    prompt.push_str("\n\nExtract the places.");
    prompt
}

/// Used when the media itself could not be attached.
pub(crate) fn metadata_only_prompt(context: &ExtractionContext) -> String {
    let mut prompt = format!(
        "{}\n\nThe video itself is unavailable. Work only from the metadata above",
        context_block(context)
    );
    match context.description.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(description) => {
            prompt.push_str(" and this description:\n");
            prompt.push_str(description);
        }
        None => prompt.push('.'),
    }
    prompt.push_str("\n\nExtract the places.");
    prompt
}

pub(crate) fn grounding_prompt(intent: &DiscoveryIntent, limit: usize) -> String {
    let mut prompt = format!(
        "Goal: {}\nItem: {}\nCity: {}",
        intent.scout_query, intent.item, intent.city
    );
    if let Some(vibe) = intent.vibe.as_deref() {
        prompt.push_str(&format!("\nVibe: {vibe}"));
    }
    prompt.push_str(&format!(
        "\n\nSuggest up to {limit} well-known places that fit this goal, each \
         with the neighbourhood or area and one sentence on why it fits."
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfind_core::Platform;

    fn context(description: Option<&str>) -> ExtractionContext {
        ExtractionContext {
            platform: Platform::Tiktok,
            title: Some("tacos!!".to_owned()),
            author_name: None,
            description: description.map(str::to_owned),
            url: "https://www.tiktok.com/@t/video/1".to_owned(),
        }
    }

    #[test]
    fn text_prompt_carries_context_and_content() {
        let prompt = text_prompt("We ate at Guisados", &context(None));
        assert!(prompt.contains("Platform: TikTok"));
        assert!(prompt.contains("Title: tacos!!"));
        assert!(prompt.contains("We ate at Guisados"));
    }

    #[test]
    fn metadata_prompt_mentions_missing_video() {
        let prompt = metadata_only_prompt(&context(Some("birria in LA")));
        assert!(prompt.contains("unavailable"));
        assert!(prompt.contains("birria in LA"));
        assert!(metadata_only_prompt(&context(None)).contains("metadata above."));
    }
}
