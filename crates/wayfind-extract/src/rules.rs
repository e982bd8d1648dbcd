//! Post-decode business rules, re-applied in code whatever the model did:
//! hierarchy collapse, duplicate merging, and the places/intent invariants.

use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};
use wayfind_core::{ExtractedPlace, ExtractionResult, PlaceCategory, VideoType};

/// Lower-case alphanumerics separated by single spaces.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stable dedup key for a place: SHA-256 over the normalized name and
/// location hint. Hex-encoded.
#[must_use]
pub fn place_key(name: &str, location_hint: Option<&str>) -> String {
    let input = format!(
        "{}\x00{}",
        normalize_name(name),
        normalize_name(location_hint.unwrap_or(""))
    );
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

/// Apply every extraction rule to a decoded result.
#[must_use]
pub fn enforce(mut result: ExtractionResult) -> ExtractionResult {
    let (places, renames) = collapse_hierarchy(std::mem::take(&mut result.places));
    let hint = result.location_hint();
    result.places = dedupe_places(places, hint.as_deref());

    if let Some(days) = result.itinerary.as_mut() {
        for day in days.iter_mut() {
            let mut seen = HashSet::new();
            day.place_names = std::mem::take(&mut day.place_names)
                .into_iter()
                .map(|name| {
                    renames
                        .get(&normalize_name(&name))
                        .cloned()
                        .unwrap_or(name)
                })
                .filter(|name| seen.insert(normalize_name(name)))
                .collect();
        }
    }

    if result.video_type == VideoType::Howto {
        result.places.clear();
    }
    if !result.places.is_empty() {
        result.discovery_intent = None;
    }
    result
}

fn merge_tags(into: &mut Vec<String>, from: Vec<String>) {
    for tag in from {
        if !into.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            into.push(tag);
        }
    }
}

fn earliest_day(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, y) => x.or(y),
    }
}

fn fold_child(host: &mut ExtractedPlace, child: ExtractedPlace) {
    let line = if child.description.is_empty() {
        format!("- {}", child.name)
    } else {
        format!("- {}: {}", child.name, child.description)
    };
    if !host.description.is_empty() {
        host.description.push('\n');
    }
    host.description.push_str(&line);
    host.location_hint = host.location_hint.take().or(child.location_hint);
    merge_tags(&mut host.tags, child.tags);
    host.day = earliest_day(host.day, child.day);
}

/// The named complex itself showed up after some of its children were
/// folded into a placeholder.
fn adopt_host(placeholder: &mut ExtractedPlace, host: ExtractedPlace) {
    let itemized = std::mem::take(&mut placeholder.description);
    placeholder.description = if host.description.is_empty() {
        itemized
    } else {
        format!("{}\n{itemized}", host.description)
    };
    placeholder.name = host.name;
    placeholder.category = host.category;
    placeholder.location_hint = host.location_hint.or(placeholder.location_hint.take());
    placeholder.cuisine_type = host.cuisine_type;
    placeholder.place_type = host.place_type;
    merge_tags(&mut placeholder.tags, host.tags);
    placeholder.day = earliest_day(placeholder.day, host.day);
}

/// Outermost collapsing ancestor of `key`, following extracted places'
/// own parents. Stops on a cycle.
fn outermost<'a>(
    key: &'a str,
    parent_of: &'a HashMap<String, String>,
    collapsing: &HashSet<String>,
) -> &'a str {
    let mut current = key;
    let mut seen: HashSet<&str> = HashSet::from([key]);
    while let Some(next) = parent_of.get(current) {
        if !collapsing.contains(next) || !seen.insert(next.as_str()) {
            break;
        }
        current = next.as_str();
    }
    current
}

/// Collapse sub-locations into the complex they sit in.
///
/// A `parentLocation` group collapses when it has two or more children, or
/// when the parent itself was also extracted. Nested groups resolve to the
/// outermost collapsing ancestor, so a stall in a food court in a mall ends
/// up in the mall. Returns the collapsed list and a map from each folded
/// child's normalized name to the name it was folded into.
pub(crate) fn collapse_hierarchy(
    places: Vec<ExtractedPlace>,
) -> (Vec<ExtractedPlace>, HashMap<String, String>) {
    let name_keys: Vec<String> = places.iter().map(|p| normalize_name(&p.name)).collect();
    let parent_keys: Vec<Option<String>> = places
        .iter()
        .zip(&name_keys)
        .map(|(p, name_key)| {
            p.parent_location
                .as_deref()
                .map(normalize_name)
                .filter(|k| !k.is_empty() && k != name_key)
        })
        .collect();

    let mut child_counts: HashMap<&str, usize> = HashMap::new();
    let mut parent_names: HashMap<&str, String> = HashMap::new();
    for (place, key) in places.iter().zip(&parent_keys) {
        if let (Some(key), Some(name)) = (key, place.parent_location.as_deref()) {
            *child_counts.entry(key.as_str()).or_default() += 1;
            parent_names
                .entry(key.as_str())
                .or_insert_with(|| name.trim().to_owned());
        }
    }
    let extracted: HashSet<&str> = name_keys.iter().map(String::as_str).collect();
    let collapsing: HashSet<String> = child_counts
        .iter()
        .filter(|(key, count)| **count >= 2 || extracted.contains(**key))
        .map(|(key, _)| (*key).to_owned())
        .collect();

    let mut parent_of: HashMap<String, String> = HashMap::new();
    for (name_key, parent_key) in name_keys.iter().zip(&parent_keys) {
        if let Some(parent_key) = parent_key {
            parent_of
                .entry(name_key.clone())
                .or_insert_with(|| parent_key.clone());
        }
    }
    let targets: Vec<Option<String>> = name_keys
        .iter()
        .zip(&parent_keys)
        .map(|(name_key, parent_key)| {
            let parent_key = parent_key.as_deref().filter(|k| collapsing.contains(*k))?;
            let target = outermost(parent_key, &parent_of, &collapsing);
            (target != name_key.as_str()).then(|| target.to_owned())
        })
        .collect();

    let mut out: Vec<ExtractedPlace> = Vec::with_capacity(places.len());
    let mut host_index: HashMap<String, usize> = HashMap::new();
    let mut folded_children: Vec<(String, usize)> = Vec::new();

    for ((place, name_key), target) in places.into_iter().zip(name_keys.iter()).zip(targets) {
        match target {
            Some(key) => {
                let idx = match host_index.get(&key) {
                    Some(&idx) => idx,
                    None => {
                        let parent_name = parent_names
                            .get(key.as_str())
                            .map_or(key.as_str(), String::as_str);
                        let mut placeholder =
                            ExtractedPlace::named(parent_name, place.category, "");
                        placeholder.location_hint.clone_from(&place.location_hint);
                        out.push(placeholder);
                        host_index.insert(key, out.len() - 1);
                        out.len() - 1
                    }
                };
                folded_children.push((name_key.clone(), idx));
                fold_child(&mut out[idx], place);
            }
            None if collapsing.contains(name_key) => match host_index.get(name_key) {
                Some(&idx) => adopt_host(&mut out[idx], place),
                None => {
                    host_index.insert(name_key.clone(), out.len());
                    out.push(place);
                }
            },
            None => out.push(place),
        }
    }

    let renames = folded_children
        .into_iter()
        .map(|(child_key, idx)| (child_key, out[idx].name.clone()))
        .collect();
    (out, renames)
}

fn absorb_duplicate(keep: &mut ExtractedPlace, dup: ExtractedPlace) {
    if !dup.description.is_empty() && !keep.description.contains(&dup.description) {
        if keep.description.is_empty() {
            keep.description = dup.description;
        } else {
            keep.description = format!("{} {}", keep.description, dup.description);
        }
    }
    if keep.category == PlaceCategory::Other {
        keep.category = dup.category;
    }
    keep.location_hint = keep.location_hint.take().or(dup.location_hint);
    keep.parent_location = keep.parent_location.take().or(dup.parent_location);
    keep.cuisine_type = keep.cuisine_type.take().or(dup.cuisine_type);
    keep.place_type = keep.place_type.take().or(dup.place_type);
    merge_tags(&mut keep.tags, dup.tags);
    keep.day = earliest_day(keep.day, dup.day);
}

/// Merge repeated mentions of the same place, keeping first-mention order.
pub(crate) fn dedupe_places(
    places: Vec<ExtractedPlace>,
    location_hint: Option<&str>,
) -> Vec<ExtractedPlace> {
    let mut out: Vec<ExtractedPlace> = Vec::with_capacity(places.len());
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for place in places {
        let key = place_key(&place.name, location_hint);
        match index_by_key.get(&key) {
            Some(&idx) => absorb_duplicate(&mut out[idx], place),
            None => {
                index_by_key.insert(key, out.len());
                out.push(place);
            }
        }
    }
    out
}
