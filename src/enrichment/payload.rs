//! Boundary parse for loosely-typed enrichment payloads.
//!
//! Raw payloads arrive as arbitrary JSON, often namespaced per wizard step
//! (`{"step_0": {...}, "business_name": "..."}`). They are flattened and then
//! read through a fixed alias table into an [`EnrichmentRecord`]; nothing
//! outside that table reaches the form data.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::schema::fields::{
    AUDIENCE_INDUSTRIES, AUDIENCE_INTERESTS, AUDIENCE_LIFE_STAGES, AUDIENCE_PROFESSIONS,
    BRAND_COLORS, BRAND_PERSONALITY, BRAND_TONE, BRAND_VALUES, BUSINESS_DESCRIPTION,
    BUSINESS_LOCATION, BUSINESS_NAME, BUSINESS_SIZE, COMPETITORS, CONTENT_THEMES, CONTENT_TYPES,
    ENRICHMENT_PLACE_ID, ENRICHMENT_SOURCE, GOAL_TIMELINE, HAS_EXISTING_CONTENT, INDUSTRY, LOGO_URL,
    MARKETING_BUDGET, MEDIA_URLS, PLATFORM_FREQUENCY, PLATFORM_HANDLES, POSTING_FREQUENCY,
    PREFERRED_LANGUAGE, PRICE_POSITIONING, PRIMARY_GOALS, SUCCESS_METRICS, TEAM_SIZE,
    UNIQUE_VALUE_PROPOSITION, VISUAL_STYLE, WEBSITE_URL, WORDS_TO_AVOID,
};
use crate::schema::value::string_items;
use crate::schema::vocab::is_other_sentinel;

type AliasTable = &'static [(&'static str, &'static [&'static str])];

static SCALAR_SOURCES: AliasTable = &[
    (BUSINESS_NAME, &["business_name", "name", "company_name"]),
    (
        BUSINESS_DESCRIPTION,
        &["business_description", "description", "about", "summary"],
    ),
    (WEBSITE_URL, &["website_url", "website", "url"]),
    (
        BUSINESS_LOCATION,
        &["business_location", "location", "formatted_address", "address"],
    ),
    (BUSINESS_SIZE, &["business_size", "company_size"]),
    (GOAL_TIMELINE, &["goal_timeline", "timeline"]),
    (BRAND_TONE, &["brand_tone", "tone", "brand_voice"]),
    (WORDS_TO_AVOID, &["words_to_avoid"]),
    (POSTING_FREQUENCY, &["posting_frequency"]),
    (LOGO_URL, &["logo_url", "logo"]),
    (VISUAL_STYLE, &["visual_style"]),
    (
        UNIQUE_VALUE_PROPOSITION,
        &["unique_value_proposition", "value_proposition", "usp"],
    ),
    (PRICE_POSITIONING, &["price_positioning", "price_level"]),
    (MARKETING_BUDGET, &["marketing_budget", "budget"]),
    (TEAM_SIZE, &["team_size", "employees"]),
    (PREFERRED_LANGUAGE, &["preferred_language", "language"]),
    (ENRICHMENT_PLACE_ID, &["place_id"]),
    (ENRICHMENT_SOURCE, &["enrichment_source"]),
];

static CLOSED_SET_SOURCES: AliasTable = &[
    (
        INDUSTRY,
        &["industry", "industries", "business_type", "category", "categories"],
    ),
    (AUDIENCE_INDUSTRIES, &["audience_industries", "target_industries"]),
];

static OPEN_SET_SOURCES: AliasTable = &[
    (PRIMARY_GOALS, &["primary_goals", "goals", "business_goals"]),
    (SUCCESS_METRICS, &["success_metrics", "metrics"]),
    (CONTENT_TYPES, &["content_types", "content_formats"]),
    (CONTENT_THEMES, &["content_themes", "themes", "topics"]),
    (BRAND_PERSONALITY, &["brand_personality", "personality"]),
    (BRAND_VALUES, &["brand_values", "values"]),
    (COMPETITORS, &["competitors"]),
    (AUDIENCE_INTERESTS, &["audience_interests", "interests"]),
    (AUDIENCE_PROFESSIONS, &["audience_professions", "professions"]),
    (AUDIENCE_LIFE_STAGES, &["audience_life_stages", "life_stages"]),
    (BRAND_COLORS, &["brand_colors", "colors"]),
    (MEDIA_URLS, &["media_urls", "images", "photos"]),
];

static KEYED_SOURCES: AliasTable = &[
    (PLATFORM_FREQUENCY, &["platform_frequency"]),
    (PLATFORM_HANDLES, &["platform_handles", "social_handles"]),
];

static PLATFORM_ALIASES: &[&str] = &[
    "platforms",
    "social_platforms",
    "social_media",
    "social_links",
    "social_profiles",
];
static AGE_ALIASES: &[&str] = &["age_groups", "target_age_groups", "age_ranges", "age_range"];
static AGE_BOUND_ALIASES: &[&str] = &["age_min", "age_max"];
static GENDER_ALIASES: &[&str] = &["gender", "genders", "target_gender"];

/// Typed view of one enrichment payload, keyed by target field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentRecord {
    pub scalars: Vec<(&'static str, String)>,
    pub closed_sets: Vec<(&'static str, Vec<String>)>,
    pub open_sets: Vec<(&'static str, Vec<String>)>,
    pub keyed: Vec<(&'static str, BTreeMap<String, String>)>,
    pub platform_names: Vec<String>,
    pub age_phrases: Vec<String>,
    pub gender_phrases: Vec<String>,
    pub has_existing_content: Option<bool>,
}

impl EnrichmentRecord {
    pub fn from_payload(payload: &Value) -> Self {
        Self::from_flat(&flatten(payload))
    }

    pub fn from_flat(flat: &Map<String, Value>) -> Self {
        let mut record = Self::default();
        for &(target, aliases) in SCALAR_SOURCES {
            if let Some(text) = first_text(flat, aliases) {
                record.scalars.push((target, text));
            }
        }
        for &(target, aliases) in CLOSED_SET_SOURCES {
            let items = collect_items(flat, aliases);
            if !items.is_empty() {
                record.closed_sets.push((target, items));
            }
        }
        for &(target, aliases) in OPEN_SET_SOURCES {
            let items = collect_items(flat, aliases);
            if !items.is_empty() {
                record.open_sets.push((target, items));
            }
        }
        for &(target, aliases) in KEYED_SOURCES {
            let entries = collect_entries(flat, aliases);
            if !entries.is_empty() {
                record.keyed.push((target, entries));
            }
        }
        record.platform_names = collect_platform_names(flat);
        record.age_phrases = collect_items(flat, AGE_ALIASES);
        for alias in AGE_BOUND_ALIASES {
            if let Some(Value::Number(number)) = flat.get(*alias) {
                record.age_phrases.push(number.to_string());
            }
        }
        record.gender_phrases = collect_items(flat, GENDER_ALIASES);
        record.has_existing_content = match flat.get(HAS_EXISTING_CONTENT) {
            Some(Value::Bool(flag)) => Some(*flag),
            _ => None,
        };
        record
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Hoists `stepN`-namespaced maps to the top level.
///
/// Top-level keys are applied last and win over hoisted values with the same
/// name. Non-object payloads flatten to an empty map.
pub fn flatten(payload: &Value) -> Map<String, Value> {
    let mut flat = Map::new();
    let Value::Object(top) = payload else {
        return flat;
    };
    for (key, value) in top {
        if let (true, Value::Object(children)) = (is_step_namespace(key), value) {
            for (child_key, child_value) in children {
                flat.insert(child_key.clone(), child_value.clone());
            }
        }
    }
    for (key, value) in top {
        if is_step_namespace(key) && value.is_object() {
            continue;
        }
        flat.insert(key.clone(), value.clone());
    }
    flat
}

/// Matches `step0`, `step_1`, `Step-2` and similar.
pub fn is_step_namespace(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    let Some(rest) = lower.strip_prefix("step") else {
        return false;
    };
    let digits = rest.trim_start_matches(['_', '-']);
    !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit())
}

fn first_text(flat: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| match flat.get(*alias) {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn collect_items(flat: &Map<String, Value>, aliases: &[&str]) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for alias in aliases {
        let Some(raw) = flat.get(*alias) else {
            continue;
        };
        for item in string_items(raw) {
            if is_other_sentinel(&item) || items.contains(&item) {
                continue;
            }
            items.push(item);
        }
    }
    items
}

fn collect_entries(flat: &Map<String, Value>, aliases: &[&str]) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    for alias in aliases {
        if let Some(Value::Object(map)) = flat.get(*alias) {
            for (key, value) in map {
                if let Value::String(text) = value {
                    if !text.trim().is_empty() {
                        entries
                            .entry(key.clone())
                            .or_insert_with(|| text.trim().to_string());
                    }
                }
            }
        }
    }
    entries
}

/// Platform names may arrive as a list of names/URLs or as a map of
/// `platform -> url`; both keys and values are scanned.
fn collect_platform_names(flat: &Map<String, Value>) -> Vec<String> {
    let mut names = collect_items(flat, PLATFORM_ALIASES);
    for alias in PLATFORM_ALIASES {
        if let Some(Value::Object(map)) = flat.get(*alias) {
            for (key, value) in map {
                names.push(key.clone());
                if let Value::String(text) = value {
                    names.push(text.clone());
                }
            }
        }
    }
    names
}
