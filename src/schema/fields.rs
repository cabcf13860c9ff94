//! Static description of every onboarding field.
//!
//! The table is fixed at build time: identity, value shape, owning step and
//! default value. `FormData` relies on it to keep every field defined.

use super::value::{FieldShape, FieldValue};
use crate::config::{default_age_ceiling, default_age_floor};
use std::collections::BTreeMap;

pub const BUSINESS_NAME: &str = "business_name";
pub const INDUSTRY: &str = "industry";
pub const BUSINESS_DESCRIPTION: &str = "business_description";
pub const WEBSITE_URL: &str = "website_url";
pub const BUSINESS_LOCATION: &str = "business_location";
pub const BUSINESS_SIZE: &str = "business_size";

pub const AGE_MIN: &str = "age_min";
pub const AGE_MAX: &str = "age_max";
pub const GENDER: &str = "gender";
pub const AUDIENCE_INDUSTRIES: &str = "audience_industries";
pub const AUDIENCE_PROFESSIONS: &str = "audience_professions";
pub const AUDIENCE_INTERESTS: &str = "audience_interests";
pub const AUDIENCE_LIFE_STAGES: &str = "audience_life_stages";

pub const PRIMARY_GOALS: &str = "primary_goals";
pub const SUCCESS_METRICS: &str = "success_metrics";
pub const GOAL_TIMELINE: &str = "goal_timeline";

pub const BRAND_TONE: &str = "brand_tone";
pub const BRAND_PERSONALITY: &str = "brand_personality";
pub const BRAND_VALUES: &str = "brand_values";
pub const WORDS_TO_AVOID: &str = "words_to_avoid";

pub const PLATFORMS: &str = "platforms";
pub const PLATFORM_FREQUENCY: &str = "platform_frequency";
pub const PLATFORM_HANDLES: &str = "platform_handles";

pub const CONTENT_TYPES: &str = "content_types";
pub const CONTENT_THEMES: &str = "content_themes";
pub const POSTING_FREQUENCY: &str = "posting_frequency";

pub const LOGO_URL: &str = "logo_url";
pub const BRAND_COLORS: &str = "brand_colors";
pub const MEDIA_URLS: &str = "media_urls";
pub const VISUAL_STYLE: &str = "visual_style";

pub const UNIQUE_VALUE_PROPOSITION: &str = "unique_value_proposition";
pub const COMPETITORS: &str = "competitors";
pub const PRICE_POSITIONING: &str = "price_positioning";

pub const MARKETING_BUDGET: &str = "marketing_budget";
pub const TEAM_SIZE: &str = "team_size";
pub const HAS_EXISTING_CONTENT: &str = "has_existing_content";
pub const PREFERRED_LANGUAGE: &str = "preferred_language";

pub const ENRICHMENT_PLACE_ID: &str = "enrichment_place_id";
pub const ENRICHMENT_SOURCE: &str = "enrichment_source";

/// The four categorical audience sets folded into `target_audience`.
pub const AUDIENCE_CATEGORY_FIELDS: [&str; 4] = [
    AUDIENCE_INDUSTRIES,
    AUDIENCE_PROFESSIONS,
    AUDIENCE_INTERESTS,
    AUDIENCE_LIFE_STAGES,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    EmptyText,
    Text(&'static str),
    Number(i64),
    Flag(bool),
    EmptySet,
    EmptyMap,
}

impl FieldDefault {
    pub fn to_value(self) -> FieldValue {
        match self {
            Self::EmptyText => FieldValue::Text(String::new()),
            Self::Text(text) => FieldValue::Text(text.to_string()),
            Self::Number(number) => FieldValue::Number(number),
            Self::Flag(flag) => FieldValue::Flag(flag),
            Self::EmptySet => FieldValue::Set(Vec::new()),
            Self::EmptyMap => FieldValue::Map(BTreeMap::new()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub shape: FieldShape,
    /// Owning step; `None` for internal bookkeeping fields.
    pub step: Option<usize>,
    pub default: FieldDefault,
    /// Whether the backend persistence endpoint accepts this field.
    pub submitted: bool,
}

const fn field(
    key: &'static str,
    shape: FieldShape,
    step: usize,
    default: FieldDefault,
) -> FieldSpec {
    FieldSpec {
        key,
        shape,
        step: Some(step),
        default,
        submitted: true,
    }
}

const fn text(key: &'static str, step: usize) -> FieldSpec {
    field(key, FieldShape::Text, step, FieldDefault::EmptyText)
}

const fn set(key: &'static str, step: usize) -> FieldSpec {
    field(key, FieldShape::StringSet, step, FieldDefault::EmptySet)
}

const fn map(key: &'static str, step: usize) -> FieldSpec {
    field(key, FieldShape::KeyedMap, step, FieldDefault::EmptyMap)
}

const fn internal(key: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        shape: FieldShape::Text,
        step: None,
        default: FieldDefault::EmptyText,
        submitted: false,
    }
}

pub static FIELDS: &[FieldSpec] = &[
    text(BUSINESS_NAME, 0),
    set(INDUSTRY, 0),
    text(BUSINESS_DESCRIPTION, 0),
    text(WEBSITE_URL, 0),
    text(BUSINESS_LOCATION, 0),
    text(BUSINESS_SIZE, 0),
    field(
        AGE_MIN,
        FieldShape::Number,
        1,
        FieldDefault::Number(default_age_floor()),
    ),
    field(
        AGE_MAX,
        FieldShape::Number,
        1,
        FieldDefault::Number(default_age_ceiling()),
    ),
    field(GENDER, FieldShape::Text, 1, FieldDefault::Text("all")),
    set(AUDIENCE_INDUSTRIES, 1),
    set(AUDIENCE_PROFESSIONS, 1),
    set(AUDIENCE_INTERESTS, 1),
    set(AUDIENCE_LIFE_STAGES, 1),
    set(PRIMARY_GOALS, 2),
    set(SUCCESS_METRICS, 2),
    text(GOAL_TIMELINE, 2),
    text(BRAND_TONE, 3),
    set(BRAND_PERSONALITY, 3),
    set(BRAND_VALUES, 3),
    text(WORDS_TO_AVOID, 3),
    set(PLATFORMS, 4),
    map(PLATFORM_FREQUENCY, 4),
    map(PLATFORM_HANDLES, 4),
    set(CONTENT_TYPES, 5),
    set(CONTENT_THEMES, 5),
    text(POSTING_FREQUENCY, 5),
    text(LOGO_URL, 6),
    set(BRAND_COLORS, 6),
    set(MEDIA_URLS, 6),
    text(VISUAL_STYLE, 6),
    text(UNIQUE_VALUE_PROPOSITION, 7),
    set(COMPETITORS, 7),
    text(PRICE_POSITIONING, 7),
    text(MARKETING_BUDGET, 8),
    text(TEAM_SIZE, 8),
    field(
        HAS_EXISTING_CONTENT,
        FieldShape::Flag,
        8,
        FieldDefault::Flag(false),
    ),
    text(PREFERRED_LANGUAGE, 8),
    internal(ENRICHMENT_PLACE_ID),
    internal(ENRICHMENT_SOURCE),
];

pub fn lookup(key: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|spec| spec.key == key)
}

pub fn fields_for_step(step: usize) -> impl Iterator<Item = &'static FieldSpec> {
    FIELDS.iter().filter(move |spec| spec.step == Some(step))
}
