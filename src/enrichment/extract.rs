//! Source-specific extraction for age ranges, gender and platform presence.

use crate::config::AgeBounds;
use crate::schema::vocab::{canonical_term, PLATFORMS};

/// Bounds parsed from age-group phrases such as `"Young Professionals (25–35)"`.
///
/// Every integer found is clamped into `bounds`; `None` unless the clamped
/// values span a non-zero range.
pub fn age_range(phrases: &[String], bounds: AgeBounds) -> Option<(i64, i64)> {
    let values: Vec<i64> = phrases
        .iter()
        .flat_map(|phrase| integers(phrase))
        .map(|value| bounds.clamp(value))
        .collect();
    let min = values.iter().copied().min()?;
    let max = values.iter().copied().max()?;
    (max > min).then_some((min, max))
}

fn integers(phrase: &str) -> Vec<i64> {
    phrase
        .split(|ch: char| !ch.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .filter_map(|run| run.parse::<i64>().ok())
        .collect()
}

/// `women`/`men` when exactly one side is mentioned, otherwise `all`.
pub fn gender(phrases: &[String]) -> &'static str {
    let mut women = false;
    let mut men = false;
    for phrase in phrases {
        for word in words(phrase) {
            match word.as_str() {
                "women" | "woman" | "female" | "females" | "ladies" | "girls" => women = true,
                "men" | "man" | "male" | "males" | "gentlemen" | "boys" => men = true,
                _ => {}
            }
        }
    }
    match (women, men) {
        (true, false) => "women",
        (false, true) => "men",
        _ => "all",
    }
}

static PLATFORM_MARKERS: &[(&str, &str)] = &[
    ("instagram", "Instagram"),
    ("facebook", "Facebook"),
    ("linkedin", "LinkedIn"),
    ("youtube", "YouTube"),
    ("tiktok", "TikTok"),
    ("twitter", "Twitter"),
];

/// Canonical platform label for a free-text name or profile URL.
pub fn detect_platform(raw: &str) -> Option<&'static str> {
    if let Some(term) = canonical_term(PLATFORMS, raw) {
        return Some(term);
    }
    let lower = raw.to_ascii_lowercase();
    if let Some(label) = PLATFORM_MARKERS
        .iter()
        .find(|(marker, _)| lower.contains(*marker))
        .map(|(_, label)| *label)
    {
        return Some(label);
    }
    // "X" only counts as a standalone token ("X", "x.com/acme").
    let tokens = words(&lower);
    let bare_x = tokens.first().map(String::as_str) == Some("x");
    let x_domain = tokens.windows(2).any(|pair| pair[0] == "x" && pair[1] == "com");
    (bare_x || x_domain).then_some("Twitter")
}

fn words(phrase: &str) -> Vec<String> {
    phrase
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}
