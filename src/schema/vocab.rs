//! Closed vocabularies and the free-text "Other" sentinel.

pub const OTHER_SENTINEL: &str = "Other (please specify)";

pub static INDUSTRIES: &[&str] = &[
    "Retail",
    "E-commerce",
    "Food & Beverage",
    "Health & Wellness",
    "Beauty & Personal Care",
    "Fitness",
    "Fashion",
    "Real Estate",
    "Finance",
    "Technology",
    "Education",
    "Healthcare",
    "Hospitality & Travel",
    "Professional Services",
    "Home Services",
    "Automotive",
    "Entertainment",
    "Nonprofit",
    OTHER_SENTINEL,
];

pub static PLATFORMS: &[&str] = &[
    "Instagram",
    "Facebook",
    "LinkedIn",
    "YouTube",
    "TikTok",
    "Twitter",
    "Pinterest",
    OTHER_SENTINEL,
];

pub static GENDERS: &[&str] = &["all", "women", "men"];

/// True for the sentinel itself and its short form `Other`.
pub fn is_other_sentinel(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case(OTHER_SENTINEL) || value.eq_ignore_ascii_case("other")
}

/// Case-insensitive lookup of `raw` in a closed vocabulary.
///
/// The sentinel never matches: enrichment must not select "Other" on the
/// user's behalf.
pub fn canonical_term(vocabulary: &[&'static str], raw: &str) -> Option<&'static str> {
    let raw = raw.trim();
    if raw.is_empty() || is_other_sentinel(raw) {
        return None;
    }
    vocabulary
        .iter()
        .copied()
        .find(|term| term.eq_ignore_ascii_case(raw))
}
