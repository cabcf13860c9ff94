//! Non-destructive merge of external enrichment records into form data.
//!
//! Rules, per target kind:
//! - scalars are filled only while the current value is empty;
//! - closed vocabularies accept case-insensitive matches of known terms and
//!   drop everything else;
//! - open string sets are unioned by exact match;
//! - keyed maps gain entries they do not have yet;
//! - age and gender are derived from phrases and only replace untouched defaults.
//!
//! The merge is pure and idempotent; a malformed payload leaves the form as is.

pub mod extract;
pub mod payload;

pub use payload::{flatten, EnrichmentRecord};

use serde_json::Value;
use tracing::debug;

use crate::config::AgeBounds;
use crate::schema::fields::{AGE_MAX, AGE_MIN, GENDER, HAS_EXISTING_CONTENT, PLATFORMS};
use crate::schema::vocab::{canonical_term, INDUSTRIES};
use crate::schema::{FieldValue, FormData};

/// Fields touched by a merge and raw terms that matched no vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub changed: Vec<&'static str>,
    pub dropped: Vec<String>,
}

impl MergeReport {
    fn touch(&mut self, field: &'static str) {
        if !self.changed.contains(&field) {
            self.changed.push(field);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnrichmentMerger {
    age: AgeBounds,
}

impl EnrichmentMerger {
    pub fn new(age: AgeBounds) -> Self {
        Self { age }
    }

    pub fn merge(&self, current: &FormData, payload: &Value) -> FormData {
        self.merge_with_report(current, payload).0
    }

    pub fn merge_with_report(&self, current: &FormData, payload: &Value) -> (FormData, MergeReport) {
        let record = EnrichmentRecord::from_payload(payload);
        self.merge_record(current, &record)
    }

    pub fn merge_record(
        &self,
        current: &FormData,
        record: &EnrichmentRecord,
    ) -> (FormData, MergeReport) {
        let mut form = current.clone();
        let mut report = MergeReport::default();

        for (field, text) in &record.scalars {
            let field: &'static str = *field;
            if !form.is_filled(field) && set(&mut form, field, FieldValue::text(text.as_str())) {
                report.touch(field);
            }
        }

        for (field, items) in &record.closed_sets {
            let field: &'static str = *field;
            for raw in items {
                match canonical_term(INDUSTRIES, raw) {
                    Some(term) => {
                        if insert(&mut form, field, term) {
                            report.touch(field);
                        }
                    }
                    None => report.dropped.push(raw.clone()),
                }
            }
        }

        for raw in &record.platform_names {
            match extract::detect_platform(raw) {
                Some(label) => {
                    if insert(&mut form, PLATFORMS, label) {
                        report.touch(PLATFORMS);
                    }
                }
                None => report.dropped.push(raw.clone()),
            }
        }

        for (field, items) in &record.open_sets {
            let field: &'static str = *field;
            for item in items {
                if insert(&mut form, field, item) {
                    report.touch(field);
                }
            }
        }

        for (field, entries) in &record.keyed {
            let field: &'static str = *field;
            for (key, value) in entries {
                let key = extract::detect_platform(key).unwrap_or(key.as_str());
                let present = form
                    .entries(field)
                    .map(|existing| existing.contains_key(key))
                    .unwrap_or(false);
                if present {
                    continue;
                }
                if form.set_entry(field, key, value).unwrap_or(false) {
                    report.touch(field);
                }
            }
        }

        if form.is_default(AGE_MIN) && form.is_default(AGE_MAX) {
            if let Some((min, max)) = extract::age_range(&record.age_phrases, self.age) {
                let min_changed = set(&mut form, AGE_MIN, FieldValue::Number(min));
                let max_changed = set(&mut form, AGE_MAX, FieldValue::Number(max));
                if min_changed || max_changed {
                    report.touch(AGE_MIN);
                    report.touch(AGE_MAX);
                }
            }
        }

        if !record.gender_phrases.is_empty() && (form.is_default(GENDER) || !form.is_filled(GENDER))
        {
            let derived = extract::gender(&record.gender_phrases);
            if set(&mut form, GENDER, FieldValue::text(derived)) {
                report.touch(GENDER);
            }
        }

        if record.has_existing_content == Some(true)
            && !form.flag(HAS_EXISTING_CONTENT)
            && set(&mut form, HAS_EXISTING_CONTENT, FieldValue::Flag(true))
        {
            report.touch(HAS_EXISTING_CONTENT);
        }

        if !report.dropped.is_empty() {
            debug!(dropped = ?report.dropped, "Dropped enrichment terms outside known vocabularies");
        }
        (form, report)
    }
}

/// Merges with the default age bounds.
pub fn merge(current: &FormData, payload: &Value) -> FormData {
    EnrichmentMerger::default().merge(current, payload)
}

fn set(form: &mut FormData, field: &str, value: FieldValue) -> bool {
    form.set(field, value).unwrap_or(false)
}

fn insert(form: &mut FormData, field: &str, item: &str) -> bool {
    form.insert_item(field, item).unwrap_or(false)
}
