//! Projects form data into the flat record the profile endpoint accepts.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::persistence::OnboardingType;
use crate::schema::fields::{AGE_MAX, AGE_MIN, AUDIENCE_CATEGORY_FIELDS, GENDER, FIELDS};
use crate::schema::vocab::is_other_sentinel;
use crate::schema::{FieldValue, FormData, OtherInputs};

pub const TARGET_AUDIENCE: &str = "target_audience";
pub const ONBOARDING_TYPE: &str = "onboarding_type";
pub const ONBOARDING_COMPLETED: &str = "onboarding_completed";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SubmissionPayload {
    fields: Map<String, Value>,
}

impl SubmissionPayload {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn target_audience(&self) -> &str {
        self.fields
            .get(TARGET_AUDIENCE)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Marks the record as a completed onboarding of the given type.
    pub fn completed_as(mut self, onboarding_type: OnboardingType) -> Self {
        self.fields.insert(
            ONBOARDING_TYPE.into(),
            Value::String(onboarding_type.as_str().into()),
        );
        self.fields
            .insert(ONBOARDING_COMPLETED.into(), Value::Bool(true));
        self
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Builds the backend payload from the allow-listed fields plus the
/// synthesized `target_audience` phrase.
pub fn assemble(form: &FormData, other: &OtherInputs) -> SubmissionPayload {
    let mut fields = Map::new();
    for spec in FIELDS.iter().filter(|spec| spec.submitted) {
        let Some(value) = form.get(spec.key) else {
            continue;
        };
        let value = match value {
            FieldValue::Set(items) => Value::from(resolve_items(spec.key, items, other)),
            other_value => other_value.to_json(),
        };
        fields.insert(spec.key.to_string(), value);
    }
    fields.insert(
        TARGET_AUDIENCE.to_string(),
        Value::String(target_audience(form, other)),
    );
    SubmissionPayload { fields }
}

/// Comma-joined audience phrase: age range, gender, then every selected
/// audience category with "Other" resolved through `other`.
pub fn target_audience(form: &FormData, other: &OtherInputs) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let (Some(min), Some(max)) = (form.number(AGE_MIN), form.number(AGE_MAX)) {
        if min > 0 && max > 0 {
            parts.push(format!("Ages {min}-{max}"));
        }
    }
    let gender = form.text(GENDER).trim();
    if !gender.is_empty() {
        parts.push(gender.to_string());
    }
    for field in AUDIENCE_CATEGORY_FIELDS {
        parts.extend(resolve_items(field, form.items(field), other));
    }
    parts.join(", ")
}

/// Replaces the "Other" sentinel with its free text, dropping it when unresolved.
fn resolve_items(field: &str, items: &[String], other: &OtherInputs) -> Vec<String> {
    let mut resolved: Vec<String> = Vec::new();
    for item in items {
        let item = if is_other_sentinel(item) {
            match other.resolved(field) {
                Some(text) => text,
                None => continue,
            }
        } else {
            item.trim()
        };
        if item.is_empty() || resolved.iter().any(|existing| existing == item) {
            continue;
        }
        resolved.push(item.to_string());
    }
    resolved
}
