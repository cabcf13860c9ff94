//! Canonical form-data object and the "Other" free-text side map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

use super::fields::{lookup, FieldSpec, FIELDS};
use super::value::{FieldShape, FieldValue};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("field '{field}' expects {expected:?}, got {actual:?}")]
    ShapeMismatch {
        field: String,
        expected: FieldShape,
        actual: FieldShape,
    },
}

/// Mapping from field key to value. Every schema field is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, FieldValue>", into = "BTreeMap<String, FieldValue>")]
pub struct FormData {
    values: BTreeMap<String, FieldValue>,
}

impl Default for FormData {
    fn default() -> Self {
        Self::new()
    }
}

impl FormData {
    pub fn new() -> Self {
        Self {
            values: FIELDS
                .iter()
                .map(|spec| (spec.key.to_string(), spec.default.to_value()))
                .collect(),
        }
    }

    /// Builds form data from a server profile record.
    ///
    /// Fields are coerced to their schema shape; unknown keys and values that
    /// cannot be coerced are skipped and keep their defaults.
    pub fn from_profile(record: &Map<String, Value>) -> Self {
        let mut form = Self::new();
        for spec in FIELDS {
            let Some(raw) = record.get(spec.key) else {
                continue;
            };
            if raw.is_null() {
                continue;
            }
            match FieldValue::from_json(spec.shape, raw) {
                Some(value) => {
                    form.values.insert(spec.key.to_string(), value);
                }
                None => warn!(field = spec.key, "Skipping profile value with unexpected shape"),
            }
        }
        form
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn text(&self, key: &str) -> &str {
        match self.values.get(key) {
            Some(FieldValue::Text(text)) => text.as_str(),
            _ => "",
        }
    }

    pub fn number(&self, key: &str) -> Option<i64> {
        match self.values.get(key) {
            Some(FieldValue::Number(number)) => Some(*number),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(FieldValue::Flag(true)))
    }

    pub fn items(&self, key: &str) -> &[String] {
        match self.values.get(key) {
            Some(FieldValue::Set(items)) => items.as_slice(),
            _ => &[],
        }
    }

    pub fn entries(&self, key: &str) -> Option<&BTreeMap<String, String>> {
        match self.values.get(key) {
            Some(FieldValue::Map(entries)) => Some(entries),
            _ => None,
        }
    }

    /// Non-empty value (see [`FieldValue::is_empty`]).
    pub fn is_filled(&self, key: &str) -> bool {
        self.values
            .get(key)
            .map(|value| !value.is_empty())
            .unwrap_or(false)
    }

    pub fn is_default(&self, key: &str) -> bool {
        match (lookup(key), self.values.get(key)) {
            (Some(spec), Some(value)) => *value == spec.default.to_value(),
            _ => true,
        }
    }

    /// Replaces a field value. Returns whether the stored value changed.
    pub fn set(&mut self, key: &str, value: FieldValue) -> Result<bool, FieldError> {
        let spec = spec_for(key)?;
        if value.shape() != spec.shape {
            return Err(FieldError::ShapeMismatch {
                field: key.to_string(),
                expected: spec.shape,
                actual: value.shape(),
            });
        }
        let value = match value {
            FieldValue::Set(items) => FieldValue::set(items),
            other => other,
        };
        let previous = self.values.insert(key.to_string(), value.clone());
        Ok(previous.as_ref() != Some(&value))
    }

    /// Adds `item` to a string-set field unless already present.
    pub fn insert_item(&mut self, key: &str, item: &str) -> Result<bool, FieldError> {
        let spec = spec_for(key)?;
        match self.values.get_mut(key) {
            Some(FieldValue::Set(items)) => {
                if items.iter().any(|existing| existing == item) {
                    return Ok(false);
                }
                items.push(item.to_string());
                Ok(true)
            }
            Some(other) => Err(FieldError::ShapeMismatch {
                field: key.to_string(),
                expected: FieldShape::StringSet,
                actual: other.shape(),
            }),
            None => Err(FieldError::ShapeMismatch {
                field: key.to_string(),
                expected: FieldShape::StringSet,
                actual: spec.shape,
            }),
        }
    }

    pub fn remove_item(&mut self, key: &str, item: &str) -> Result<bool, FieldError> {
        spec_for(key)?;
        match self.values.get_mut(key) {
            Some(FieldValue::Set(items)) => {
                let before = items.len();
                items.retain(|existing| existing != item);
                Ok(items.len() != before)
            }
            Some(other) => Err(FieldError::ShapeMismatch {
                field: key.to_string(),
                expected: FieldShape::StringSet,
                actual: other.shape(),
            }),
            None => Ok(false),
        }
    }

    /// Sets one entry of a keyed-map field. An empty value removes the entry.
    pub fn set_entry(&mut self, key: &str, entry: &str, value: &str) -> Result<bool, FieldError> {
        spec_for(key)?;
        match self.values.get_mut(key) {
            Some(FieldValue::Map(entries)) => {
                if value.trim().is_empty() {
                    return Ok(entries.remove(entry).is_some());
                }
                let previous = entries.insert(entry.to_string(), value.to_string());
                Ok(previous.as_deref() != Some(value))
            }
            Some(other) => Err(FieldError::ShapeMismatch {
                field: key.to_string(),
                expected: FieldShape::KeyedMap,
                actual: other.shape(),
            }),
            None => Ok(false),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }
}

fn spec_for(key: &str) -> Result<&'static FieldSpec, FieldError> {
    lookup(key).ok_or_else(|| FieldError::UnknownField(key.to_string()))
}

impl From<BTreeMap<String, FieldValue>> for FormData {
    /// Restores the schema invariant on a stored blob: missing fields get
    /// defaults, unknown keys are dropped, mismatched shapes are coerced or reset.
    fn from(stored: BTreeMap<String, FieldValue>) -> Self {
        let mut form = Self::new();
        for (key, value) in stored {
            let Some(spec) = lookup(&key) else {
                continue;
            };
            if value.shape() == spec.shape {
                let value = match value {
                    FieldValue::Set(items) => FieldValue::set(items),
                    other => other,
                };
                form.values.insert(key, value);
            } else if let Some(coerced) = FieldValue::from_json(spec.shape, &value.to_json()) {
                form.values.insert(key, coerced);
            } else {
                warn!(field = %key, "Dropping stored value with unexpected shape");
            }
        }
        form
    }
}

impl From<FormData> for BTreeMap<String, FieldValue> {
    fn from(form: FormData) -> Self {
        form.values
    }
}

/// Free-text overrides for "Other (please specify)" selections, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OtherInputs {
    values: BTreeMap<String, String>,
}

impl OtherInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: impl Into<String>, text: impl Into<String>) {
        self.values.insert(field.into(), text.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Trimmed override for `field`, or `None` when blank.
    pub fn resolved(&self, field: &str) -> Option<&str> {
        self.values
            .get(field)
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
