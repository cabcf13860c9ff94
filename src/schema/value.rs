//! Value shapes held by form fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Shape a field's value must take.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FieldShape {
    Text,
    Number,
    Flag,
    StringSet,
    KeyedMap,
}

/// A single form value.
///
/// Serialized untagged so the persisted blob and the backend payload read as
/// plain JSON scalars, arrays and objects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(i64),
    Text(String),
    Set(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for item in items {
            let item = item.into();
            if !out.contains(&item) {
                out.push(item);
            }
        }
        Self::Set(out)
    }

    pub fn shape(&self) -> FieldShape {
        match self {
            Self::Flag(_) => FieldShape::Flag,
            Self::Number(_) => FieldShape::Number,
            Self::Text(_) => FieldShape::Text,
            Self::Set(_) => FieldShape::StringSet,
            Self::Map(_) => FieldShape::KeyedMap,
        }
    }

    /// Empty/falsy: blank text, zero, `false`, or an empty collection.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Flag(flag) => !flag,
            Self::Number(number) => *number == 0,
            Self::Text(text) => text.trim().is_empty(),
            Self::Set(items) => items.is_empty(),
            Self::Map(entries) => entries.is_empty(),
        }
    }

    /// Converts a loosely-typed JSON value into the requested shape.
    ///
    /// Returns `None` when no sensible conversion exists.
    pub fn from_json(shape: FieldShape, raw: &Value) -> Option<Self> {
        match shape {
            FieldShape::Text => match raw {
                Value::String(text) => Some(Self::Text(text.clone())),
                Value::Number(number) => Some(Self::Text(number.to_string())),
                Value::Bool(flag) => Some(Self::Text(flag.to_string())),
                _ => None,
            },
            FieldShape::Number => match raw {
                Value::Number(number) => number
                    .as_i64()
                    .or_else(|| number.as_f64().map(|float| float.round() as i64))
                    .map(Self::Number),
                Value::String(text) => text.trim().parse::<i64>().ok().map(Self::Number),
                _ => None,
            },
            FieldShape::Flag => match raw {
                Value::Bool(flag) => Some(Self::Flag(*flag)),
                Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                    "true" | "yes" | "1" => Some(Self::Flag(true)),
                    "false" | "no" | "0" | "" => Some(Self::Flag(false)),
                    _ => None,
                },
                Value::Number(number) => number.as_i64().map(|n| Self::Flag(n != 0)),
                _ => None,
            },
            FieldShape::StringSet => {
                let items = string_items(raw);
                if items.is_empty() && !matches!(raw, Value::Array(_) | Value::String(_)) {
                    return None;
                }
                Some(Self::set(items))
            }
            FieldShape::KeyedMap => match raw {
                Value::Object(entries) => Some(Self::Map(
                    entries
                        .iter()
                        .filter_map(|(key, value)| match value {
                            Value::String(text) => Some((key.clone(), text.clone())),
                            Value::Number(number) => Some((key.clone(), number.to_string())),
                            Value::Bool(flag) => Some((key.clone(), flag.to_string())),
                            _ => None,
                        })
                        .collect(),
                )),
                _ => None,
            },
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Collects non-blank strings from a JSON string, array, or scalar.
///
/// Comma-separated strings are split so `"Retail, Fashion"` yields two items.
pub fn string_items(raw: &Value) -> Vec<String> {
    match raw {
        Value::String(text) => text
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text.trim().to_string()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
            .filter(|item| !item.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}
