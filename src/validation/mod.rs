//! Per-step validation over the current form data.
//!
//! A single requirement table backs two evaluation modes. Strict mode gates
//! forward navigation. Relaxed mode ("has data") back-computes completion: every
//! requirement only needs its fields present, semantic checks such as the age
//! range are skipped, and at least one field of the step must hold a value.
//! Defaults that are real answers (the 16-90 age range, gender `all`) count as
//! data from initialization.

pub mod steps;

pub use steps::{step, Requirement, StepDefinition, REVIEW_STEP, STEPS, STEP_COUNT};

use crate::config::AgeBounds;
use crate::schema::fields::{fields_for_step, AGE_MAX, AGE_MIN};
use crate::schema::FormData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Strict,
    Relaxed,
}

/// Snapshot of every predicate for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepStatus {
    pub index: usize,
    pub valid: bool,
    pub has_data: bool,
    /// Some field differs from its default, regardless of validity.
    pub touched: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationEngine {
    age: AgeBounds,
}

impl ValidationEngine {
    pub fn new(age: AgeBounds) -> Self {
        Self { age }
    }

    pub fn is_valid(&self, step: usize, form: &FormData) -> bool {
        self.evaluate(step, form, Mode::Strict)
    }

    pub fn has_data(&self, step: usize, form: &FormData) -> bool {
        self.evaluate(step, form, Mode::Relaxed)
    }

    /// Evaluates a step. Out-of-range steps are never valid and never hold data.
    pub fn evaluate(&self, index: usize, form: &FormData, mode: Mode) -> bool {
        let Some(definition) = step(index) else {
            return false;
        };
        if definition.is_review() {
            return mode == Mode::Strict;
        }
        match mode {
            Mode::Strict => definition
                .requirements
                .iter()
                .all(|requirement| self.check(requirement, form)),
            Mode::Relaxed => {
                definition
                    .requirements
                    .iter()
                    .all(|requirement| is_present(requirement, form))
                    && holds_value(index, form)
            }
        }
    }

    pub fn status(&self, index: usize, form: &FormData) -> StepStatus {
        StepStatus {
            index,
            valid: self.is_valid(index, form),
            has_data: self.has_data(index, form),
            touched: is_touched(index, form),
        }
    }

    /// Steps whose relaxed predicate currently holds.
    pub fn data_bearing_steps(&self, form: &FormData) -> Vec<usize> {
        (0..STEP_COUNT)
            .filter(|index| self.has_data(*index, form))
            .collect()
    }

    /// Human-readable list of failing requirements, for the "fill required fields" prompt.
    pub fn missing(&self, index: usize, form: &FormData) -> Vec<String> {
        let Some(definition) = step(index) else {
            return Vec::new();
        };
        definition
            .requirements
            .iter()
            .filter(|requirement| !self.check(requirement, form))
            .map(|requirement| match requirement {
                Requirement::Filled(field) => (*field).to_string(),
                Requirement::AgeRange => format!(
                    "age range ({}-{}, max >= min)",
                    self.age.floor, self.age.ceiling
                ),
                Requirement::OneOf(field, _) => (*field).to_string(),
                Requirement::UrlIfPresent(field) => format!("{field} (invalid URL)"),
            })
            .collect()
    }

    fn check(&self, requirement: &Requirement, form: &FormData) -> bool {
        match requirement {
            Requirement::Filled(field) => form.is_filled(field),
            Requirement::AgeRange => match (form.number(AGE_MIN), form.number(AGE_MAX)) {
                (Some(min), Some(max)) => {
                    self.age.contains(min) && self.age.contains(max) && max >= min
                }
                _ => false,
            },
            Requirement::OneOf(field, options) => {
                let value = form.text(field).trim();
                options.iter().any(|option| option.eq_ignore_ascii_case(value))
            }
            Requirement::UrlIfPresent(field) => {
                let value = form.text(field).trim();
                value.is_empty() || looks_like_url(value)
            }
        }
    }
}

/// Presence half of a requirement: the fields are there, whatever their value.
fn is_present(requirement: &Requirement, form: &FormData) -> bool {
    match requirement {
        Requirement::Filled(field) | Requirement::OneOf(field, _) => form.is_filled(field),
        Requirement::AgeRange => form.is_filled(AGE_MIN) && form.is_filled(AGE_MAX),
        Requirement::UrlIfPresent(_) => true,
    }
}

fn holds_value(index: usize, form: &FormData) -> bool {
    fields_for_step(index).any(|spec| form.is_filled(spec.key))
}

fn is_touched(index: usize, form: &FormData) -> bool {
    fields_for_step(index).any(|spec| form.is_filled(spec.key) && !form.is_default(spec.key))
}

fn looks_like_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .unwrap_or(value);
    !rest.is_empty() && !rest.contains(char::is_whitespace) && rest.contains('.')
}
