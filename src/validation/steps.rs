//! Ordered step definitions and their requirement lists.

use crate::schema::fields::{
    BRAND_TONE, BUSINESS_DESCRIPTION, BUSINESS_NAME, CONTENT_TYPES, GENDER, INDUSTRY, LOGO_URL,
    MARKETING_BUDGET, PLATFORMS, POSTING_FREQUENCY, PRIMARY_GOALS, UNIQUE_VALUE_PROPOSITION,
    WEBSITE_URL,
};
use crate::schema::vocab::GENDERS;

pub const STEP_COUNT: usize = 10;
pub const REVIEW_STEP: usize = STEP_COUNT - 1;

/// One check a step's data must pass under strict validation.
#[derive(Debug, Clone, Copy)]
pub enum Requirement {
    /// Field holds a non-empty value.
    Filled(&'static str),
    /// `age_min`/`age_max` lie inside the configured bounds with `max >= min`.
    AgeRange,
    /// Text field equals one of a closed set of options.
    OneOf(&'static str, &'static [&'static str]),
    /// Optional text field that must look like a URL once filled.
    UrlIfPresent(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct StepDefinition {
    pub index: usize,
    pub name: &'static str,
    pub requirements: &'static [Requirement],
}

impl StepDefinition {
    pub fn is_review(&self) -> bool {
        self.index == REVIEW_STEP
    }
}

pub static STEPS: [StepDefinition; STEP_COUNT] = [
    StepDefinition {
        index: 0,
        name: "Business Basics",
        requirements: &[
            Requirement::Filled(BUSINESS_NAME),
            Requirement::Filled(INDUSTRY),
            Requirement::Filled(BUSINESS_DESCRIPTION),
            Requirement::UrlIfPresent(WEBSITE_URL),
        ],
    },
    StepDefinition {
        index: 1,
        name: "Target Audience",
        requirements: &[Requirement::AgeRange, Requirement::OneOf(GENDER, GENDERS)],
    },
    StepDefinition {
        index: 2,
        name: "Goals",
        requirements: &[Requirement::Filled(PRIMARY_GOALS)],
    },
    StepDefinition {
        index: 3,
        name: "Brand Voice",
        requirements: &[Requirement::Filled(BRAND_TONE)],
    },
    StepDefinition {
        index: 4,
        name: "Platforms",
        requirements: &[Requirement::Filled(PLATFORMS)],
    },
    StepDefinition {
        index: 5,
        name: "Content",
        requirements: &[
            Requirement::Filled(CONTENT_TYPES),
            Requirement::Filled(POSTING_FREQUENCY),
        ],
    },
    StepDefinition {
        index: 6,
        name: "Visual Identity",
        requirements: &[Requirement::UrlIfPresent(LOGO_URL)],
    },
    StepDefinition {
        index: 7,
        name: "Market Position",
        requirements: &[Requirement::Filled(UNIQUE_VALUE_PROPOSITION)],
    },
    StepDefinition {
        index: 8,
        name: "Operations",
        requirements: &[Requirement::Filled(MARKETING_BUDGET)],
    },
    StepDefinition {
        index: 9,
        name: "Review",
        requirements: &[],
    },
];

pub fn step(index: usize) -> Option<&'static StepDefinition> {
    STEPS.get(index)
}
