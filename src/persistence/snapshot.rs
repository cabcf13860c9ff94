//! Persisted wizard progress and the onboarding-type selection.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::schema::{FormData, OtherInputs};
use crate::validation::STEP_COUNT;

/// Progress mirrored to storage: form data, "Other" free text, current step,
/// completed steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSnapshot {
    pub form_data: FormData,
    #[serde(default)]
    pub other_inputs: OtherInputs,
    pub current_step: usize,
    pub completed_steps: BTreeSet<usize>,
}

impl Default for WizardSnapshot {
    fn default() -> Self {
        Self {
            form_data: FormData::new(),
            other_inputs: OtherInputs::new(),
            current_step: 0,
            completed_steps: BTreeSet::new(),
        }
    }
}

impl WizardSnapshot {
    /// Clamps indices restored from storage into the step range.
    pub fn normalized(mut self) -> Self {
        self.current_step = self.current_step.min(STEP_COUNT - 1);
        self.completed_steps.retain(|step| *step < STEP_COUNT);
        self
    }

    /// Lowercase hex SHA-256 over the serialized snapshot.
    pub fn fingerprint(&self) -> String {
        let payload = serde_json::to_vec(self).unwrap_or_default();
        compute_hash(&payload)
    }
}

pub fn compute_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{:x}", digest)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingType {
    Business,
    Creator,
}

impl OnboardingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Business => "business",
            Self::Creator => "creator",
        }
    }
}

impl fmt::Display for OnboardingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OnboardingType {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().trim_matches('"').to_ascii_lowercase().as_str() {
            "business" => Ok(Self::Business),
            "creator" => Ok(Self::Creator),
            other => anyhow::bail!("Unknown onboarding type '{other}'. Expected business/creator."),
        }
    }
}

/// Which onboarding flow the user picked, and whether they confirmed it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Selection {
    pub onboarding_type: OnboardingType,
    pub confirmed: bool,
}

impl Selection {
    pub fn confirmed(onboarding_type: OnboardingType) -> Self {
        Self {
            onboarding_type,
            confirmed: true,
        }
    }
}
