use thiserror::Error;

/// User-recoverable navigation outcomes. None of them mutate wizard state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StepError {
    #[error("step {step} is incomplete; fill required fields: {}", .missing.join(", "))]
    Incomplete { step: usize, missing: Vec<String> },
    #[error("step {target} is locked")]
    Locked { target: usize },
    #[error("step {target} does not exist")]
    OutOfRange { target: usize },
}

impl StepError {
    /// Validation failures prompt for input; the rest are shown as locked steps.
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, Self::Incomplete { .. })
    }
}
