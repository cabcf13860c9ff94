//! Wizard navigation, completion tracking and cross-session sync.

pub mod error;
pub mod machine;
pub mod rederive;

pub use error::StepError;
pub use machine::{NextOutcome, SyncOutcome, WizardMachine};
pub use rederive::RederiveGate;
