pub mod config;
pub mod enrichment;
pub mod persistence;
pub mod schema;
pub mod services;
pub mod submission;
pub mod validation;
pub mod wizard;

// Re-export commonly used types for convenience.
pub use config::WizardConfig;
pub use enrichment::{EnrichmentMerger, MergeReport};
pub use persistence::{
    ChangeBus, ExternalSignal, FileTier, MemoryTier, OnboardingType, PersistenceLayer, Selection,
    StorageKeys, StorageTier, WizardMode, WizardSnapshot,
};
pub use schema::{FieldValue, FormData, OtherInputs};
pub use services::{OnboardingSession, SubmissionError};
pub use submission::SubmissionPayload;
pub use validation::ValidationEngine;
pub use wizard::{NextOutcome, StepError, SyncOutcome, WizardMachine};
