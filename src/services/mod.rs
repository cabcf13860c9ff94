//! Async collaborators and the session facade built on the wizard core.

pub mod api;
pub mod autocomplete;
pub mod autofill;
pub mod progress;
pub mod session;

pub use api::{
    ApiError, ColorPalette, DocumentApi, DocumentKind, DocumentUpload, LookupRequest,
    LookupResponse, MediaApi, Prediction, ProfileApi, ProfileRecord, SearchApi,
};
pub use autocomplete::{AutocompleteDebouncer, Predictions};
pub use autofill::{
    AutofillCoordinator, AutofillOutcome, AutofillStatus, EnrichmentSource, PendingAutofill, Ticket,
};
pub use progress::{ProgressTicker, SEARCH_STAGES};
pub use session::{OnboardingSession, SubmissionError};
