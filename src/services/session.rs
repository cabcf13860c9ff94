//! One onboarding session: type selection, the wizard, autofill and submission.

use anyhow::Result;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::api::{
    server_status, ApiError, DocumentApi, DocumentUpload, LookupRequest, MediaApi, ProfileApi,
    SearchApi,
};
use super::autocomplete::{AutocompleteDebouncer, Predictions};
use super::autofill::{
    fetch_document, fetch_lookup, AutofillCoordinator, AutofillOutcome, EnrichmentSource,
    PendingAutofill,
};
use super::progress::{ProgressTicker, SEARCH_STAGES};
use crate::config::WizardConfig;
use crate::persistence::{
    resolve_selection, ChangeSubscription, ExternalSignal, OnboardingType, PersistenceLayer,
    Selection, WizardMode,
};
use crate::submission::SubmissionPayload;
use crate::wizard::{SyncOutcome, WizardMachine};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("submission is only possible from the review step (current step {current})")]
    NotOnReviewStep { current: usize },
    #[error("submission rejected: {0}")]
    Rejected(#[source] ApiError),
    #[error("no onboarding type selected")]
    NoSelection,
}

pub struct OnboardingSession {
    profile: Arc<dyn ProfileApi>,
    machine: WizardMachine,
    selection: Option<Selection>,
    autofill: AutofillCoordinator,
    subscription: Option<ChangeSubscription>,
    progress: Arc<watch::Sender<Option<&'static str>>>,
    autocomplete: Option<AutocompleteDebouncer>,
    config: WizardConfig,
}

impl OnboardingSession {
    /// Opens a create-mode session.
    ///
    /// The server profile decides whether local state survives: a record that
    /// is explicitly not completed clears it. A failed profile fetch is treated
    /// as "no record" so local progress is kept.
    pub async fn start(
        profile: Arc<dyn ProfileApi>,
        persistence: PersistenceLayer,
        config: WizardConfig,
    ) -> Result<Self> {
        let record = match profile.get().await {
            Ok(record) => record,
            Err(error) => {
                warn!(error = %error, "Profile lookup failed; keeping local onboarding state");
                None
            }
        };
        let (durable, session) = persistence.read_selection();
        let resolution = resolve_selection(durable, session, server_status(record.as_ref()));
        debug!(?resolution, "Resolved onboarding type selection");
        let selection = persistence.apply_resolution(resolution)?;

        let subscription = persistence.subscribe();
        let machine = WizardMachine::new(persistence, &config);
        Ok(Self::assemble(profile, machine, selection, subscription, config))
    }

    /// Opens an edit-mode session over the existing profile record. Storage is
    /// bypassed and submission goes through `profile.update`.
    pub async fn edit(
        profile: Arc<dyn ProfileApi>,
        persistence: PersistenceLayer,
        config: WizardConfig,
    ) -> Result<Self, ApiError> {
        let record = profile.get().await?.unwrap_or_default();
        let onboarding_type = record.onboarding_type.unwrap_or(OnboardingType::Business);
        let machine = WizardMachine::from_profile(persistence, &config, &record.fields);
        info!(%onboarding_type, "Editing onboarding profile");
        Ok(Self::assemble(
            profile,
            machine,
            Some(Selection::confirmed(onboarding_type)),
            None,
            config,
        ))
    }

    fn assemble(
        profile: Arc<dyn ProfileApi>,
        machine: WizardMachine,
        selection: Option<Selection>,
        subscription: Option<ChangeSubscription>,
        config: WizardConfig,
    ) -> Self {
        let (progress, _) = watch::channel(None);
        Self {
            profile,
            machine,
            selection,
            autofill: AutofillCoordinator::new(),
            subscription,
            progress: Arc::new(progress),
            autocomplete: None,
            config,
        }
    }

    pub fn machine(&self) -> &WizardMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut WizardMachine {
        &mut self.machine
    }

    pub fn autofill(&self) -> &AutofillCoordinator {
        &self.autofill
    }

    pub fn mode(&self) -> WizardMode {
        self.machine.mode()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// True while the type selector must be shown instead of the wizard.
    pub fn needs_selection(&self) -> bool {
        !self.selection.map(|selection| selection.confirmed).unwrap_or(false)
    }

    pub fn select_type(&mut self, onboarding_type: OnboardingType) -> Result<()> {
        let selection = Selection::confirmed(onboarding_type);
        if self.mode() == WizardMode::Create {
            self.machine.persistence().write_selection(selection)?;
        }
        self.selection = Some(selection);
        Ok(())
    }

    /// Drops the selection together with all progress so the selector shows again.
    pub fn change_selection(&mut self) {
        self.machine.reset();
        self.selection = None;
    }

    /// Applies any storage changes made by other sessions since the last call.
    pub fn sync(&mut self) -> SyncOutcome {
        let Some(signal) = self.subscription.as_mut().and_then(ChangeSubscription::drain) else {
            return SyncOutcome::Unchanged;
        };
        self.notify(&signal)
    }

    /// Re-checks storage after a focus or visibility change, or a storage event.
    pub fn notify(&mut self, signal: &ExternalSignal) -> SyncOutcome {
        let outcome = self.machine.handle_signal(signal);
        if outcome != SyncOutcome::Ignored {
            self.reload_selection();
        }
        outcome
    }

    fn reload_selection(&mut self) {
        let (durable, session) = self.machine.persistence().read_selection();
        let selection = durable
            .filter(|selection| selection.confirmed)
            .or_else(|| session.filter(|selection| selection.confirmed));
        if selection != self.selection {
            debug!(?selection, "Onboarding type selection changed in storage");
            self.selection = selection;
        }
    }

    /// Latest cosmetic stage message while a smart-search lookup runs.
    pub fn lookup_progress(&self) -> watch::Receiver<Option<&'static str>> {
        self.progress.subscribe()
    }

    pub async fn autofill_from_document(
        &mut self,
        api: &dyn DocumentApi,
        document: &DocumentUpload,
    ) -> AutofillOutcome {
        self.autofill
            .from_document(api, document, &mut self.machine)
            .await
    }

    pub async fn autofill_from_lookup(
        &mut self,
        api: &dyn SearchApi,
        request: &LookupRequest,
    ) -> AutofillOutcome {
        let mut ticker = ProgressTicker::attach(
            Arc::clone(&self.progress),
            self.config.progress_interval(),
            SEARCH_STAGES,
        );
        let outcome = self
            .autofill
            .from_lookup(api, request, &mut self.machine)
            .await;
        ticker.stop();
        outcome
    }

    pub async fn autofill_from_logo(&mut self, api: &dyn MediaApi, image_url: &str) -> AutofillOutcome {
        self.autofill
            .from_logo(api, image_url, &mut self.machine)
            .await
    }

    /// Starts a smart-search lookup on its own task. The session stays free
    /// for teardown or a newer request until [`finish_autofill`](Self::finish_autofill).
    pub fn request_lookup(
        &mut self,
        api: Arc<dyn SearchApi>,
        request: LookupRequest,
    ) -> PendingAutofill {
        let ticket = self.autofill.begin(EnrichmentSource::SmartSearch);
        PendingAutofill::spawn(ticket, async move { fetch_lookup(api.as_ref(), &request).await })
    }

    pub fn request_document(
        &mut self,
        api: Arc<dyn DocumentApi>,
        document: DocumentUpload,
    ) -> PendingAutofill {
        let ticket = self.autofill.begin(EnrichmentSource::Document);
        PendingAutofill::spawn(ticket, async move { fetch_document(api.as_ref(), &document).await })
    }

    pub async fn finish_autofill(&mut self, pending: PendingAutofill) -> AutofillOutcome {
        self.autofill.finish(pending, &mut self.machine).await
    }

    pub fn cancel_autofill(&mut self, pending: PendingAutofill) {
        self.autofill.cancel(pending);
    }

    /// Wires the business search field to `api` and returns its predictions feed.
    pub fn attach_autocomplete(&mut self, api: Arc<dyn SearchApi>) -> watch::Receiver<Predictions> {
        let debouncer = AutocompleteDebouncer::new(api, &self.config);
        let predictions = debouncer.subscribe();
        self.autocomplete = Some(debouncer);
        predictions
    }

    /// Feeds search input. Returns `false` when no search is attached,
    /// including after teardown. Needs a tokio runtime.
    pub fn autocomplete_input(&mut self, raw: &str) -> bool {
        match self.autocomplete.as_mut() {
            Some(debouncer) => {
                debouncer.input(raw);
                true
            }
            None => false,
        }
    }

    /// Leaves the wizard: pending timers stop and in-flight enrichment
    /// results are dropped on arrival.
    pub fn teardown(&mut self) {
        if let Some(mut debouncer) = self.autocomplete.take() {
            debouncer.cancel();
        }
        self.autofill.teardown();
        self.progress.send_replace(None);
    }

    /// Submits from the review step.
    ///
    /// Create mode calls `profile.submit` and clears every persisted key on
    /// success. Edit mode calls `profile.update`. A rejection keeps all state so
    /// the user can retry.
    pub async fn submit(&mut self) -> Result<SubmissionPayload, SubmissionError> {
        if !self.machine.is_review() {
            return Err(SubmissionError::NotOnReviewStep {
                current: self.machine.current_step(),
            });
        }
        let selection = self
            .selection
            .filter(|selection| selection.confirmed)
            .ok_or(SubmissionError::NoSelection)?;
        let payload = self
            .machine
            .submission_payload()
            .completed_as(selection.onboarding_type);
        let body = payload.clone().into_json();

        let result = match self.mode() {
            WizardMode::Create => self.profile.submit(&body).await,
            WizardMode::Edit => self.profile.update(&body).await,
        };
        if let Err(error) = result {
            warn!(error = %error, mode = ?self.mode(), "Onboarding submission rejected");
            return Err(SubmissionError::Rejected(error));
        }

        info!(
            onboarding_type = %selection.onboarding_type,
            mode = ?self.mode(),
            "Onboarding submitted"
        );
        if self.mode() == WizardMode::Create {
            if let Err(error) = self.machine.persistence().clear_all() {
                warn!(error = %format!("{error:#}"), "Failed clearing onboarding state after submission");
            }
        }
        Ok(payload)
    }
}
