//! Step state machine owning the form data for one wizard session.

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::error::StepError;
use super::rederive::RederiveGate;
use crate::config::WizardConfig;
use crate::enrichment::{EnrichmentMerger, MergeReport};
use crate::persistence::{ExternalSignal, PersistenceLayer, WizardMode, WizardSnapshot};
use crate::schema::{FieldError, FieldValue, FormData, OtherInputs};
use crate::submission::{assemble, SubmissionPayload};
use crate::validation::{StepStatus, ValidationEngine, REVIEW_STEP, STEP_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextOutcome {
    Advanced(usize),
    /// Confirming the review step; the caller submits.
    ReadyToSubmit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Unchanged,
    /// Another session's saved progress replaced in-memory state.
    Adopted,
    /// Saved progress disappeared (submitted or reset elsewhere); state reset.
    Cleared,
    /// Edit-mode sessions never follow the durable tier.
    Ignored,
}

pub struct WizardMachine {
    form: FormData,
    other: OtherInputs,
    current: usize,
    completed: BTreeSet<usize>,
    engine: ValidationEngine,
    merger: EnrichmentMerger,
    persistence: PersistenceLayer,
    rederive: RederiveGate,
}

impl WizardMachine {
    /// Starts a session, recovering saved progress when the persistence layer has any.
    pub fn new(persistence: PersistenceLayer, config: &WizardConfig) -> Self {
        let mut machine = Self::fresh(persistence, config);
        if let Some(snapshot) = machine.persistence.load() {
            debug!(
                step = snapshot.current_step,
                completed = snapshot.completed_steps.len(),
                "Recovered saved onboarding session"
            );
            machine.restore(snapshot);
            machine.rederive_completion();
        }
        machine
    }

    /// Starts an edit-mode session from the server profile record.
    pub fn from_profile(
        persistence: PersistenceLayer,
        config: &WizardConfig,
        record: &Map<String, Value>,
    ) -> Self {
        let mut machine = Self::fresh(persistence, config);
        machine.form = FormData::from_profile(record);
        machine.rederive_completion();
        machine
    }

    fn fresh(persistence: PersistenceLayer, config: &WizardConfig) -> Self {
        Self {
            form: FormData::new(),
            other: OtherInputs::new(),
            current: 0,
            completed: BTreeSet::new(),
            engine: ValidationEngine::new(config.age),
            merger: EnrichmentMerger::new(config.age),
            persistence,
            rederive: RederiveGate::new(config.rederive_debounce()),
        }
    }

    pub fn current_step(&self) -> usize {
        self.current
    }

    pub fn completed_steps(&self) -> &BTreeSet<usize> {
        &self.completed
    }

    pub fn form(&self) -> &FormData {
        &self.form
    }

    pub fn other_inputs(&self) -> &OtherInputs {
        &self.other
    }

    pub fn mode(&self) -> WizardMode {
        self.persistence.mode()
    }

    pub fn persistence(&self) -> &PersistenceLayer {
        &self.persistence
    }

    pub fn is_review(&self) -> bool {
        self.current == REVIEW_STEP
    }

    pub fn step_status(&self, step: usize) -> StepStatus {
        self.engine.status(step, &self.form)
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            form_data: self.form.clone(),
            other_inputs: self.other.clone(),
            current_step: self.current,
            completed_steps: self.completed.clone(),
        }
    }

    /// Advances when the current step validates, marking it completed.
    pub fn next(&mut self) -> Result<NextOutcome, StepError> {
        self.flush_rederive();
        if !self.engine.is_valid(self.current, &self.form) {
            return Err(StepError::Incomplete {
                step: self.current,
                missing: self.engine.missing(self.current, &self.form),
            });
        }
        if self.is_review() {
            return Ok(NextOutcome::ReadyToSubmit);
        }
        self.completed.insert(self.current);
        self.current = (self.current + 1).min(STEP_COUNT - 1);
        debug!(step = self.current, "Advanced onboarding step");
        self.persist();
        Ok(NextOutcome::Advanced(self.current))
    }

    /// Steps back without touching completion; a no-op on the first step.
    pub fn previous(&mut self) -> usize {
        if self.current > 0 {
            self.current -= 1;
            self.persist();
        }
        self.current
    }

    /// Whether `target` can be opened directly from the current state.
    ///
    /// Step 0, the current step and any data-bearing step are always open,
    /// plus exactly one step past the furthest completed or data-bearing step.
    pub fn can_access(&self, target: usize) -> bool {
        if target >= STEP_COUNT {
            return false;
        }
        if target == 0 || target == self.current || self.engine.has_data(target, &self.form) {
            return true;
        }
        let furthest = self
            .completed
            .iter()
            .copied()
            .chain(self.engine.data_bearing_steps(&self.form))
            .max();
        furthest.map(|step| step + 1) == Some(target)
    }

    pub fn go_to(&mut self, target: usize) -> Result<usize, StepError> {
        self.flush_rederive();
        if target >= STEP_COUNT {
            return Err(StepError::OutOfRange { target });
        }
        if !self.can_access(target) {
            return Err(StepError::Locked { target });
        }
        if target != self.current {
            self.current = target;
            self.persist();
        }
        Ok(self.current)
    }

    pub fn set_field(&mut self, key: &str, value: FieldValue) -> Result<bool, FieldError> {
        self.set_field_at(key, value, Instant::now())
    }

    /// Same as [`set_field`](Self::set_field) with an explicit edit time.
    pub fn set_field_at(
        &mut self,
        key: &str,
        value: FieldValue,
        now: Instant,
    ) -> Result<bool, FieldError> {
        let changed = self.form.set(key, value)?;
        if changed {
            self.after_edit(now);
        }
        Ok(changed)
    }

    /// Selects or deselects one member of a string-set field.
    pub fn toggle_item(&mut self, key: &str, item: &str) -> Result<bool, FieldError> {
        let selected = self.form.items(key).iter().any(|existing| existing == item);
        let changed = if selected {
            self.form.remove_item(key, item)?
        } else {
            self.form.insert_item(key, item)?
        };
        if changed {
            self.after_edit(Instant::now());
        }
        Ok(!selected)
    }

    pub fn set_entry(&mut self, key: &str, entry: &str, value: &str) -> Result<bool, FieldError> {
        let changed = self.form.set_entry(key, entry, value)?;
        if changed {
            self.after_edit(Instant::now());
        }
        Ok(changed)
    }

    /// Free text for an "Other (please specify)" selection, saved with the form.
    pub fn set_other_input(&mut self, field: &str, text: &str) {
        if self.other.get(field) == Some(text) {
            return;
        }
        self.other.set(field, text);
        self.persist();
    }

    /// Re-derives completion if the debounce window has elapsed. Returns
    /// whether a re-derivation ran.
    ///
    /// Edits only arm the debounce; nothing fires on its own. The host must
    /// call this on a timer (at least once per `rederive_debounce_ms`) for
    /// data-bearing steps to reach the completed set without navigation.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.rederive.is_due(now) {
            return false;
        }
        self.flush_rederive();
        true
    }

    /// Unions every data-bearing step into the completed set. Never shrinks it.
    pub fn rederive_completion(&mut self) -> Vec<usize> {
        let added: Vec<usize> = self
            .engine
            .data_bearing_steps(&self.form)
            .into_iter()
            .filter(|step| self.completed.insert(*step))
            .collect();
        if !added.is_empty() {
            debug!(steps = ?added, "Marked steps completed from form data");
        }
        added
    }

    fn flush_rederive(&mut self) {
        if !self.rederive.is_pending() {
            return;
        }
        self.rederive.clear();
        if !self.rederive_completion().is_empty() {
            self.persist();
        }
    }

    fn after_edit(&mut self, now: Instant) {
        self.rederive.mark(now);
        self.persist();
    }

    /// Merges an enrichment payload and re-derives completion immediately.
    pub fn apply_enrichment(&mut self, payload: &Value) -> MergeReport {
        let (merged, report) = self.merger.merge_with_report(&self.form, payload);
        if !report.changed.is_empty() {
            self.form = merged;
            self.rederive.clear();
            self.rederive_completion();
            self.persist();
        }
        report
    }

    /// Re-checks the durable tier after another tab wrote to it or the
    /// window regained focus, adopting it when it disagrees.
    pub fn handle_signal(&mut self, signal: &ExternalSignal) -> SyncOutcome {
        if self.mode() == WizardMode::Edit {
            return SyncOutcome::Ignored;
        }
        match self.persistence.load() {
            Some(snapshot) => {
                if snapshot.fingerprint() == self.snapshot().fingerprint() {
                    return SyncOutcome::Unchanged;
                }
                info!(?signal, step = snapshot.current_step, "Adopting onboarding progress from storage");
                self.restore(snapshot);
                self.rederive.clear();
                if !self.rederive_completion().is_empty() {
                    self.persist();
                }
                SyncOutcome::Adopted
            }
            None => {
                if self.snapshot() == WizardSnapshot::default() {
                    return SyncOutcome::Unchanged;
                }
                info!(?signal, "Saved onboarding progress was cleared elsewhere");
                self.reset_in_memory();
                SyncOutcome::Cleared
            }
        }
    }

    /// Clears form data, completion and every persisted key ("change selection").
    pub fn reset(&mut self) {
        self.reset_in_memory();
        if let Err(error) = self.persistence.clear_all() {
            warn!(error = %format!("{error:#}"), "Failed clearing persisted onboarding state");
        }
    }

    fn reset_in_memory(&mut self) {
        self.form = FormData::new();
        self.other.clear();
        self.current = 0;
        self.completed.clear();
        self.rederive.clear();
    }

    pub fn submission_payload(&self) -> SubmissionPayload {
        assemble(&self.form, &self.other)
    }

    fn restore(&mut self, snapshot: WizardSnapshot) {
        let snapshot = snapshot.normalized();
        self.form = snapshot.form_data;
        self.other = snapshot.other_inputs;
        self.current = snapshot.current_step;
        self.completed = snapshot.completed_steps;
    }

    fn persist(&self) {
        if let Err(error) = self.persistence.save(&self.snapshot()) {
            warn!(error = %format!("{error:#}"), "Failed saving onboarding progress");
        }
    }
}
