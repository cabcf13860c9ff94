//! Mirrors wizard progress and the onboarding selection into storage tiers.
//!
//! The layer never owns the wizard state: it writes what the state machine
//! hands it and reads back on load or when another session reports a change.
//! Corrupt entries are logged and treated as "no saved session".

pub mod bus;
pub mod selection;
pub mod snapshot;
pub mod tier;

pub use bus::{ChangeBus, ChangeSubscription, ExternalSignal, StorageEvent};
pub use selection::{resolve_selection, SelectionResolution, ServerOnboarding};
pub use snapshot::{OnboardingType, Selection, WizardSnapshot};
pub use tier::{FileTier, MemoryTier, StorageTier};

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::schema::{FormData, OtherInputs};

/// Whether the wizard creates a new profile or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardMode {
    Create,
    /// Starts from the server profile and never caches progress locally.
    Edit,
}

/// Storage keys, namespaced by the configured prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub form_data: String,
    pub other_inputs: String,
    pub current_step: String,
    pub completed_steps: String,
    pub selected_type: String,
    pub type_selected: String,
}

impl StorageKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            form_data: format!("{prefix}_form_data"),
            other_inputs: format!("{prefix}_other_inputs"),
            current_step: format!("{prefix}_current_step"),
            completed_steps: format!("{prefix}_completed_steps"),
            selected_type: format!("{prefix}_selected_type"),
            type_selected: format!("{prefix}_type_selected_bool"),
        }
    }

    fn progress(&self) -> [&str; 4] {
        [
            self.form_data.as_str(),
            self.other_inputs.as_str(),
            self.current_step.as_str(),
            self.completed_steps.as_str(),
        ]
    }

    fn selection(&self) -> [&str; 2] {
        [self.selected_type.as_str(), self.type_selected.as_str()]
    }
}

pub struct PersistenceLayer {
    durable: Arc<dyn StorageTier>,
    session: Arc<dyn StorageTier>,
    bus: Option<ChangeBus>,
    keys: StorageKeys,
    origin: Uuid,
    mode: WizardMode,
}

impl PersistenceLayer {
    pub fn new(
        durable: Arc<dyn StorageTier>,
        session: Arc<dyn StorageTier>,
        keys: StorageKeys,
        mode: WizardMode,
    ) -> Self {
        Self {
            durable,
            session,
            bus: None,
            keys,
            origin: Uuid::new_v4(),
            mode,
        }
    }

    /// Publishes durable writes on `bus` so other sessions can re-check.
    pub fn with_bus(mut self, bus: ChangeBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn mode(&self) -> WizardMode {
        self.mode
    }

    pub fn origin(&self) -> Uuid {
        self.origin
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn subscribe(&self) -> Option<ChangeSubscription> {
        self.bus.as_ref().map(|bus| bus.subscribe(self.origin))
    }

    /// Reads saved progress from the durable tier.
    ///
    /// Returns `None` in edit mode, when nothing is saved, or when any entry
    /// is unreadable.
    pub fn load(&self) -> Option<WizardSnapshot> {
        if self.mode == WizardMode::Edit {
            return None;
        }
        match self.read_snapshot() {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(error = %format!("{error:#}"), "Ignoring corrupt saved onboarding session");
                None
            }
        }
    }

    fn read_snapshot(&self) -> Result<Option<WizardSnapshot>> {
        let Some(raw_form) = self.durable.get(&self.keys.form_data)? else {
            return Ok(None);
        };
        let form_data: FormData =
            serde_json::from_str(&raw_form).context("Failed parsing saved form data")?;
        let other_inputs: OtherInputs = match self.durable.get(&self.keys.other_inputs)? {
            Some(raw) => serde_json::from_str(&raw).context("Failed parsing saved other inputs")?,
            None => OtherInputs::new(),
        };
        let current_step = match self.durable.get(&self.keys.current_step)? {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("Failed parsing saved step '{raw}'"))?,
            None => 0,
        };
        let completed_steps: BTreeSet<usize> = match self.durable.get(&self.keys.completed_steps)? {
            Some(raw) => serde_json::from_str::<Vec<usize>>(&raw)
                .context("Failed parsing saved completed steps")?
                .into_iter()
                .collect(),
            None => BTreeSet::new(),
        };
        Ok(Some(
            WizardSnapshot {
                form_data,
                other_inputs,
                current_step,
                completed_steps,
            }
            .normalized(),
        ))
    }

    /// Writes progress through to the durable tier. No-op in edit mode.
    ///
    /// Unchanged entries are skipped so an adopted snapshot does not echo back
    /// to the session it came from.
    pub fn save(&self, snapshot: &WizardSnapshot) -> Result<()> {
        if self.mode == WizardMode::Edit {
            return Ok(());
        }
        let form = serde_json::to_string(&snapshot.form_data)
            .context("Failed serializing form data")?;
        let completed: Vec<usize> = snapshot.completed_steps.iter().copied().collect();
        let completed = serde_json::to_string(&completed)?;
        let other = serde_json::to_string(&snapshot.other_inputs)
            .context("Failed serializing other inputs")?;
        self.write_durable(&self.keys.form_data, &form)?;
        self.write_durable(&self.keys.other_inputs, &other)?;
        self.write_durable(&self.keys.current_step, &snapshot.current_step.to_string())?;
        self.write_durable(&self.keys.completed_steps, &completed)?;
        Ok(())
    }

    pub fn clear_progress(&self) -> Result<()> {
        for key in self.keys.progress() {
            self.remove_durable(key)?;
        }
        Ok(())
    }

    /// Selection flags as stored in the durable and session tiers.
    pub fn read_selection(&self) -> (Option<Selection>, Option<Selection>) {
        (
            self.read_selection_from(self.durable.as_ref(), "durable"),
            self.read_selection_from(self.session.as_ref(), "session"),
        )
    }

    fn read_selection_from(&self, tier: &dyn StorageTier, label: &str) -> Option<Selection> {
        let read = || -> Result<Option<Selection>> {
            let Some(raw_type) = tier.get(&self.keys.selected_type)? else {
                return Ok(None);
            };
            let onboarding_type: OnboardingType = raw_type.parse()?;
            let confirmed = tier
                .get(&self.keys.type_selected)?
                .map(|raw| raw.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false);
            Ok(Some(Selection {
                onboarding_type,
                confirmed,
            }))
        };
        match read() {
            Ok(selection) => selection,
            Err(error) => {
                warn!(tier = label, error = %format!("{error:#}"), "Ignoring corrupt selection flags");
                None
            }
        }
    }

    /// Mirrors the selection into both tiers.
    pub fn write_selection(&self, selection: Selection) -> Result<()> {
        let confirmed = if selection.confirmed { "true" } else { "false" };
        self.write_durable(&self.keys.selected_type, selection.onboarding_type.as_str())?;
        self.write_durable(&self.keys.type_selected, confirmed)?;
        self.session
            .set(&self.keys.selected_type, selection.onboarding_type.as_str())?;
        self.session.set(&self.keys.type_selected, confirmed)?;
        Ok(())
    }

    pub fn clear_selection(&self) -> Result<()> {
        for key in self.keys.selection() {
            self.remove_durable(key)?;
            self.session.remove(key)?;
        }
        Ok(())
    }

    /// Clears progress and selection from every tier. Used after a successful
    /// submission and by the explicit reset.
    pub fn clear_all(&self) -> Result<()> {
        self.clear_progress()?;
        self.clear_selection()?;
        Ok(())
    }

    /// Applies a resolved selection to storage and returns the adopted selection.
    pub fn apply_resolution(&self, resolution: SelectionResolution) -> Result<Option<Selection>> {
        match resolution {
            SelectionResolution::Local(selection) | SelectionResolution::FromServer(selection) => {
                self.write_selection(selection)?;
            }
            SelectionResolution::Cleared => {
                debug!("Server reports onboarding not completed; clearing local selection");
                self.clear_all()?;
            }
            SelectionResolution::Unselected => {}
        }
        Ok(resolution.selection())
    }

    fn write_durable(&self, key: &str, value: &str) -> Result<()> {
        if self.durable.get(key)?.as_deref() == Some(value) {
            return Ok(());
        }
        self.durable.set(key, value)?;
        self.notify(key);
        Ok(())
    }

    fn remove_durable(&self, key: &str) -> Result<()> {
        if self.durable.get(key)?.is_none() {
            return Ok(());
        }
        self.durable.remove(key)?;
        self.notify(key);
        Ok(())
    }

    fn notify(&self, key: &str) {
        if let Some(bus) = &self.bus {
            bus.publish(StorageEvent {
                key: key.to_string(),
                origin: self.origin,
            });
        }
    }
}
