//! Coordinates the enrichment sources feeding one wizard session.
//!
//! Every request takes a per-source ticket. A completion whose ticket is no
//! longer the latest for its source is still merged, since merging is
//! idempotent, but it leaves that source's status alone. After teardown every
//! completion is discarded unseen. A request abandoned before it completes
//! returns its source to idle.

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::api::{
    ApiError, ColorPalette, DocumentApi, DocumentUpload, LookupRequest, LookupResponse, MediaApi,
    SearchApi,
};
use crate::enrichment::MergeReport;
use crate::schema::fields::{BRAND_COLORS, ENRICHMENT_SOURCE};
use crate::wizard::WizardMachine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnrichmentSource {
    Document,
    SmartSearch,
    Colors,
}

impl EnrichmentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::SmartSearch => "smart_search",
            Self::Colors => "colors",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub source: EnrichmentSource,
    seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutofillStatus {
    Idle,
    Running,
    Applied { fields: usize },
    Failed { message: String },
}

impl AutofillStatus {
    /// Inline message shown next to the source's trigger.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Idle => None,
            Self::Running => Some("Looking up your details...".to_string()),
            Self::Applied { fields: 0 } => Some("No new details found".to_string()),
            Self::Applied { fields } => Some(format!("Filled {fields} fields")),
            Self::Failed { message } => Some(format!("Autofill failed: {message}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AutofillOutcome {
    Applied(MergeReport),
    /// Merged, but a newer request for the same source owns the status.
    AppliedStale(MergeReport),
    /// Arrived after teardown.
    Discarded,
    Failed(ApiError),
}

impl AutofillOutcome {
    pub fn report(&self) -> Option<&MergeReport> {
        match self {
            Self::Applied(report) | Self::AppliedStale(report) => Some(report),
            Self::Discarded | Self::Failed(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct AutofillCoordinator {
    latest: BTreeMap<EnrichmentSource, u64>,
    statuses: BTreeMap<EnrichmentSource, AutofillStatus>,
    next_seq: u64,
    torn_down: bool,
}

impl AutofillCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a ticket that supersedes any in-flight request for `source`.
    pub fn begin(&mut self, source: EnrichmentSource) -> Ticket {
        self.next_seq += 1;
        self.latest.insert(source, self.next_seq);
        if !self.torn_down {
            self.statuses.insert(source, AutofillStatus::Running);
        }
        Ticket {
            source,
            seq: self.next_seq,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.get(&ticket.source) == Some(&ticket.seq)
    }

    pub fn status(&self, source: EnrichmentSource) -> AutofillStatus {
        self.statuses
            .get(&source)
            .cloned()
            .unwrap_or(AutofillStatus::Idle)
    }

    /// Marks the owning view as gone; later completions are dropped.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.statuses.clear();
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Forgets a request that will never complete. The source goes back to
    /// idle unless a newer request already owns its status.
    pub fn abandon(&mut self, ticket: Ticket) {
        if self.is_current(ticket) && self.status(ticket.source) == AutofillStatus::Running {
            debug!(source = ticket.source.as_str(), "Autofill request abandoned");
            self.statuses.remove(&ticket.source);
        }
    }

    fn track(&mut self, ticket: Ticket) -> InFlight<'_> {
        InFlight {
            coordinator: self,
            ticket,
            settled: false,
        }
    }

    /// Applies the result of a request issued with `ticket`.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<Value, ApiError>,
        machine: &mut WizardMachine,
    ) -> AutofillOutcome {
        let source = ticket.source.as_str();
        if self.torn_down {
            debug!(source, "Discarding enrichment result after teardown");
            return AutofillOutcome::Discarded;
        }
        let current = self.is_current(ticket);
        match result {
            Err(error) => {
                warn!(source, current, error = %error, "Enrichment request failed");
                if current {
                    self.statuses.insert(
                        ticket.source,
                        AutofillStatus::Failed {
                            message: error.to_string(),
                        },
                    );
                }
                AutofillOutcome::Failed(error)
            }
            Ok(payload) => {
                let report = machine.apply_enrichment(&tag_source(payload, ticket.source));
                info!(
                    source,
                    current,
                    changed = report.changed.len(),
                    dropped = report.dropped.len(),
                    "Merged enrichment result"
                );
                if current {
                    self.statuses.insert(
                        ticket.source,
                        AutofillStatus::Applied {
                            fields: report.changed.len(),
                        },
                    );
                    AutofillOutcome::Applied(report)
                } else {
                    AutofillOutcome::AppliedStale(report)
                }
            }
        }
    }

    pub async fn from_document(
        &mut self,
        api: &dyn DocumentApi,
        document: &DocumentUpload,
        machine: &mut WizardMachine,
    ) -> AutofillOutcome {
        let ticket = self.begin(EnrichmentSource::Document);
        let request = self.track(ticket);
        let result = fetch_document(api, document).await;
        request.finish(result, machine)
    }

    pub async fn from_lookup(
        &mut self,
        api: &dyn SearchApi,
        lookup: &LookupRequest,
        machine: &mut WizardMachine,
    ) -> AutofillOutcome {
        let ticket = self.begin(EnrichmentSource::SmartSearch);
        let request = self.track(ticket);
        let result = fetch_lookup(api, lookup).await;
        request.finish(result, machine)
    }

    pub async fn from_logo(
        &mut self,
        api: &dyn MediaApi,
        image_url: &str,
        machine: &mut WizardMachine,
    ) -> AutofillOutcome {
        let ticket = self.begin(EnrichmentSource::Colors);
        let request = self.track(ticket);
        let result = api.extract_colors(image_url).await.map(palette_payload);
        request.finish(result, machine)
    }

    /// Waits for a detached request and applies its result.
    pub async fn finish(
        &mut self,
        pending: PendingAutofill,
        machine: &mut WizardMachine,
    ) -> AutofillOutcome {
        let request = self.track(pending.ticket);
        let result = pending.join().await;
        request.finish(result, machine)
    }

    /// Stops a detached request without applying anything.
    pub fn cancel(&mut self, pending: PendingAutofill) {
        self.abandon(pending.ticket);
    }
}

/// Keeps a source's status honest while its request is awaited. Dropping the
/// guard unfinished (timeout, `select!`, unmount) abandons the ticket.
struct InFlight<'a> {
    coordinator: &'a mut AutofillCoordinator,
    ticket: Ticket,
    settled: bool,
}

impl InFlight<'_> {
    fn finish(mut self, result: Result<Value, ApiError>, machine: &mut WizardMachine) -> AutofillOutcome {
        self.settled = true;
        let ticket = self.ticket;
        self.coordinator.complete(ticket, result, machine)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator.abandon(self.ticket);
        }
    }
}

/// An enrichment request running on its own task, so the session stays usable
/// (teardown, a newer request) while it is in flight. Dropping it aborts the task.
pub struct PendingAutofill {
    ticket: Ticket,
    handle: JoinHandle<Result<Value, ApiError>>,
}

impl PendingAutofill {
    /// Spawns `request` for `ticket`. Needs a tokio runtime.
    pub fn spawn<F>(ticket: Ticket, request: F) -> Self
    where
        F: Future<Output = Result<Value, ApiError>> + Send + 'static,
    {
        Self {
            ticket,
            handle: tokio::spawn(request),
        }
    }

    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    async fn join(mut self) -> Result<Value, ApiError> {
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(error) => Err(ApiError::Network(format!("autofill task stopped: {error}"))),
        }
    }
}

impl Drop for PendingAutofill {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Parses an uploaded document, refusing types the parser does not accept.
pub async fn fetch_document(
    api: &dyn DocumentApi,
    document: &DocumentUpload,
) -> Result<Value, ApiError> {
    match document.kind() {
        Some(_) => api.parse(document).await,
        None => Err(ApiError::Rejected(format!(
            "unsupported document type: {}",
            document.file_name
        ))),
    }
}

pub async fn fetch_lookup(api: &dyn SearchApi, lookup: &LookupRequest) -> Result<Value, ApiError> {
    api.lookup(lookup)
        .await
        .and_then(|response| lookup_payload(response, lookup.place_id.as_deref()))
}

/// Unwraps a lookup response; `success: false` is a failure even on HTTP success.
pub fn lookup_payload(response: LookupResponse, place_id: Option<&str>) -> Result<Value, ApiError> {
    if !response.success {
        let message = response
            .error
            .unwrap_or_else(|| "no matching business found".to_string());
        return Err(ApiError::Rejected(message));
    }
    match response.data {
        Value::Object(mut data) => {
            if let Some(place_id) = place_id {
                data.entry("place_id")
                    .or_insert_with(|| Value::String(place_id.to_string()));
            }
            Ok(Value::Object(data))
        }
        Value::Null => Ok(json!({})),
        other => Err(ApiError::Malformed(format!(
            "expected lookup data object, got {other}"
        ))),
    }
}

pub fn palette_payload(palette: ColorPalette) -> Value {
    let colors: Vec<String> = palette
        .colors
        .into_iter()
        .map(|color| color.trim().to_string())
        .filter(|color| !color.is_empty())
        .collect();
    let mut payload = Map::new();
    payload.insert(BRAND_COLORS.to_string(), Value::from(colors));
    Value::Object(payload)
}

fn tag_source(payload: Value, source: EnrichmentSource) -> Value {
    match payload {
        Value::Object(mut map) => {
            map.entry(ENRICHMENT_SOURCE)
                .or_insert_with(|| Value::String(source.as_str().to_string()));
            Value::Object(map)
        }
        other => other,
    }
}
