//! Debounced search-as-you-type for the business lookup field.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::api::{Prediction, SearchApi};
use crate::config::WizardConfig;

/// Predictions for the most recent query that produced a result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predictions {
    pub seq: u64,
    pub query: String,
    pub items: Vec<Prediction>,
}

pub struct AutocompleteDebouncer {
    api: Arc<dyn SearchApi>,
    idle: Duration,
    min_chars: usize,
    seq: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
    results: Arc<watch::Sender<Predictions>>,
}

impl AutocompleteDebouncer {
    pub fn new(api: Arc<dyn SearchApi>, config: &WizardConfig) -> Self {
        let (results, _) = watch::channel(Predictions::default());
        Self {
            api,
            idle: config.autocomplete_idle(),
            min_chars: config.autocomplete_min_chars,
            seq: Arc::new(AtomicU64::new(0)),
            pending: None,
            results: Arc::new(results),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Predictions> {
        self.results.subscribe()
    }

    pub fn latest(&self) -> Predictions {
        self.results.borrow().clone()
    }

    /// Feeds the raw input text. Cancels any pending request; a trailing
    /// space fires immediately, otherwise the request waits out the idle window.
    /// Must be called from within a tokio runtime.
    pub fn input(&mut self, raw: &str) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancel();

        let query = raw.trim().to_string();
        if query.chars().count() < self.min_chars {
            self.results.send_replace(Predictions {
                seq,
                query,
                items: Vec::new(),
            });
            return;
        }

        let delay = if raw.ends_with(char::is_whitespace) {
            Duration::ZERO
        } else {
            self.idle
        };
        let api = Arc::clone(&self.api);
        let latest = Arc::clone(&self.seq);
        let results = Arc::clone(&self.results);
        self.pending = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            debug!(seq, query = %query, "Requesting autocomplete predictions");
            let items = match api.autocomplete(&query).await {
                Ok(items) => items,
                Err(error) => {
                    warn!(seq, error = %error, "Autocomplete request failed");
                    Vec::new()
                }
            };
            if latest.load(Ordering::SeqCst) != seq {
                debug!(seq, "Dropping superseded autocomplete result");
                return;
            }
            results.send_replace(Predictions { seq, query, items });
        }));
    }

    /// Aborts the pending timer or request, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for AutocompleteDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
