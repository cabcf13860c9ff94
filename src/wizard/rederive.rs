//! Debounce gate for completion re-derivation after form edits.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RederiveGate {
    window: Duration,
    pending_since: Option<Instant>,
}

impl RederiveGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending_since: None,
        }
    }

    /// Records an edit; each edit restarts the idle window.
    pub fn mark(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// True once the idle window has elapsed since the last edit.
    pub fn is_due(&self, now: Instant) -> bool {
        self.pending_since
            .map(|since| now.saturating_duration_since(since) >= self.window)
            .unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.pending_since = None;
    }
}
