//! Cosmetic staged status messages while a smart-search lookup runs.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::warn;

const MIN_PERIOD: Duration = Duration::from_millis(1);

pub const SEARCH_STAGES: &[&str] = &[
    "Searching for your business...",
    "Reading your website...",
    "Analyzing your brand...",
    "Preparing suggestions...",
];

/// Advances through `stages` on a fixed interval until stopped or dropped.
pub struct ProgressTicker {
    handle: Option<JoinHandle<()>>,
    stage: Arc<watch::Sender<Option<&'static str>>>,
}

impl ProgressTicker {
    /// Starts ticking immediately with the first stage. Needs a tokio runtime.
    pub fn start(period: Duration, stages: &'static [&'static str]) -> Self {
        let (stage, _) = watch::channel(None);
        Self::attach(Arc::new(stage), period, stages)
    }

    /// Like [`start`](Self::start), publishing into an existing channel.
    pub fn attach(
        stage: Arc<watch::Sender<Option<&'static str>>>,
        period: Duration,
        stages: &'static [&'static str],
    ) -> Self {
        stage.send_replace(stages.first().copied());
        if period < MIN_PERIOD {
            warn!(?period, "Progress interval too short; using {:?}", MIN_PERIOD);
        }
        let period = period.max(MIN_PERIOD);
        let sender = Arc::clone(&stage);
        let handle = tokio::spawn(async move {
            if stages.is_empty() {
                return;
            }
            let mut ticks = interval(period);
            // The first tick completes immediately and the first stage is already shown.
            ticks.tick().await;
            let mut index = 0;
            loop {
                ticks.tick().await;
                index = (index + 1) % stages.len();
                sender.send_replace(Some(stages[index]));
            }
        });
        Self {
            handle: Some(handle),
            stage,
        }
    }

    pub fn current(&self) -> Option<&'static str> {
        *self.stage.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<&'static str>> {
        self.stage.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stops the ticker and clears the message.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.stage.send_replace(None);
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
