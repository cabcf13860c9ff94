//! Change notifications between sessions sharing a durable store.
//!
//! Stands in for browser storage events: every durable write is published
//! with the writer's origin id, and subscribers skip their own writes.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use uuid::Uuid;

const BUS_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub origin: Uuid,
}

/// External conditions that make a session re-check the durable tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalSignal {
    /// Another session wrote the given key; `None` when events were missed.
    StorageChanged { key: Option<String> },
    VisibilityRegained,
    WindowFocused,
}

#[derive(Debug, Clone)]
pub struct ChangeBus {
    sender: broadcast::Sender<StorageEvent>,
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: StorageEvent) {
        // No subscribers is the single-tab case.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self, origin: Uuid) -> ChangeSubscription {
        ChangeSubscription {
            origin,
            receiver: self.sender.subscribe(),
        }
    }
}

pub struct ChangeSubscription {
    origin: Uuid,
    receiver: broadcast::Receiver<StorageEvent>,
}

impl ChangeSubscription {
    /// Next foreign change, without waiting.
    pub fn try_next(&mut self) -> Option<ExternalSignal> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.origin == self.origin => continue,
                Ok(event) => {
                    return Some(ExternalSignal::StorageChanged {
                        key: Some(event.key),
                    })
                }
                Err(TryRecvError::Lagged(_)) => {
                    return Some(ExternalSignal::StorageChanged { key: None })
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Waits for the next foreign change. `None` once every publisher is gone.
    pub async fn next(&mut self) -> Option<ExternalSignal> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.origin == self.origin => continue,
                Ok(event) => {
                    return Some(ExternalSignal::StorageChanged {
                        key: Some(event.key),
                    })
                }
                Err(RecvError::Lagged(_)) => {
                    return Some(ExternalSignal::StorageChanged { key: None })
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Collapses every pending foreign change into at most one signal.
    pub fn drain(&mut self) -> Option<ExternalSignal> {
        let mut latest = None;
        while let Some(signal) = self.try_next() {
            latest = Some(match (latest, signal) {
                (Some(ExternalSignal::StorageChanged { key: None }), _) => {
                    ExternalSignal::StorageChanged { key: None }
                }
                (_, signal) => signal,
            });
        }
        latest
    }
}
