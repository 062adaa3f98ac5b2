//! Event broadcast
//!
//! Every observer gets its own unbounded channel. Broadcasting clones the
//! event into each live channel; channels whose receiver was dropped are
//! pruned on the way.

use std::sync::Mutex;

use backupbox_core::domain::Event;
use tokio::sync::mpsc;
use tracing::trace;

/// Registry of event observers
#[derive(Debug, Default)]
pub struct ObserverRegistry {
    senders: Mutex<Vec<mpsc::UnboundedSender<Event>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new observer and return its event stream
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    /// Send `event` to every observer, returning how many received it
    pub fn broadcast(&self, event: Event) -> usize {
        let mut senders = self.lock();
        senders.retain(|tx| tx.send(event.clone()).is_ok());
        trace!(kind = event.kind(), observers = senders.len(), "Broadcast event");
        senders.len()
    }

    /// Number of registered observers, including ones not yet pruned
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<Event>>> {
        self.senders
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
