//! Backup scheduler - a one-shot timer that asks observers to run a backup
//!
//! ## States
//!
//! ```text
//!            schedule_next                 timer fires
//!   Idle ─────────────────────→ Armed ─────────────────────→ Idle
//!    ↑                            │       (broadcast triggerBackup)
//!    └────────── cancel ──────────┘
//!           (broadcast stopped)
//! ```
//!
//! `Running` is reported while an observer has signalled that a run is in
//! progress ([`BackupScheduler::mark_running`] / [`BackupScheduler::mark_finished`]).
//! The scheduler never runs a backup itself; it only broadcasts
//! `triggerBackup` and lets an observer react.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use backupbox_core::domain::Event;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::observers::ObserverRegistry;

/// Observable scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Armed,
    Running,
}

#[derive(Default)]
struct TimerSlot {
    handle: Option<JoinHandle<()>>,
    /// Bumped on every arm/disarm so a timer that already woke up can tell
    /// it was superseded
    generation: u64,
    running: bool,
}

/// One-shot backup timer shared by every observer
pub struct BackupScheduler {
    observers: Arc<ObserverRegistry>,
    slot: Arc<Mutex<TimerSlot>>,
}

impl BackupScheduler {
    pub fn new(observers: Arc<ObserverRegistry>) -> Self {
        Self {
            observers,
            slot: Arc::new(Mutex::new(TimerSlot::default())),
        }
    }

    /// Arm the timer to fire after `delay`, replacing any pending timer
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule_next(&self, delay: Duration) {
        let mut slot = lock(&self.slot);
        if let Some(previous) = slot.handle.take() {
            previous.abort();
        }
        slot.generation += 1;
        let generation = slot.generation;

        let shared = Arc::clone(&self.slot);
        let observers = Arc::clone(&self.observers);
        slot.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut slot = lock(&shared);
                if slot.generation != generation {
                    return;
                }
                slot.handle = None;
            }
            info!("Backup timer fired");
            observers.broadcast(Event::TriggerBackup);
        }));

        info!(delay_ms = delay.as_millis() as u64, "Next backup scheduled");
    }

    /// Disarm the pending timer, if any
    ///
    /// Broadcasts `stopped` only when a timer was actually pending.
    pub fn cancel(&self) {
        let cancelled = {
            let mut slot = lock(&self.slot);
            match slot.handle.take() {
                Some(handle) => {
                    handle.abort();
                    slot.generation += 1;
                    true
                }
                None => false,
            }
        };

        if cancelled {
            info!("Scheduled backup cancelled");
            self.observers.broadcast(Event::Stopped);
        } else {
            debug!("Cancel requested with no pending backup");
        }
    }

    /// Record that a run started
    pub fn mark_running(&self) {
        lock(&self.slot).running = true;
    }

    /// Record that a run ended
    pub fn mark_finished(&self) {
        lock(&self.slot).running = false;
    }

    pub fn state(&self) -> SchedulerState {
        let slot = lock(&self.slot);
        if slot.running {
            SchedulerState::Running
        } else if slot.handle.is_some() {
            SchedulerState::Armed
        } else {
            SchedulerState::Idle
        }
    }

    pub fn observers(&self) -> &Arc<ObserverRegistry> {
        &self.observers
    }
}

impl Drop for BackupScheduler {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.slot).handle.take() {
            handle.abort();
        }
    }
}

fn lock(slot: &Mutex<TimerSlot>) -> MutexGuard<'_, TimerSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
