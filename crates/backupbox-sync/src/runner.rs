//! Synchronization runner
//!
//! Wraps one orchestrator run with the event protocol: `started`, a
//! `progress` event before every upload, then `done` or `error`. After every
//! run the scheduler is re-armed for the next one. Only one run can be in
//! progress at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use backupbox_core::config::SyncConfig;
use backupbox_core::domain::{Event, FolderConfig, SyncResult};
use tracing::{info, warn};

use crate::engine::SyncOrchestrator;
use crate::scheduler::BackupScheduler;
use crate::SyncError;

pub struct SyncRunner {
    orchestrator: SyncOrchestrator,
    scheduler: Arc<BackupScheduler>,
    reschedule_after: Duration,
    running: AtomicBool,
    last_result: Mutex<Option<SyncResult>>,
}

/// Clears the running flags when a run ends, even if it is dropped midway
struct RunGuard<'a> {
    running: &'a AtomicBool,
    scheduler: &'a BackupScheduler,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.scheduler.mark_finished();
        self.running.store(false, Ordering::Release);
    }
}

impl SyncRunner {
    pub fn new(
        orchestrator: SyncOrchestrator,
        scheduler: Arc<BackupScheduler>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            orchestrator,
            scheduler,
            reschedule_after: Duration::from_secs(config.schedule_interval_secs),
            running: AtomicBool::new(false),
            last_result: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Summary of the last successful run
    pub fn last_result(&self) -> Option<SyncResult> {
        *self
            .last_result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Synchronize `folders` and report the run to every observer
    ///
    /// # Errors
    /// - `SyncError::AlreadyRunning` if another run is in progress (nothing
    ///   is broadcast and the scheduler is left alone)
    /// - any error of [`SyncOrchestrator::sync_all`], after it was broadcast
    ///   as an `error` event
    #[tracing::instrument(skip_all, fields(folders = folders.len()))]
    pub async fn run(&self, folders: &[FolderConfig]) -> Result<SyncResult, SyncError> {
        if self.running.swap(true, Ordering::AcqRel) {
            warn!("Synchronization requested while one is running, ignoring");
            return Err(SyncError::AlreadyRunning);
        }
        let guard = RunGuard {
            running: &self.running,
            scheduler: &self.scheduler,
        };

        self.scheduler.mark_running();
        let observers = Arc::clone(self.scheduler.observers());
        observers.broadcast(Event::Started);

        let progress = {
            let observers = Arc::clone(&observers);
            move |done: u64, total: u64, path: &str| {
                observers.broadcast(Event::Progress {
                    done,
                    total,
                    current_file: path.to_string(),
                });
            }
        };
        let result = self.orchestrator.sync_all(folders, &progress).await;
        drop(guard);

        match &result {
            Ok(summary) => {
                *self
                    .last_result
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(*summary);
                observers.broadcast(Event::sync_done(*summary));
            }
            Err(err) => {
                observers.broadcast(Event::error(err.to_string()));
            }
        }

        self.scheduler.schedule_next(self.reschedule_after);
        info!(
            next_in_secs = self.reschedule_after.as_secs(),
            ok = result.is_ok(),
            "Run finished"
        );
        result
    }
}
