//! Background command service
//!
//! Owns the process-wide [`BackupScheduler`] and the optional watch loop,
//! and turns inbound [`Command`]s into scheduler calls and events. One
//! service instance is shared by every connected observer.
//!
//! ## Watch loop
//!
//! `startWatch` counts the files of the watched folders right away and then
//! once per watch interval, broadcasting `done { result: { count } }` after
//! every scan. The folder list can be replaced by a later `startWatch`
//! without restarting the loop.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use backupbox_core::config::SyncConfig;
use backupbox_core::domain::{Command, Event};
use backupbox_core::ports::{IDirectory, IDirectorySource};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::counter::FileCounter;
use crate::observers::ObserverRegistry;
use crate::scheduler::{BackupScheduler, SchedulerState};

/// Snapshot reported to observers asking for the service status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub scheduler: SchedulerState,
    pub watching: bool,
    pub watched_dirs: usize,
}

pub struct BackgroundService {
    scheduler: Arc<BackupScheduler>,
    source: Arc<dyn IDirectorySource>,
    counter: FileCounter,
    watch_interval: Duration,
    watch_dirs: Arc<Mutex<Vec<PathBuf>>>,
    watch_task: Mutex<Option<JoinHandle<()>>>,
}

impl BackgroundService {
    pub fn new(
        scheduler: Arc<BackupScheduler>,
        source: Arc<dyn IDirectorySource>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            scheduler,
            source,
            counter: FileCounter::new(config.max_depth),
            watch_interval: Duration::from_secs(config.watch_interval_secs),
            watch_dirs: Arc::new(Mutex::new(Vec::new())),
            watch_task: Mutex::new(None),
        }
    }

    pub fn scheduler(&self) -> &Arc<BackupScheduler> {
        &self.scheduler
    }

    pub fn observers(&self) -> &Arc<ObserverRegistry> {
        self.scheduler.observers()
    }

    /// Handle one command, returning the reply for the sender (if any)
    ///
    /// Lifecycle events are broadcast to every observer as a side effect.
    #[tracing::instrument(skip(self))]
    pub async fn handle(&self, command: Command) -> Option<Event> {
        match command {
            Command::ScheduleNextBackup { delay_ms } => {
                self.scheduler.schedule_next(Duration::from_millis(delay_ms));
                None
            }
            Command::StopBackup => {
                self.scheduler.cancel();
                None
            }
            Command::StartWatch { dir_handles } => Some(self.start_watch(dir_handles)),
            Command::StopWatch => Some(self.stop_watch()),
            Command::Count { dir_handles } => Some(self.count(&dir_handles).await),
        }
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            scheduler: self.scheduler.state(),
            watching: self.is_watching(),
            watched_dirs: lock(&self.watch_dirs).len(),
        }
    }

    pub fn is_watching(&self) -> bool {
        lock(&self.watch_task).is_some()
    }

    fn start_watch(&self, dirs: Option<Vec<PathBuf>>) -> Event {
        let dirs = {
            let mut watched = lock(&self.watch_dirs);
            if let Some(dirs) = dirs {
                *watched = dirs;
            }
            watched.clone()
        };
        if dirs.is_empty() {
            return Event::error("No directories to watch");
        }

        let mut task = lock(&self.watch_task);
        if task.is_none() {
            info!(dirs = dirs.len(), interval_secs = self.watch_interval.as_secs(), "Starting watch loop");
            self.observers().broadcast(Event::WatchStarted);
            *task = Some(self.spawn_watch_loop());
        } else {
            debug!(dirs = dirs.len(), "Watch loop already running, folder list updated");
        }
        Event::Started
    }

    fn stop_watch(&self) -> Event {
        if let Some(task) = lock(&self.watch_task).take() {
            task.abort();
            info!("Watch loop stopped");
            self.observers().broadcast(Event::WatchStopped);
        }
        Event::Stopped
    }

    async fn count(&self, paths: &[PathBuf]) -> Event {
        if paths.is_empty() {
            return Event::error("No directories to count");
        }
        let dirs: Vec<Arc<dyn IDirectory>> = paths.iter().map(|p| self.source.open(p)).collect();
        let count = self.counter.count_all(&dirs).await;
        debug!(count, dirs = dirs.len(), "Counted files");
        Event::count_done(count)
    }

    fn spawn_watch_loop(&self) -> JoinHandle<()> {
        let source = Arc::clone(&self.source);
        let observers = Arc::clone(self.observers());
        let watch_dirs = Arc::clone(&self.watch_dirs);
        let counter = self.counter;
        let period = self.watch_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let paths = lock(&watch_dirs).clone();
                let dirs: Vec<Arc<dyn IDirectory>> =
                    paths.iter().map(|p| source.open(p)).collect();
                let count = counter.count_all(&dirs).await;
                debug!(count, "Watch scan complete");
                observers.broadcast(Event::count_done(count));
            }
        })
    }
}

impl Drop for BackgroundService {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.watch_task).take() {
            task.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
