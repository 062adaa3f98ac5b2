//! D-Bus service implementation for the BackupBox daemon
//!
//! [`SchedulerInterface`] turns method calls into [`Command`]s for the shared
//! [`BackgroundService`]. Replies of the service are broadcast to every
//! observer like any other event, and [`DbusService::spawn_event_forwarder`]
//! re-emits everything the observers see as the `Event` signal.

use std::path::PathBuf;
use std::sync::Arc;

use backupbox_core::domain::{Command, Event};
use backupbox_sync::runner::SyncRunner;
use backupbox_sync::service::BackgroundService;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zbus::SignalContext;

use crate::{DBUS_NAME, DBUS_PATH};

// ============================================================================
// Scheduler interface
// ============================================================================

/// D-Bus interface for the background scheduler
pub struct SchedulerInterface {
    service: Arc<BackgroundService>,
    sync_requests: mpsc::UnboundedSender<()>,
    runner: Option<Arc<SyncRunner>>,
}

impl SchedulerInterface {
    pub fn new(
        service: Arc<BackgroundService>,
        sync_requests: mpsc::UnboundedSender<()>,
        runner: Option<Arc<SyncRunner>>,
    ) -> Self {
        Self {
            service,
            sync_requests,
            runner,
        }
    }

    async fn dispatch(&self, command: Command) {
        if let Some(reply) = self.service.handle(command).await {
            self.service.observers().broadcast(reply);
        }
    }
}

#[zbus::interface(name = "org.backupbox.Daemon.Scheduler")]
impl SchedulerInterface {
    /// Arms the backup timer; a pending timer is replaced
    async fn schedule_next_backup(&self, delay_ms: u64) {
        debug!(delay_ms, "ScheduleNextBackup called");
        self.dispatch(Command::ScheduleNextBackup { delay_ms }).await;
    }

    /// Disarms the backup timer
    async fn stop_backup(&self) {
        debug!("StopBackup called");
        self.dispatch(Command::StopBackup).await;
    }

    /// Starts the watch loop. An empty list keeps the previous folders.
    async fn start_watch(&self, dirs: Vec<String>) {
        debug!(dirs = dirs.len(), "StartWatch called");
        let dir_handles = if dirs.is_empty() {
            None
        } else {
            Some(to_paths(dirs))
        };
        self.dispatch(Command::StartWatch { dir_handles }).await;
    }

    async fn stop_watch(&self) {
        debug!("StopWatch called");
        self.dispatch(Command::StopWatch).await;
    }

    /// Counts the files below `dirs`; the total arrives as a `done` event
    async fn count(&self, dirs: Vec<String>) {
        debug!(dirs = dirs.len(), "Count called");
        self.dispatch(Command::Count {
            dir_handles: to_paths(dirs),
        })
        .await;
    }

    /// Requests an immediate synchronization run
    async fn sync_now(&self) -> zbus::fdo::Result<()> {
        info!("SyncNow called, requesting run");
        self.sync_requests
            .send(())
            .map_err(|_| zbus::fdo::Error::Failed("The sync runner is not available".into()))
    }

    /// Returns the daemon status as a JSON string
    ///
    /// - `scheduler`: `idle`, `armed` or `running`
    /// - `watching`, `watchedDirs`: watch loop state
    /// - `syncing`, `lastResult`: runner state, when a runner is attached
    async fn get_status(&self) -> String {
        let status = self.service.status();
        let (syncing, last_result) = match &self.runner {
            Some(runner) => (runner.is_running(), runner.last_result()),
            None => (false, None),
        };
        serde_json::json!({
            "scheduler": status.scheduler,
            "watching": status.watching,
            "watchedDirs": status.watched_dirs,
            "syncing": syncing,
            "lastResult": last_result,
        })
        .to_string()
    }

    /// Emitted for every event of the background protocol
    #[zbus(signal)]
    async fn event(signal_ctxt: &SignalContext<'_>, json: &str) -> zbus::Result<()>;
}

fn to_paths(dirs: Vec<String>) -> Vec<PathBuf> {
    dirs.into_iter().map(PathBuf::from).collect()
}

// ============================================================================
// DbusService - connection owner
// ============================================================================

/// Exports the scheduler interface on the session bus
pub struct DbusService {
    service: Arc<BackgroundService>,
    sync_requests: mpsc::UnboundedSender<()>,
    runner: Option<Arc<SyncRunner>>,
}

impl DbusService {
    pub fn new(service: Arc<BackgroundService>, sync_requests: mpsc::UnboundedSender<()>) -> Self {
        Self {
            service,
            sync_requests,
            runner: None,
        }
    }

    /// Attaches the runner reported by `GetStatus`
    pub fn with_runner(mut self, runner: Arc<SyncRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Starts the D-Bus service on the session bus
    ///
    /// Returns the connection, which must be kept alive for the service to
    /// remain reachable.
    ///
    /// # Errors
    /// Returns an error if the session bus is not available or the
    /// well-known name is already owned.
    pub async fn start(&self) -> anyhow::Result<zbus::Connection> {
        info!("Starting D-Bus service on session bus");

        let interface = SchedulerInterface::new(
            Arc::clone(&self.service),
            self.sync_requests.clone(),
            self.runner.clone(),
        );

        let connection = zbus::connection::Builder::session()?
            .name(DBUS_NAME)?
            .serve_at(DBUS_PATH, interface)?
            .build()
            .await?;

        info!(name = DBUS_NAME, path = DBUS_PATH, "D-Bus service started");
        Ok(connection)
    }

    /// Re-emits every observer event as the `Event` signal
    ///
    /// The task ends when the observer registry is dropped.
    pub fn spawn_event_forwarder(
        &self,
        connection: &zbus::Connection,
    ) -> anyhow::Result<JoinHandle<()>> {
        let ctxt = SignalContext::new(connection, DBUS_PATH)?;
        let mut events = self.service.observers().subscribe();

        Ok(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                forward(&ctxt, &event).await;
            }
            debug!("Observer registry closed, event forwarding stopped");
        }))
    }

    /// Checks whether the well-known name is still free
    ///
    /// Used by the daemon as a single-instance check.
    pub async fn try_acquire_name() -> anyhow::Result<bool> {
        let connection = zbus::Connection::session().await?;
        let dbus_proxy = zbus::fdo::DBusProxy::new(&connection).await?;

        match dbus_proxy.get_name_owner(DBUS_NAME.try_into()?).await {
            Ok(_owner) => Ok(false),
            Err(_) => Ok(true),
        }
    }
}

async fn forward(ctxt: &SignalContext<'_>, event: &Event) {
    if let Err(err) = SchedulerInterface::event(ctxt, &event.to_json()).await {
        warn!(event = event.kind(), error = %err, "Failed to emit event signal");
    }
}

// ============================================================================
// Tests
// ============================================================================
