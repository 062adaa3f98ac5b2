//! BackupBox Daemon - Background backup service
//!
//! This binary runs as a user service and handles:
//! - Timed backup runs through the shared scheduler
//! - D-Bus interface for the CLI and other clients
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon builds one background service (scheduler, observer registry,
//! watch loop) and one sync runner, exports them over D-Bus, then waits for
//! `triggerBackup` events and `SyncNow` requests. Every completed run re-arms
//! the scheduler. The loop is controlled by a `CancellationToken` that is
//! triggered on receipt of SIGTERM or SIGINT.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use backupbox_core::config::Config;
use backupbox_core::domain::Event;
use backupbox_ipc::service::DbusService;
use backupbox_ipc::DBUS_NAME;
use backupbox_remote::provider::RemoteStore;
use backupbox_sync::engine::{FolderSynchronizer, SyncOrchestrator};
use backupbox_sync::filesystem::LocalFileSystem;
use backupbox_sync::observers::ObserverRegistry;
use backupbox_sync::runner::SyncRunner;
use backupbox_sync::scheduler::BackupScheduler;
use backupbox_sync::service::BackgroundService;
use backupbox_sync::SyncError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Daemon
// ============================================================================

/// Why the runner loop starts a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunTrigger {
    Startup,
    Timer,
    Request,
}

struct Daemon {
    config_path: PathBuf,
    config: Config,
    shutdown: CancellationToken,
}

impl Daemon {
    fn new(config_path: PathBuf, config: Config, shutdown: CancellationToken) -> Self {
        Self {
            config_path,
            config,
            shutdown,
        }
    }

    /// Builds the services, exports them over D-Bus and runs until shutdown
    async fn run(&self) -> Result<()> {
        for issue in self.config.validate() {
            warn!(%issue, "Configuration problem");
        }

        if !DbusService::try_acquire_name().await.unwrap_or(true) {
            anyhow::bail!(
                "Another instance of backupboxd is already running (D-Bus name {DBUS_NAME} is taken)"
            );
        }

        let store = RemoteStore::from_config(&self.config.remote)
            .context("Invalid remote configuration")?;
        info!(
            base_url = %store.client().base_url(),
            app_id = store.client().app_id(),
            "Remote store configured"
        );

        let source = Arc::new(LocalFileSystem::new());
        let observers = Arc::new(ObserverRegistry::new());
        let scheduler = Arc::new(BackupScheduler::new(Arc::clone(&observers)));
        let service = Arc::new(BackgroundService::new(
            Arc::clone(&scheduler),
            source.clone(),
            &self.config.sync,
        ));
        let orchestrator = SyncOrchestrator::new(
            source,
            FolderSynchronizer::new(Arc::new(store), &self.config.sync),
        );
        let runner = Arc::new(SyncRunner::new(
            orchestrator,
            Arc::clone(&scheduler),
            &self.config.sync,
        ));

        let (sync_tx, sync_rx) = mpsc::unbounded_channel();
        let events = observers.subscribe();

        let dbus = DbusService::new(Arc::clone(&service), sync_tx).with_runner(Arc::clone(&runner));
        let connection = match dbus.start().await {
            Ok(connection) => connection,
            Err(e) if is_name_taken(&e) => {
                error!(name = DBUS_NAME, "Another instance of backupboxd is already running");
                anyhow::bail!("Another instance of backupboxd is already running");
            }
            Err(e) => return Err(e).context("Failed to start D-Bus service"),
        };
        let forwarder = dbus.spawn_event_forwarder(&connection)?;

        let result = self.runner_loop(&runner, &scheduler, events, sync_rx).await;

        scheduler.cancel();
        forwarder.abort();
        result
    }

    /// Waits for triggers and runs one synchronization per trigger
    async fn runner_loop(
        &self,
        runner: &SyncRunner,
        scheduler: &BackupScheduler,
        mut events: mpsc::UnboundedReceiver<Event>,
        mut sync_requests: mpsc::UnboundedReceiver<()>,
    ) -> Result<()> {
        let interval = Duration::from_secs(self.config.sync.schedule_interval_secs);
        if self.config.sync.run_on_start {
            self.run_once(runner, RunTrigger::Startup).await;
        } else {
            info!(next_in_secs = interval.as_secs(), "Waiting for the first scheduled run");
            scheduler.schedule_next(interval);
        }

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown signal received");
                    break;
                }
                Some(event) = events.recv() => {
                    if event == Event::TriggerBackup {
                        self.run_once(runner, RunTrigger::Timer).await;
                    }
                }
                Some(()) = sync_requests.recv() => {
                    self.run_once(runner, RunTrigger::Request).await;
                }
                else => break,
            }
        }

        info!("Runner loop terminated");
        Ok(())
    }

    /// Runs one synchronization over the folders currently configured
    ///
    /// The folder list is re-read on every run so `backupbox folders add`
    /// takes effect without a restart.
    async fn run_once(&self, runner: &SyncRunner, trigger: RunTrigger) {
        let folders = match Config::load(&self.config_path) {
            Ok(config) => config.folders,
            Err(e) => {
                debug!(error = %e, "Config not readable, using the folders loaded at startup");
                self.config.folders.clone()
            }
        };

        info!(?trigger, folders = folders.len(), "Starting backup run");
        match runner.run(folders.as_slice()).await {
            Ok(result) => info!(
                uploaded = result.uploaded,
                skipped = result.skipped,
                failed = result.failed,
                total_files = result.total_files,
                total_bytes = result.total_bytes,
                "Backup run completed"
            ),
            Err(SyncError::AlreadyRunning) => debug!("Backup run already in progress"),
            Err(e) => error!(error = %e, "Backup run failed"),
        }
    }
}

/// Whether `err` reports that the well-known name is owned by someone else
fn is_name_taken(err: &anyhow::Error) -> bool {
    let message = format!("{err:#}");
    ["already taken", "already owned", "NameTaken", "name already", "Exists"]
        .iter()
        .any(|needle| message.contains(needle))
}

/// Log filter from `RUST_LOG`, falling back to the configured level
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = Config::default_path();
    let config = Config::load_or_default(&config_path);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&config.logging.level))
        .with_target(true)
        .init();

    info!(
        config_path = %config_path.display(),
        folders = config.folders.len(),
        "BackupBox daemon starting (backupboxd)"
    );

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let daemon = Daemon::new(config_path, config, shutdown_token);
    let result = daemon.run().await;

    match &result {
        Ok(()) => info!("BackupBox daemon shut down gracefully"),
        Err(e) => error!(error = %e, "BackupBox daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
