//! Client side of the daemon interface
//!
//! [`DaemonClient`] wraps the generated proxy with typed arguments and
//! decodes the `Event` signal back into [`Event`] values.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use backupbox_core::domain::Event;
use futures_util::{Stream, StreamExt};
use tracing::warn;

use proxy::SchedulerProxy;

/// Proxy generated from the interface definition. Kept in its own module
/// since the generated signal type is also named `Event`.
mod proxy {
    #[zbus::proxy(
        interface = "org.backupbox.Daemon.Scheduler",
        default_service = "org.backupbox.Daemon",
        default_path = "/org/backupbox/Daemon"
    )]
    pub trait Scheduler {
        fn schedule_next_backup(&self, delay_ms: u64) -> zbus::Result<()>;

        fn stop_backup(&self) -> zbus::Result<()>;

        fn start_watch(&self, dirs: &[&str]) -> zbus::Result<()>;

        fn stop_watch(&self) -> zbus::Result<()>;

        fn count(&self, dirs: &[&str]) -> zbus::Result<()>;

        fn sync_now(&self) -> zbus::Result<()>;

        fn get_status(&self) -> zbus::Result<String>;

        #[zbus(signal)]
        fn event(&self, json: String) -> zbus::Result<()>;
    }
}

/// Connection to a running daemon
pub struct DaemonClient {
    proxy: SchedulerProxy<'static>,
}

impl DaemonClient {
    /// Connects to the daemon on the session bus
    ///
    /// # Errors
    /// Returns an error if the session bus is not available.
    pub async fn connect() -> anyhow::Result<Self> {
        let connection = zbus::Connection::session()
            .await
            .context("Failed to connect to the session bus")?;
        let proxy = SchedulerProxy::new(&connection).await?;
        Ok(Self { proxy })
    }

    pub async fn schedule_next_backup(&self, delay: Duration) -> anyhow::Result<()> {
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.proxy
            .schedule_next_backup(delay_ms)
            .await
            .context("ScheduleNextBackup failed")
    }

    pub async fn stop_backup(&self) -> anyhow::Result<()> {
        self.proxy.stop_backup().await.context("StopBackup failed")
    }

    /// Starts the watch loop; an empty list reuses the previous folders
    pub async fn start_watch(&self, dirs: &[PathBuf]) -> anyhow::Result<()> {
        let dirs = path_strings(dirs);
        let dirs: Vec<&str> = dirs.iter().map(String::as_str).collect();
        self.proxy.start_watch(&dirs).await.context("StartWatch failed")
    }

    pub async fn stop_watch(&self) -> anyhow::Result<()> {
        self.proxy.stop_watch().await.context("StopWatch failed")
    }

    pub async fn count(&self, dirs: &[PathBuf]) -> anyhow::Result<()> {
        let dirs = path_strings(dirs);
        let dirs: Vec<&str> = dirs.iter().map(String::as_str).collect();
        self.proxy.count(&dirs).await.context("Count failed")
    }

    pub async fn sync_now(&self) -> anyhow::Result<()> {
        self.proxy.sync_now().await.context("SyncNow failed")
    }

    pub async fn status(&self) -> anyhow::Result<serde_json::Value> {
        let raw = self.proxy.get_status().await.context("GetStatus failed")?;
        serde_json::from_str(&raw).context("Daemon returned an invalid status")
    }

    /// Stream of every event the daemon broadcasts from now on
    ///
    /// Signals that do not decode are logged and skipped.
    pub async fn events(&self) -> anyhow::Result<impl Stream<Item = Event>> {
        let signals = self.proxy.receive_event().await?;
        Ok(signals.filter_map(|signal| async move {
            let args = match signal.args() {
                Ok(args) => args,
                Err(err) => {
                    warn!(error = %err, "Malformed event signal");
                    return None;
                }
            };
            match Event::from_json(args.json()) {
                Ok(event) => Some(event),
                Err(err) => {
                    warn!(error = %err, "Undecodable event payload");
                    None
                }
            }
        }))
    }
}

fn path_strings(dirs: &[PathBuf]) -> Vec<String> {
    dirs.iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
}
