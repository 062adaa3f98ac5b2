//! Sync command - Back up the configured folders in the foreground
//!
//! Runs the same engine the daemon uses, printing progress as files are
//! uploaded. When the daemon is reachable it is asked afterwards to arm its
//! timer for the next run.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use backupbox_core::config::Config;
use backupbox_core::domain::{FolderSet, RemoteName};
use backupbox_ipc::client::DaemonClient;
use backupbox_remote::provider::RemoteStore;
use backupbox_sync::engine::{FolderSynchronizer, SyncOrchestrator};
use backupbox_sync::filesystem::LocalFileSystem;
use clap::Args;
use tracing::{debug, info};

use crate::output::{OutputFormat, Printer};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Only back up the folder with this remote name
    #[arg(long)]
    pub folder: Option<String>,

    /// Do not ask the daemon to schedule the next run
    #[arg(long)]
    pub no_schedule: bool,
}

impl SyncCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let out = Printer::new(format);
        let config = Config::load_or_default(config_path);
        info!(config_path = %config_path.display(), "Loaded configuration");

        let folders = match self.select_folders(&config.folders) {
            Ok(folders) => folders,
            Err(e) => {
                out.fail(&format!("{e:#}"));
                return Ok(());
            }
        };

        let store = RemoteStore::from_config(&config.remote).context("Invalid remote configuration")?;
        let orchestrator = SyncOrchestrator::new(
            Arc::new(LocalFileSystem::new()),
            FolderSynchronizer::new(Arc::new(store), &config.sync),
        );

        let progress = |done: u64, total: u64, path: &str| out.progress(done, total, path);

        let result = match orchestrator.sync_all(folders.as_slice(), &progress).await {
            Ok(result) => result,
            Err(e) => {
                out.fail(&e.to_string());
                return Ok(());
            }
        };
        out.sync_result(&result);

        if !self.no_schedule {
            let delay = Duration::from_secs(config.sync.schedule_interval_secs);
            match schedule_on_daemon(delay).await {
                Ok(()) => out.note(&format!(
                    "Next background backup in {} minute(s)",
                    delay.as_secs().div_ceil(60)
                )),
                Err(e) => debug!(error = %e, "Daemon not reachable, nothing scheduled"),
            }
        }
        Ok(())
    }

    fn select_folders(&self, configured: &FolderSet) -> Result<FolderSet> {
        let Some(name) = &self.folder else {
            return Ok(configured.clone());
        };
        let remote_name = RemoteName::new(name)?;
        let folder = configured
            .get(&remote_name)
            .with_context(|| format!("No folder named \"{remote_name}\""))?;
        let mut selected = FolderSet::new();
        selected.add(folder.clone())?;
        Ok(selected)
    }
}

async fn schedule_on_daemon(delay: Duration) -> Result<()> {
    let client = DaemonClient::connect().await?;
    client.schedule_next_backup(delay).await
}
