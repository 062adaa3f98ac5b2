//! Daemon commands - Talk to the running daemon over D-Bus
//!
//! # Subcommands
//!
//! - `schedule`    - Arm the backup timer
//! - `stop`        - Disarm the backup timer
//! - `sync-now`    - Run a backup in the daemon right away
//! - `start-watch` - Start the periodic file count
//! - `stop-watch`  - Stop the periodic file count
//! - `watch`       - Print daemon events as they arrive
//! - `status`      - Show daemon status

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use backupbox_core::config::Config;
use backupbox_core::domain::{Event, EventResult};
use backupbox_ipc::client::DaemonClient;
use clap::Subcommand;
use futures_util::StreamExt;

use crate::output::{backed_up, OutputFormat, Printer};

#[derive(Debug, Subcommand)]
pub enum DaemonCommand {
    /// Arm the backup timer (replaces a pending one)
    Schedule {
        /// Delay in seconds (defaults to the configured schedule interval)
        #[arg(long)]
        delay: Option<u64>,
    },
    /// Disarm the backup timer
    Stop,
    /// Run a backup in the daemon right away
    SyncNow,
    /// Start counting files periodically
    StartWatch {
        /// Directories to watch (defaults to the configured folders)
        dirs: Vec<PathBuf>,
    },
    /// Stop the periodic file count
    StopWatch,
    /// Print daemon events as they arrive
    Watch {
        /// Exit after this many events
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show daemon status
    Status,
}

impl DaemonCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let out = Printer::new(format);
        let client = match DaemonClient::connect().await {
            Ok(client) => client,
            Err(e) => {
                out.fail(&format!("{e:#}"));
                out.note("Is backupboxd running?");
                return Ok(());
            }
        };

        let outcome = match self {
            DaemonCommand::Schedule { delay } => {
                let delay = match delay {
                    Some(secs) => Duration::from_secs(*secs),
                    None => Duration::from_secs(
                        Config::load_or_default(config_path).sync.schedule_interval_secs,
                    ),
                };
                client
                    .schedule_next_backup(delay)
                    .await
                    .map(|()| format!("Next backup in {} second(s)", delay.as_secs()))
            }
            DaemonCommand::Stop => client
                .stop_backup()
                .await
                .map(|()| "Backup timer stopped".to_string()),
            DaemonCommand::SyncNow => client
                .sync_now()
                .await
                .map(|()| "Backup requested".to_string()),
            DaemonCommand::StartWatch { dirs } => {
                let dirs = if dirs.is_empty() {
                    Config::load_or_default(config_path)
                        .folders
                        .iter()
                        .map(|f| f.local_path.clone())
                        .collect()
                } else {
                    dirs.clone()
                };
                client
                    .start_watch(&dirs)
                    .await
                    .map(|()| format!("Watching {} director(ies)", dirs.len()))
            }
            DaemonCommand::StopWatch => client
                .stop_watch()
                .await
                .map(|()| "Watch stopped".to_string()),
            DaemonCommand::Watch { limit } => return watch(&client, format, *limit).await,
            DaemonCommand::Status => return status(&client, format).await,
        };

        match outcome {
            Ok(message) => out.done(&message),
            Err(e) => out.fail(&format!("{e:#}")),
        }
        Ok(())
    }
}

async fn status(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let out = Printer::new(format);
    let status = client.status().await?;

    if out.is_json() {
        out.value(&status);
        return Ok(());
    }

    out.done("Daemon is running");
    out.note(&format!(
        "Scheduler: {}",
        status["scheduler"].as_str().unwrap_or("unknown")
    ));
    out.note(&format!(
        "Syncing:   {}",
        if status["syncing"].as_bool().unwrap_or(false) { "yes" } else { "no" }
    ));
    out.note(&format!(
        "Watching:  {} ({} director(ies))",
        if status["watching"].as_bool().unwrap_or(false) { "yes" } else { "no" },
        status["watchedDirs"].as_u64().unwrap_or(0)
    ));
    if let Some(last) = status.get("lastResult").filter(|v| !v.is_null()) {
        out.note(&format!(
            "Last run:  {} uploaded, {} skipped, {} failed",
            last["uploaded"], last["skipped"], last["failed"]
        ));
    }
    Ok(())
}

async fn watch(client: &DaemonClient, format: OutputFormat, limit: Option<usize>) -> Result<()> {
    let out = Printer::new(format);
    let events = client.events().await?;
    futures_util::pin_mut!(events);
    out.note("Listening for daemon events (Ctrl+C to stop)");

    let mut seen = 0;
    loop {
        if limit.is_some_and(|limit| seen >= limit) {
            break;
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.next() => {
                let Some(event) = event else { break };
                seen += 1;
                if out.is_json() {
                    let value = serde_json::to_value(&event).context("Failed to encode event")?;
                    println!("{value}");
                } else {
                    println!("{}", describe_event(&event));
                }
            }
        }
    }
    Ok(())
}

/// One-line human description of a daemon event
fn describe_event(event: &Event) -> String {
    match event {
        Event::TriggerBackup => "Backup timer fired".to_string(),
        Event::Started => "Backup started".to_string(),
        Event::Stopped => "Stopped".to_string(),
        Event::Progress {
            done,
            total,
            current_file,
        } => format!("[{}/{}] {}", done + 1, total, current_file),
        Event::Done {
            result: EventResult::Sync(result),
        } => format!(
            "Backup finished: {} uploaded, {} skipped, {} failed; backed up {}",
            result.uploaded,
            result.skipped,
            result.failed,
            backed_up(result)
        ),
        Event::Done {
            result: EventResult::Count { count },
        } => format!("{count} file(s) in watched folders"),
        Event::Error { message } => format!("Error: {message}"),
        Event::WatchStarted => "Watch started".to_string(),
        Event::WatchStopped => "Watch stopped".to_string(),
    }
}
