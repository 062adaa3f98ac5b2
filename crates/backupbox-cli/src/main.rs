//! BackupBox CLI - Command-line interface for BackupBox
//!
//! Provides commands for:
//! - Running a backup in the foreground
//! - Managing the list of backed-up folders
//! - Counting files
//! - Controlling the background daemon
//! - Viewing and validating configuration

use std::path::PathBuf;

use anyhow::Result;
use backupbox_core::config::Config;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    config::ConfigCommand, count::CountCommand, daemon::DaemonCommand,
    folders::FoldersCommand, sync::SyncCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "backupbox", version, about = "Incremental folder backup to a remote store")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Back up every configured folder now
    Sync(SyncCommand),
    /// Manage the folders selected for backup
    #[command(subcommand)]
    Folders(FoldersCommand),
    /// Count the files below some directories
    Count(CountCommand),
    /// Control the BackupBox background daemon
    #[command(subcommand)]
    Daemon(DaemonCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let config_path = cli.config.unwrap_or_else(Config::default_path);

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(format, &config_path).await,
        Commands::Folders(cmd) => cmd.execute(format, &config_path).await,
        Commands::Count(cmd) => cmd.execute(format, &config_path).await,
        Commands::Daemon(cmd) => cmd.execute(format, &config_path).await,
        Commands::Config(cmd) => cmd.execute(format, &config_path).await,
    }
}
