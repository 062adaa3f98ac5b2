//! Count command - Count the files below some directories
//!
//! Counts locally without the daemon. Without arguments the configured
//! folders are counted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use backupbox_core::config::Config;
use backupbox_core::ports::{IDirectory, IDirectorySource};
use backupbox_sync::counter::FileCounter;
use backupbox_sync::filesystem::LocalFileSystem;
use clap::Args;

use crate::output::{OutputFormat, Printer};

#[derive(Debug, Args)]
pub struct CountCommand {
    /// Directories to count (defaults to the configured folders)
    pub dirs: Vec<PathBuf>,
}

impl CountCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let out = Printer::new(format);
        let config = Config::load_or_default(config_path);

        let dirs = if self.dirs.is_empty() {
            config
                .folders
                .iter()
                .map(|f| f.local_path.clone())
                .collect()
        } else {
            self.dirs.clone()
        };
        if dirs.is_empty() {
            out.fail("No directories to count");
            return Ok(());
        }

        let count = count_files(&dirs, config.sync.max_depth).await;

        out.count(count, dirs.len());
        Ok(())
    }
}

async fn count_files(dirs: &[PathBuf], max_depth: usize) -> u64 {
    let source = LocalFileSystem::new();
    let dirs: Vec<Arc<dyn IDirectory>> = dirs.iter().map(|d| source.open(d)).collect();
    FileCounter::new(max_depth).count_all(&dirs).await
}
