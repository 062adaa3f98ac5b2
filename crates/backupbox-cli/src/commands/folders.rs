//! Folders command - Manage the folders selected for backup
//!
//! The folder list lives in the `folders` section of the configuration file
//! and is rewritten after every change. The daemon re-reads it before each
//! run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use backupbox_core::config::Config;
use backupbox_core::domain::{FolderConfig, RemoteName};
use clap::Subcommand;
use tracing::info;

use crate::output::{OutputFormat, Printer};

#[derive(Debug, Subcommand)]
pub enum FoldersCommand {
    /// Add a local folder to the backup list
    Add {
        /// Local directory to back up
        path: PathBuf,
        /// Remote folder name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove a folder from the backup list
    Remove {
        /// Remote folder name
        name: String,
    },
    /// List the folders selected for backup
    List,
}

impl FoldersCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        match self {
            FoldersCommand::Add { path, name } => {
                execute_add(path, name.as_deref(), format, config_path)
            }
            FoldersCommand::Remove { name } => execute_remove(name, format, config_path),
            FoldersCommand::List => execute_list(format, config_path),
        }
    }
}

fn execute_add(
    path: &Path,
    name: Option<&str>,
    format: OutputFormat,
    config_path: &Path,
) -> Result<()> {
    let out = Printer::new(format);
    let mut config = Config::load_or_default(config_path);

    let folder = match add_folder(&mut config, path, name) {
        Ok(folder) => folder,
        Err(e) => {
            out.fail(&format!("{e:#}"));
            return Ok(());
        }
    };
    config.save(config_path)?;
    info!(path = %folder.local_path.display(), remote = %folder.remote_name, "Folder added");

    if out.is_json() {
        out.value(&serde_json::json!({
            "success": true,
            "folder": folder,
            "config_path": config_path.display().to_string(),
        }));
    } else {
        out.done(&format!(
            "Added {} as \"{}\"",
            folder.local_path.display(),
            folder.remote_name
        ));
    }
    Ok(())
}

fn execute_remove(name: &str, format: OutputFormat, config_path: &Path) -> Result<()> {
    let out = Printer::new(format);
    let mut config = Config::load_or_default(config_path);

    let removed = RemoteName::new(name)
        .map_err(anyhow::Error::from)
        .and_then(|remote_name| config.folders.remove(&remote_name).map_err(Into::into));
    let folder = match removed {
        Ok(folder) => folder,
        Err(e) => {
            out.fail(&e.to_string());
            return Ok(());
        }
    };
    config.save(config_path)?;
    info!(remote = %folder.remote_name, "Folder removed");

    if out.is_json() {
        out.value(&serde_json::json!({
            "success": true,
            "removed": folder,
        }));
    } else {
        out.done(&format!(
            "Removed \"{}\" ({})",
            folder.remote_name,
            folder.local_path.display()
        ));
        out.note("Files already uploaded are kept on the remote store.");
    }
    Ok(())
}

fn execute_list(format: OutputFormat, config_path: &Path) -> Result<()> {
    let out = Printer::new(format);
    let config = Config::load_or_default(config_path);

    if out.is_json() {
        out.value(&serde_json::json!({ "folders": config.folders }));
        return Ok(());
    }

    if config.folders.is_empty() {
        out.note("No folders selected. Add one with 'backupbox folders add <path>'.");
        return Ok(());
    }

    out.done(&format!("{} folder(s)", config.folders.len()));
    for folder in &config.folders {
        let marker = if folder.local_path.is_dir() { " " } else { "!" };
        out.note(&format!(
            "{marker} {:<24} {}",
            folder.remote_name,
            folder.local_path.display()
        ));
    }
    Ok(())
}

/// Adds `path` to the folder list of `config`
///
/// The path is made absolute and must be an existing directory. The remote
/// name defaults to the last component of the path.
fn add_folder(config: &mut Config, path: &Path, name: Option<&str>) -> Result<FolderConfig> {
    let local_path = std::fs::canonicalize(path)
        .with_context(|| format!("Cannot access {}", path.display()))?;
    if !local_path.is_dir() {
        anyhow::bail!("{} is not a directory", local_path.display());
    }

    let name = match name {
        Some(name) => name.to_string(),
        None => local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("Cannot derive a folder name from the root directory, use --name")?,
    };
    let folder = FolderConfig::new(local_path, RemoteName::new(name)?);
    config.folders.add(folder.clone())?;
    Ok(folder)
}
