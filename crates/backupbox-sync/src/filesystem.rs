//! Local filesystem adapter (secondary/driven adapter)
//!
//! Implements [`IDirectory`], [`IFileHandle`] and [`IDirectorySource`] using
//! `tokio::fs` for async file operations.
//!
//! ## Design Decisions
//!
//! - **Permissions**: a local directory is readable when it can be opened for
//!   listing. There is nobody to prompt, so a permission request simply
//!   checks again.
//! - **Symlinks** are not followed; they never show up as entries.
//! - **MIME types** are guessed from the file extension, falling back to
//!   `application/octet-stream`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use backupbox_core::ports::{
    DirEntry, EntryKind, FileInfo, IDirectory, IDirectorySource, IFileHandle, Permission,
};
use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

// ============================================================================
// LocalFileSystem
// ============================================================================

/// Opens configured folders on the local filesystem
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl IDirectorySource for LocalFileSystem {
    fn open(&self, path: &Path) -> Arc<dyn IDirectory> {
        Arc::new(LocalDirectory::new(path))
    }
}

// ============================================================================
// LocalDirectory
// ============================================================================

/// A directory on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    path: PathBuf,
}

impl LocalDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn check_readable(&self) -> anyhow::Result<Permission> {
        match tokio::fs::read_dir(&self.path).await {
            Ok(_) => Ok(Permission::Granted),
            Err(err) if matches!(err.kind(), ErrorKind::PermissionDenied | ErrorKind::NotFound) => {
                debug!(path = %self.path.display(), error = %err, "Directory not readable");
                Ok(Permission::Denied)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait::async_trait]
impl IDirectory for LocalDirectory {
    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    async fn query_permission(&self) -> anyhow::Result<Permission> {
        self.check_readable().await
    }

    async fn request_permission(&self) -> anyhow::Result<Permission> {
        self.check_readable().await
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn entries(&self) -> anyhow::Result<Vec<DirEntry>> {
        let mut reader = tokio::fs::read_dir(&self.path).await?;
        let mut entries = Vec::new();

        while let Some(entry) = reader.next_entry().await? {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!(name = ?raw, "Skipping entry with non UTF-8 name");
                    continue;
                }
            };

            let file_type = match entry.file_type().await {
                Ok(file_type) => file_type,
                Err(err) => {
                    warn!(name, error = %err, "Failed to read entry type, skipping");
                    continue;
                }
            };

            let kind = if file_type.is_file() {
                EntryKind::File(Arc::new(LocalFile::new(entry.path())))
            } else if file_type.is_dir() {
                EntryKind::Directory(Arc::new(LocalDirectory::new(entry.path())))
            } else {
                debug!(name, "Skipping special file or symlink");
                continue;
            };
            entries.push(DirEntry { name, kind });
        }

        Ok(entries)
    }
}

// ============================================================================
// LocalFile
// ============================================================================

/// A regular file on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl IFileHandle for LocalFile {
    async fn info(&self) -> anyhow::Result<FileInfo> {
        let metadata = tokio::fs::metadata(&self.path).await?;
        let modified: DateTime<Utc> = metadata.modified()?.into();
        Ok(FileInfo {
            size: metadata.len(),
            mtime: modified.timestamp_millis(),
            mime_type: guess_mime_type(&self.path),
        })
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn read(&self) -> anyhow::Result<Vec<u8>> {
        let data = tokio::fs::read(&self.path).await?;
        debug!(bytes = data.len(), "file read complete");
        Ok(data)
    }
}

/// MIME type of a file, guessed from its extension
pub fn guess_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

// ============================================================================
// Unit tests
// ============================================================================
