//! Directory walker
//!
//! Flattens a directory tree into [`FileRecord`]s, depth-first and pre-order
//! over directories. File order inside a directory is whatever the directory
//! enumeration yields.
//!
//! ## Failure handling
//!
//! Only the root directory can fail a walk. Below the root, a directory that
//! stays unreadable after one permission request, that fails to enumerate,
//! or that lies deeper than the configured depth bound contributes zero
//! records and the walk moves on to its siblings. A file whose attributes
//! cannot be read is skipped on its own.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use backupbox_core::domain::RelativePath;
use backupbox_core::ports::{EntryKind, IDirectory, IFileHandle};
use tracing::{debug, warn};

use crate::SyncError;

/// One walked file, ready to be diffed and uploaded
#[derive(Clone)]
pub struct FileRecord {
    /// Path relative to the walked root, `/`-joined
    pub relative_path: RelativePath,
    pub size: u64,
    /// Modification time in epoch milliseconds
    pub mtime: i64,
    pub mime_type: String,
    /// Handle the content is read from at upload time
    pub content: Arc<dyn IFileHandle>,
}

impl std::fmt::Debug for FileRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRecord")
            .field("relative_path", &self.relative_path)
            .field("size", &self.size)
            .field("mtime", &self.mtime)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// Makes sure `dir` is readable, asking for access once if needed
///
/// Errors from the permission calls count as "not granted".
pub async fn ensure_readable(dir: &dyn IDirectory) -> bool {
    match dir.query_permission().await {
        Ok(permission) if permission.is_granted() => return true,
        Ok(permission) => debug!(dir = %dir.name(), ?permission, "Requesting read permission"),
        Err(err) => debug!(dir = %dir.name(), error = %err, "Permission query failed"),
    }

    match dir.request_permission().await {
        Ok(permission) => permission.is_granted(),
        Err(err) => {
            debug!(dir = %dir.name(), error = %err, "Permission request failed");
            false
        }
    }
}

type WalkFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Recursive directory walker with a depth bound
#[derive(Debug, Clone, Copy)]
pub struct DirectoryWalker {
    max_depth: usize,
}

impl DirectoryWalker {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Walk `root` and return every file below it
    ///
    /// # Errors
    /// - `SyncError::PermissionDenied` if the root stays unreadable
    /// - `SyncError::DirectoryUnreadable` if the root cannot be enumerated
    pub async fn walk(&self, root: &dyn IDirectory) -> Result<Vec<FileRecord>, SyncError> {
        if !ensure_readable(root).await {
            return Err(SyncError::PermissionDenied(root.name()));
        }
        self.walk_readable(root).await
    }

    /// Walk a root whose read access was already settled by the caller
    ///
    /// # Errors
    /// `SyncError::DirectoryUnreadable` if the root cannot be enumerated
    #[tracing::instrument(skip_all, fields(root = %root.name()))]
    pub async fn walk_readable(&self, root: &dyn IDirectory) -> Result<Vec<FileRecord>, SyncError> {
        let entries = root
            .entries()
            .await
            .map_err(|err| SyncError::DirectoryUnreadable {
                path: root.name(),
                message: format!("{err:#}"),
            })?;

        let mut records = Vec::new();
        for entry in entries {
            match entry.kind {
                EntryKind::File(handle) => {
                    if let Some(record) = materialize(None, &entry.name, handle).await {
                        records.push(record);
                    }
                }
                EntryKind::Directory(child) => {
                    let Some(prefix) = child_path(None, &entry.name) else {
                        continue;
                    };
                    self.walk_directory(child.as_ref(), prefix, 1, &mut records)
                        .await;
                }
            }
        }

        debug!(files = records.len(), "Walk complete");
        Ok(records)
    }

    /// Walks a subdirectory, appending its files to `records`
    fn walk_directory<'a>(
        &'a self,
        dir: &'a dyn IDirectory,
        prefix: RelativePath,
        depth: usize,
        records: &'a mut Vec<FileRecord>,
    ) -> WalkFuture<'a> {
        Box::pin(async move {
            if depth > self.max_depth {
                warn!(path = %prefix, depth, "Directory nesting too deep, skipping subtree");
                return;
            }

            if !ensure_readable(dir).await {
                let err = SyncError::PermissionDenied(prefix.to_string());
                warn!(error = %err, "Skipping unreadable subtree");
                return;
            }

            let entries = match dir.entries().await {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %prefix, error = %err, "Failed to enumerate directory, skipping");
                    return;
                }
            };

            for entry in entries {
                match entry.kind {
                    EntryKind::File(handle) => {
                        if let Some(record) = materialize(Some(&prefix), &entry.name, handle).await
                        {
                            records.push(record);
                        }
                    }
                    EntryKind::Directory(child) => {
                        let Some(child_prefix) = child_path(Some(&prefix), &entry.name) else {
                            continue;
                        };
                        self.walk_directory(child.as_ref(), child_prefix, depth + 1, records)
                            .await;
                    }
                }
            }
        })
    }
}

fn child_path(parent: Option<&RelativePath>, name: &str) -> Option<RelativePath> {
    match RelativePath::child_of(parent, name) {
        Ok(path) => Some(path),
        Err(err) => {
            warn!(name, error = %err, "Skipping entry with unusable name");
            None
        }
    }
}

async fn materialize(
    parent: Option<&RelativePath>,
    name: &str,
    handle: Arc<dyn IFileHandle>,
) -> Option<FileRecord> {
    let relative_path = child_path(parent, name)?;
    match handle.info().await {
        Ok(info) => Some(FileRecord {
            relative_path,
            size: info.size,
            mtime: info.mtime,
            mime_type: info.mime_type,
            content: handle,
        }),
        Err(err) => {
            warn!(path = %relative_path, error = %err, "Failed to read file attributes, skipping");
            None
        }
    }
}
