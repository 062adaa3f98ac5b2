//! File counting for the watch loop and the `count` command
//!
//! Counts regular files below a set of directories without reading any
//! file attributes. Unreadable subtrees, including unreadable roots, count
//! as empty.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use backupbox_core::ports::{EntryKind, IDirectory};
use tracing::{debug, warn};

use crate::walker::ensure_readable;

type CountFuture<'a> = Pin<Box<dyn Future<Output = u64> + Send + 'a>>;

#[derive(Debug, Clone, Copy)]
pub struct FileCounter {
    max_depth: usize,
}

impl FileCounter {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Total number of files below every directory in `dirs`
    pub async fn count_all(&self, dirs: &[Arc<dyn IDirectory>]) -> u64 {
        let mut total = 0;
        for dir in dirs {
            total += self.count(dir.as_ref()).await;
        }
        total
    }

    /// Number of files below `dir`
    pub fn count<'a>(&'a self, dir: &'a dyn IDirectory) -> CountFuture<'a> {
        self.count_at(dir, 0)
    }

    fn count_at<'a>(&'a self, dir: &'a dyn IDirectory, depth: usize) -> CountFuture<'a> {
        Box::pin(async move {
            if depth > self.max_depth {
                warn!(dir = %dir.name(), depth, "Directory nesting too deep, not counted");
                return 0;
            }
            if !ensure_readable(dir).await {
                debug!(dir = %dir.name(), "Directory not readable, not counted");
                return 0;
            }
            let entries = match dir.entries().await {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(dir = %dir.name(), error = %err, "Failed to enumerate directory");
                    return 0;
                }
            };

            let mut count = 0;
            for entry in entries {
                match entry.kind {
                    EntryKind::File(_) => count += 1,
                    EntryKind::Directory(child) => {
                        count += self.count_at(child.as_ref(), depth + 1).await;
                    }
                }
            }
            count
        })
    }
}
