//! Remote metadata document
//!
//! One [`RemoteMetadata`] document is stored next to the files of every
//! backed-up folder (`metadata.json`). It records the size and modification
//! time each file had when it was last uploaded, and is the only input the
//! diff step compares local files against.
//!
//! ## Invariant
//!
//! After [`RemoteMetadata::finalize`] (called right before every save),
//! `total_files == files.len()` and `total_bytes == sum(files[*].size)`.
//! Totals are always recomputed from `files`, never adjusted incrementally.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// State of one file as of its last successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    /// Size in bytes
    pub size: u64,
    /// Local modification time in epoch milliseconds
    pub mtime: i64,
    /// MIME type the file was uploaded with
    #[serde(rename = "type", default)]
    pub mime_type: String,
    /// Upload completion time in epoch milliseconds
    #[serde(default)]
    pub uploaded_at: i64,
}

/// Last known remote state of one backed-up folder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMetadata {
    /// Uploaded files keyed by relative path
    #[serde(default)]
    pub files: BTreeMap<String, FileMeta>,
    /// Completion time of the last run, epoch milliseconds
    #[serde(default)]
    pub last_backup: Option<i64>,
    #[serde(default)]
    pub total_files: u64,
    #[serde(default)]
    pub total_bytes: u64,
}

impl RemoteMetadata {
    /// Document used when a folder has never been backed up
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&FileMeta> {
        self.files.get(path)
    }

    /// Records a successful upload, replacing any previous entry for `path`
    pub fn record_upload(&mut self, path: impl Into<String>, meta: FileMeta) {
        self.files.insert(path.into(), meta);
    }

    /// Recomputes `total_files` and `total_bytes` from `files`
    pub fn recompute_totals(&mut self) {
        self.total_files = self.files.len() as u64;
        self.total_bytes = self.files.values().map(|f| f.size).sum();
    }

    /// Stamps the run completion time and recomputes totals
    pub fn finalize(&mut self, now_millis: i64) {
        self.last_backup = Some(now_millis);
        self.recompute_totals();
    }

    /// Whether the stored totals agree with `files`
    pub fn is_consistent(&self) -> bool {
        self.total_files == self.files.len() as u64
            && self.total_bytes == self.files.values().map(|f| f.size).sum::<u64>()
    }
}
