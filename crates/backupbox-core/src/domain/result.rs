//! Synchronization summaries

use serde::{Deserialize, Serialize};

/// Summary of a synchronization run for one folder or for all folders
///
/// `uploaded`, `skipped`, `failed` and `uploaded_bytes` describe this run
/// only. `total_files` and `total_bytes` describe the cumulative remote
/// state as recorded in the saved metadata document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    /// Files transferred successfully in this run
    pub uploaded: u64,
    /// Walked files that were not selected for upload
    pub skipped: u64,
    /// Failed transfers (or, when aggregating, failed folders)
    pub failed: u64,
    /// Bytes recorded in the remote metadata after the run
    pub total_bytes: u64,
    /// Files recorded in the remote metadata after the run
    pub total_files: u64,
    /// Bytes transferred in this run
    #[serde(default)]
    pub uploaded_bytes: u64,
}

impl SyncResult {
    /// Adds a folder's result into an aggregate
    ///
    /// Every counter is summed, so the aggregate totals are grand totals
    /// across all folders that completed.
    pub fn accumulate(&mut self, folder: &SyncResult) {
        self.uploaded += folder.uploaded;
        self.skipped += folder.skipped;
        self.failed += folder.failed;
        self.total_bytes += folder.total_bytes;
        self.total_files += folder.total_files;
        self.uploaded_bytes += folder.uploaded_bytes;
    }

    /// Counts a whole folder that could not be synchronized as one failure
    pub fn record_folder_failure(&mut self) {
        self.failed += 1;
    }

    /// True when nothing was uploaded and nothing failed
    pub fn is_up_to_date(&self) -> bool {
        self.uploaded == 0 && self.failed == 0
    }
}
