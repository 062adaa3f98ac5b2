//! Diff engine
//!
//! Decides which walked files must be uploaded by comparing them with the
//! remote metadata document. Change detection is by modification time only:
//! a file is uploaded when it is new, or when its local mtime is strictly
//! newer than the one recorded at its last upload. Files above the size
//! ceiling are never uploaded.

use backupbox_core::domain::{FileMeta, RemoteMetadata};
use tracing::debug;

use crate::walker::FileRecord;

/// Whether a single file needs uploading
pub fn needs_upload(size: u64, mtime: i64, existing: Option<&FileMeta>, max_file_size: u64) -> bool {
    if size > max_file_size {
        return false;
    }
    match existing {
        None => true,
        Some(stored) => mtime > stored.mtime,
    }
}

/// Keep the records that need uploading, in walk order
pub fn filter_needing_upload(
    records: Vec<FileRecord>,
    metadata: &RemoteMetadata,
    max_file_size: u64,
) -> Vec<FileRecord> {
    records
        .into_iter()
        .filter(|record| {
            let existing = metadata.get(record.relative_path.as_str());
            let selected = needs_upload(record.size, record.mtime, existing, max_file_size);
            if !selected && record.size > max_file_size {
                debug!(
                    path = %record.relative_path,
                    size = record.size,
                    max_file_size,
                    "File exceeds size limit, skipping"
                );
            }
            selected
        })
        .collect()
}
