//! Upload pipeline
//!
//! Transfers a batch of files strictly one at a time, pausing between two
//! consecutive transfers. Each successful transfer is recorded in the
//! working metadata document right away; a failed transfer is counted and
//! the batch carries on with the next file.

use std::sync::Arc;
use std::time::Duration;

use backupbox_core::domain::{FileMeta, RemoteMetadata, RemoteName};
use backupbox_core::ports::{is_text_mime, IRemoteStore, UploadBody};
use base64::Engine;
use tracing::{debug, info, warn};

use crate::walker::FileRecord;
use crate::{now_millis, SyncError};

/// Progress callback: `(done_so_far, batch_total, current_path)`
pub type ProgressCallback<'a> = dyn Fn(u64, u64, &str) + Send + Sync + 'a;

/// Counters of one upload batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub uploaded: u64,
    pub failed: u64,
    /// Bytes transferred successfully
    pub total_bytes: u64,
}

/// Encode file content for transfer
///
/// Textual types are sent as (lossily decoded) UTF-8 text, everything else
/// as base64 wrapped with its type and name.
pub fn encode_body(mime_type: &str, name: &str, content: Vec<u8>) -> UploadBody {
    if is_text_mime(mime_type) {
        let text = match String::from_utf8(content) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        };
        UploadBody::Text(text)
    } else {
        UploadBody::Binary {
            data: base64::engine::general_purpose::STANDARD.encode(content),
            mime_type: mime_type.to_string(),
            name: name.to_string(),
        }
    }
}

/// Sequential, paced uploader
pub struct UploadPipeline {
    store: Arc<dyn IRemoteStore>,
    pacing: Duration,
}

impl UploadPipeline {
    pub fn new(store: Arc<dyn IRemoteStore>, pacing: Duration) -> Self {
        Self { store, pacing }
    }

    /// Upload `files` in order, updating `metadata` after every success
    #[tracing::instrument(skip_all, fields(remote = %remote_name, files = files.len()))]
    pub async fn upload_batch(
        &self,
        remote_name: &RemoteName,
        files: &[FileRecord],
        metadata: &mut RemoteMetadata,
        on_progress: &ProgressCallback<'_>,
    ) -> BatchOutcome {
        let total = files.len() as u64;
        let mut outcome = BatchOutcome::default();

        for (index, file) in files.iter().enumerate() {
            if index > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }

            on_progress(index as u64, total, file.relative_path.as_str());

            match self.upload_one(remote_name, file).await {
                Ok(()) => {
                    metadata.record_upload(
                        file.relative_path.as_str(),
                        FileMeta {
                            size: file.size,
                            mtime: file.mtime,
                            mime_type: file.mime_type.clone(),
                            uploaded_at: now_millis(),
                        },
                    );
                    outcome.uploaded += 1;
                    outcome.total_bytes += file.size;
                    debug!(path = %file.relative_path, size = file.size, "Uploaded");
                }
                Err(err) => {
                    outcome.failed += 1;
                    warn!(error = %err, "Upload failed, continuing with next file");
                }
            }
        }

        info!(
            uploaded = outcome.uploaded,
            failed = outcome.failed,
            bytes = outcome.total_bytes,
            "Upload batch complete"
        );
        outcome
    }

    async fn upload_one(&self, remote_name: &RemoteName, file: &FileRecord) -> Result<(), SyncError> {
        let failure = |err: anyhow::Error| SyncError::UploadFailure {
            path: file.relative_path.to_string(),
            message: format!("{err:#}"),
        };

        let content = file.content.read().await.map_err(failure)?;
        let body = encode_body(&file.mime_type, file.relative_path.file_name(), content);
        self.store
            .upload_file(remote_name, &file.relative_path, body)
            .await
            .map_err(failure)
    }
}
