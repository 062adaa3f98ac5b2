//! Incremental synchronization engine
//!
//! The [`FolderSynchronizer`] mirrors one local folder to its remote
//! counterpart; the [`SyncOrchestrator`] runs it over every configured
//! folder in order.
//!
//! ## Folder Flow
//!
//! 1. **Fetch** the remote metadata document (missing or unreachable means
//!    an empty document)
//! 2. **Walk** the local tree
//! 3. **Diff** the walked files against the metadata
//! 4. **Upload** the selected files, one at a time
//! 5. **Finalize** the document (`last_backup`, recomputed totals) and save it
//!
//! A failed save is logged and does not undo the uploads of the run.

use std::sync::Arc;
use std::time::Duration;

use backupbox_core::config::SyncConfig;
use backupbox_core::domain::{FolderConfig, RemoteMetadata, RemoteName, SyncResult};
use backupbox_core::ports::{IDirectory, IDirectorySource, IRemoteStore};
use tracing::{debug, error, info, warn};

use crate::diff::filter_needing_upload;
use crate::uploader::{ProgressCallback, UploadPipeline};
use crate::walker::{ensure_readable, DirectoryWalker};
use crate::{now_millis, SyncError};

// ============================================================================
// FolderSynchronizer
// ============================================================================

/// Synchronizes a single folder
pub struct FolderSynchronizer {
    store: Arc<dyn IRemoteStore>,
    walker: DirectoryWalker,
    uploader: UploadPipeline,
    max_file_size: u64,
}

impl FolderSynchronizer {
    /// Creates a synchronizer using the limits of the `sync` config section
    pub fn new(store: Arc<dyn IRemoteStore>, config: &SyncConfig) -> Self {
        Self {
            uploader: UploadPipeline::new(
                store.clone(),
                Duration::from_millis(config.upload_delay_ms),
            ),
            walker: DirectoryWalker::new(config.max_depth),
            max_file_size: config.max_file_size,
            store,
        }
    }

    /// Mirror `dir` to the remote folder `remote_name`
    ///
    /// # Errors
    /// Fails only when the root of `dir` cannot be read. Every other
    /// failure is absorbed and reflected in the returned counters.
    pub async fn sync_folder(
        &self,
        dir: &dyn IDirectory,
        remote_name: &RemoteName,
        on_progress: &ProgressCallback<'_>,
    ) -> Result<SyncResult, SyncError> {
        self.sync_checked(dir, remote_name, on_progress, true).await
    }

    /// `check_access` is false when the caller already settled read access
    /// to the root
    #[tracing::instrument(skip(self, dir, on_progress), fields(remote = %remote_name))]
    async fn sync_checked(
        &self,
        dir: &dyn IDirectory,
        remote_name: &RemoteName,
        on_progress: &ProgressCallback<'_>,
        check_access: bool,
    ) -> Result<SyncResult, SyncError> {
        let mut metadata = self.fetch_metadata(remote_name).await;

        let records = if check_access {
            self.walker.walk(dir).await?
        } else {
            self.walker.walk_readable(dir).await?
        };
        let walked = records.len() as u64;

        let to_upload = filter_needing_upload(records, &metadata, self.max_file_size);
        let skipped = walked - to_upload.len() as u64;
        debug!(walked, selected = to_upload.len(), "Diff complete");

        let outcome = self
            .uploader
            .upload_batch(remote_name, &to_upload, &mut metadata, on_progress)
            .await;

        metadata.finalize(now_millis());
        if let Err(err) = self.store.save_metadata(remote_name, &metadata).await {
            let err = SyncError::MetadataSaveFailure {
                remote: remote_name.to_string(),
                message: format!("{err:#}"),
            };
            error!(error = %err, "Metadata not saved; uploads of this run are kept");
        }

        let result = SyncResult {
            uploaded: outcome.uploaded,
            skipped,
            failed: outcome.failed,
            total_bytes: metadata.total_bytes,
            total_files: metadata.total_files,
            uploaded_bytes: outcome.total_bytes,
        };
        info!(
            uploaded = result.uploaded,
            skipped = result.skipped,
            failed = result.failed,
            total_files = result.total_files,
            "Folder synchronized"
        );
        Ok(result)
    }

    async fn fetch_metadata(&self, remote_name: &RemoteName) -> RemoteMetadata {
        match self.store.fetch_metadata(remote_name).await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                debug!("No remote metadata yet, starting from an empty document");
                RemoteMetadata::empty()
            }
            Err(err) => {
                let err = SyncError::TransientFetchFailure {
                    remote: remote_name.to_string(),
                    message: format!("{err:#}"),
                };
                warn!(error = %err, "Treating remote as empty");
                RemoteMetadata::empty()
            }
        }
    }
}

// ============================================================================
// SyncOrchestrator
// ============================================================================

/// Runs the folder synchronizer over a list of folders
pub struct SyncOrchestrator {
    source: Arc<dyn IDirectorySource>,
    folder_sync: FolderSynchronizer,
}

impl SyncOrchestrator {
    pub fn new(source: Arc<dyn IDirectorySource>, folder_sync: FolderSynchronizer) -> Self {
        Self {
            source,
            folder_sync,
        }
    }

    /// Synchronize every folder, strictly in list order
    ///
    /// Aggregate counters are sums over the folders; a folder that cannot be
    /// synchronized adds one to `failed`.
    ///
    /// # Errors
    /// Returns `SyncError::ConfigurationError` before doing any work when the
    /// list is empty or when none of the folders is readable.
    #[tracing::instrument(skip_all, fields(folders = folders.len()))]
    pub async fn sync_all(
        &self,
        folders: &[FolderConfig],
        on_progress: &ProgressCallback<'_>,
    ) -> Result<SyncResult, SyncError> {
        if folders.is_empty() {
            return Err(SyncError::ConfigurationError(
                "no folders configured".to_string(),
            ));
        }

        let mut opened = Vec::with_capacity(folders.len());
        for folder in folders {
            let dir = self.source.open(&folder.local_path);
            let readable = ensure_readable(dir.as_ref()).await;
            if !readable {
                warn!(
                    path = %folder.local_path.display(),
                    remote = %folder.remote_name,
                    "Folder is not accessible"
                );
            }
            opened.push((folder, dir, readable));
        }

        if opened.iter().all(|(_, _, readable)| !readable) {
            return Err(SyncError::ConfigurationError(format!(
                "none of the {} configured folders is accessible",
                folders.len()
            )));
        }

        let mut aggregate = SyncResult::default();
        for (folder, dir, readable) in opened {
            if !readable {
                aggregate.record_folder_failure();
                continue;
            }

            match self
                .folder_sync
                .sync_checked(dir.as_ref(), &folder.remote_name, on_progress, false)
                .await
            {
                Ok(result) => aggregate.accumulate(&result),
                Err(err) => {
                    error!(remote = %folder.remote_name, error = %err, "Folder synchronization failed");
                    aggregate.record_folder_failure();
                }
            }
        }

        info!(
            uploaded = aggregate.uploaded,
            skipped = aggregate.skipped,
            failed = aggregate.failed,
            "Synchronization run complete"
        );
        Ok(aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryDirectory, MemorySource, MemoryStore};
    use backupbox_core::config::ConfigBuilder;
    use backupbox_core::domain::FolderSet;

    fn sync_config() -> SyncConfig {
        ConfigBuilder::new().sync_upload_delay_ms(0).build().sync
    }

    fn remote(name: &str) -> RemoteName {
        RemoteName::new(name).unwrap()
    }

    fn ignore(_: u64, _: u64, _: &str) {}

    fn no_progress() -> &'static ProgressCallback<'static> {
        &ignore
    }

    #[tokio::test]
    async fn test_two_new_files_without_metadata() {
        let store = Arc::new(MemoryStore::new());
        let sync = FolderSynchronizer::new(store.clone(), &sync_config());
        let dir = MemoryDirectory::new("docs")
            .file("a.bin", vec![1u8; 3 * 1024], 10)
            .file("b.bin", vec![2u8; 5 * 1024], 20);

        let result = sync
            .sync_folder(&dir, &remote("docs"), no_progress())
            .await
            .unwrap();

        assert_eq!(result.uploaded, 2);
        assert_eq!(result.skipped, 0);
        assert_eq!(result.failed, 0);
        assert_eq!(result.total_bytes, 8192);
        assert_eq!(result.total_files, 2);
        assert_eq!(result.uploaded_bytes, 8192);

        let saved = store.saved("docs").unwrap();
        assert!(saved.is_consistent());
        assert!(saved.last_backup.is_some());
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let sync = FolderSynchronizer::new(store.clone(), &sync_config());
        let dir = MemoryDirectory::new("docs")
            .file("a.txt", "hello", 10)
            .dir(MemoryDirectory::new("sub").file("b.txt", "world!", 20));

        sync.sync_folder(&dir, &remote("docs"), no_progress())
            .await
            .unwrap();
        let second = sync
            .sync_folder(&dir, &remote("docs"), no_progress())
            .await
            .unwrap();

        assert_eq!(second.uploaded, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(second.failed, 0);
        assert_eq!(second.total_files, 2);
        assert_eq!(second.total_bytes, 11);
        assert_eq!(second.uploaded_bytes, 0);
        assert_eq!(store.uploaded_paths().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_folder_without_metadata() {
        let store = Arc::new(MemoryStore::new());
        let sync = FolderSynchronizer::new(store.clone(), &sync_config());

        let result = sync
            .sync_folder(&MemoryDirectory::new("empty"), &remote("empty"), no_progress())
            .await
            .unwrap();

        assert_eq!(result, SyncResult::default());
        assert_eq!(store.saved("empty").unwrap().total_files, 0);
    }

    #[tokio::test]
    async fn test_totals_are_cumulative() {
        let store = Arc::new(MemoryStore::new());
        let sync = FolderSynchronizer::new(store.clone(), &sync_config());

        let first = MemoryDirectory::new("d").file("old.txt", "1234", 1);
        sync.sync_folder(&first, &remote("d"), no_progress())
            .await
            .unwrap();

        let second = MemoryDirectory::new("d")
            .file("old.txt", "1234", 1)
            .file("new.txt", "12", 5);
        let result = sync
            .sync_folder(&second, &remote("d"), no_progress())
            .await
            .unwrap();

        assert_eq!(result.uploaded, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.uploaded_bytes, 2);
        assert_eq!(result.total_files, 2);
        assert_eq!(result.total_bytes, 6);
    }

    #[tokio::test]
    async fn test_fetch_failure_means_empty_document() {
        let store = Arc::new(MemoryStore {
            fail_fetch: true,
            ..MemoryStore::new()
        });
        let sync = FolderSynchronizer::new(store.clone(), &sync_config());
        let dir = MemoryDirectory::new("d").file("a.txt", "a", 1);

        let result = sync
            .sync_folder(&dir, &remote("d"), no_progress())
            .await
            .unwrap();
        assert_eq!(result.uploaded, 1);
    }

    #[tokio::test]
    async fn test_save_failure_is_not_propagated() {
        let store = Arc::new(MemoryStore {
            fail_save: true,
            ..MemoryStore::new()
        });
        let sync = FolderSynchronizer::new(store.clone(), &sync_config());
        let dir = MemoryDirectory::new("d").file("a.txt", "abc", 1);

        let result = sync
            .sync_folder(&dir, &remote("d"), no_progress())
            .await
            .unwrap();
        assert_eq!(result.uploaded, 1);
        assert_eq!(result.total_files, 1);
        assert_eq!(*store.saves.lock().unwrap(), 1);
        assert!(store.saved("d").is_none());
    }

    #[tokio::test]
    async fn test_oversized_file_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let config = ConfigBuilder::new()
            .sync_upload_delay_ms(0)
            .sync_max_file_size(4)
            .build()
            .sync;
        let sync = FolderSynchronizer::new(store.clone(), &config);
        let dir = MemoryDirectory::new("d")
            .file("fits.txt", "1234", 1)
            .file("big.txt", "12345", 1);

        let result = sync
            .sync_folder(&dir, &remote("d"), no_progress())
            .await
            .unwrap();
        assert_eq!(result.uploaded, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(store.uploaded_paths(), vec!["fits.txt"]);
    }

    fn folder_set(entries: &[(&str, &str)]) -> FolderSet {
        let mut set = FolderSet::new();
        for (path, name) in entries {
            set.add(FolderConfig::new(*path, remote(name))).unwrap();
        }
        set
    }

    #[tokio::test]
    async fn test_orchestrator_isolates_failing_folder() {
        let source = MemorySource::new()
            .with("/one", MemoryDirectory::new("one").file("a.txt", "a", 1))
            .with("/two", MemoryDirectory::new("two").failing_entries())
            .with(
                "/three",
                MemoryDirectory::new("three")
                    .file("b.txt", "bb", 1)
                    .file("c.txt", "ccc", 1),
            );
        let store = Arc::new(MemoryStore::new());
        let orchestrator = SyncOrchestrator::new(
            Arc::new(source),
            FolderSynchronizer::new(store.clone(), &sync_config()),
        );
        let folders = folder_set(&[("/one", "one"), ("/two", "two"), ("/three", "three")]);

        let result = orchestrator
            .sync_all(folders.as_slice(), no_progress())
            .await
            .unwrap();

        assert_eq!(result.uploaded, 3);
        assert_eq!(result.failed, 1);
        assert_eq!(result.total_files, 3);
        assert_eq!(result.total_bytes, 6);
        assert_eq!(store.uploaded_paths(), vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[tokio::test]
    async fn test_orchestrator_counts_inaccessible_folder() {
        let source =
            MemorySource::new().with("/one", MemoryDirectory::new("one").file("a.txt", "a", 1));
        let store = Arc::new(MemoryStore::new());
        let orchestrator = SyncOrchestrator::new(
            Arc::new(source),
            FolderSynchronizer::new(store.clone(), &sync_config()),
        );
        let folders = folder_set(&[("/gone", "gone"), ("/one", "one")]);

        let result = orchestrator
            .sync_all(folders.as_slice(), no_progress())
            .await
            .unwrap();
        assert_eq!(result.uploaded, 1);
        assert_eq!(result.failed, 1);
    }

    #[tokio::test]
    async fn test_orchestrator_rejects_empty_list() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = SyncOrchestrator::new(
            Arc::new(MemorySource::new()),
            FolderSynchronizer::new(store, &sync_config()),
        );

        let err = orchestrator.sync_all(&[], no_progress()).await.unwrap_err();
        assert!(matches!(err, SyncError::ConfigurationError(_)));
    }

    #[tokio::test]
    async fn test_orchestrator_rejects_all_inaccessible() {
        let source = MemorySource::new().with(
            "/locked",
            MemoryDirectory::new("locked").denied().file("a.txt", "a", 1),
        );
        let store = Arc::new(MemoryStore::new());
        let orchestrator = SyncOrchestrator::new(
            Arc::new(source),
            FolderSynchronizer::new(store.clone(), &sync_config()),
        );
        let folders = folder_set(&[("/locked", "locked"), ("/missing", "missing")]);

        let err = orchestrator
            .sync_all(folders.as_slice(), no_progress())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ConfigurationError(_)));
        assert!(store.uploaded_paths().is_empty());
        assert_eq!(*store.saves.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_orchestrator_prompts_each_root_once() {
        let source = MemorySource::new().with(
            "/photos",
            MemoryDirectory::new("photos")
                .needs_prompt()
                .file("a.jpg", vec![0u8; 4], 1),
        );
        let prompted = source.directory("/photos").unwrap();
        let store = Arc::new(MemoryStore::new());
        let orchestrator = SyncOrchestrator::new(
            Arc::new(source),
            FolderSynchronizer::new(store.clone(), &sync_config()),
        );
        let folders = folder_set(&[("/photos", "photos")]);

        let result = orchestrator
            .sync_all(folders.as_slice(), no_progress())
            .await
            .unwrap();

        assert_eq!(result.uploaded, 1);
        assert_eq!(prompted.permission_requests(), 1);
    }

    #[tokio::test]
    async fn test_orchestrator_progress_is_monotonic_per_batch() {
        let source = MemorySource::new()
            .with(
                "/a",
                MemoryDirectory::new("a")
                    .file("1.txt", "1", 1)
                    .file("2.txt", "2", 1),
            )
            .with("/b", MemoryDirectory::new("b").file("3.txt", "3", 1));
        let store = Arc::new(MemoryStore::new());
        let orchestrator = SyncOrchestrator::new(
            Arc::new(source),
            FolderSynchronizer::new(store, &sync_config()),
        );
        let folders = folder_set(&[("/a", "a"), ("/b", "b")]);
        let seen = std::sync::Mutex::new(Vec::new());

        orchestrator
            .sync_all(folders.as_slice(), &|done, total, path| {
                seen.lock().unwrap().push((done, total, path.to_string()));
            })
            .await
            .unwrap();

        assert_eq!(
            seen.into_inner().unwrap(),
            vec![
                (0, 2, "1.txt".to_string()),
                (1, 2, "2.txt".to_string()),
                (0, 1, "3.txt".to_string()),
            ]
        );
    }
}
