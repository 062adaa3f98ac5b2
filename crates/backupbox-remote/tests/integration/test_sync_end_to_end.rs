//! Full folder synchronization against the mock store

use std::path::Path;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use backupbox_core::config::ConfigBuilder;
use backupbox_core::domain::{FolderConfig, RemoteName};
use backupbox_remote::provider::RemoteStore;
use backupbox_sync::engine::{FolderSynchronizer, SyncOrchestrator};
use backupbox_sync::filesystem::LocalFileSystem;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

fn ignore(_: u64, _: u64, _: &str) {}

#[tokio::test]
async fn test_first_sync_uploads_everything_and_saves_metadata() {
    let (server, client) = common::setup_remote_mock().await;
    common::mount_accept_all_puts(&server).await;

    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir(tmp.path().join("sub")).unwrap();
    std::fs::write(tmp.path().join("a.txt"), vec![b'a'; 3 * 1024]).unwrap();
    std::fs::write(tmp.path().join("sub/b.bin"), vec![0u8; 5 * 1024]).unwrap();

    let config = ConfigBuilder::new().sync_upload_delay_ms(0).build();
    let orchestrator = SyncOrchestrator::new(
        Arc::new(LocalFileSystem::new()),
        FolderSynchronizer::new(Arc::new(RemoteStore::new(client)), &config.sync),
    );
    let folders = vec![FolderConfig::new(
        tmp.path(),
        RemoteName::new("docs").unwrap(),
    )];

    let result = orchestrator.sync_all(&folders, &ignore).await.unwrap();
    assert_eq!(result.uploaded, 2);
    assert_eq!(result.failed, 0);
    assert_eq!(result.total_files, 2);
    assert_eq!(result.total_bytes, 8192);

    let requests = server.received_requests().await.unwrap();
    let put_paths: Vec<_> = requests
        .iter()
        .filter(|r| r.method.as_str() == "PUT")
        .map(|r| r.url.path().to_string())
        .collect();
    assert!(put_paths.contains(&common::folder_path("docs", "a.txt")));
    assert!(put_paths.contains(&common::folder_path("docs", "sub/b.bin")));
    assert_eq!(
        put_paths.last().map(String::as_str),
        Some(common::folder_path("docs", "metadata.json").as_str())
    );

    let saved = requests
        .iter()
        .rev()
        .find(|r| r.url.path().ends_with("metadata.json") && r.method.as_str() == "PUT")
        .unwrap();
    let document: serde_json::Value = serde_json::from_slice(&saved.body).unwrap();
    assert_eq!(document["totalFiles"], 2);
    assert_eq!(document["totalBytes"], 8192);
    assert_eq!(document["files"]["sub/b.bin"]["type"], "application/octet-stream");
}

#[tokio::test]
async fn test_unchanged_files_are_skipped() {
    let (server, client) = common::setup_remote_mock().await;

    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("same.txt");
    std::fs::write(&file, "unchanged").unwrap();
    let mtime = mtime_millis(&file);

    common::mount_metadata(
        &server,
        "docs",
        serde_json::json!({
            "files": {"same.txt": {"size": 9, "mtime": mtime, "type": "text/plain", "uploadedAt": 1}},
            "lastBackup": 1,
            "totalFiles": 1,
            "totalBytes": 9
        }),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path(common::folder_path("docs", "metadata.json")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = ConfigBuilder::new().build();
    let synchronizer =
        FolderSynchronizer::new(Arc::new(RemoteStore::new(client)), &config.sync);
    let dir = backupbox_sync::filesystem::LocalDirectory::new(tmp.path());

    let result = synchronizer
        .sync_folder(&dir, &RemoteName::new("docs").unwrap(), &ignore)
        .await
        .unwrap();
    assert_eq!(result.uploaded, 0);
    assert_eq!(result.skipped, 1);
    assert_eq!(result.total_files, 1);
    assert!(result.is_up_to_date());
}

fn mtime_millis(path: &Path) -> i64 {
    let modified = std::fs::metadata(path).unwrap().modified().unwrap();
    modified.duration_since(UNIX_EPOCH).unwrap().as_millis() as i64
}
