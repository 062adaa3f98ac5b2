//! Metadata document fetch and save

use backupbox_core::domain::{FileMeta, RemoteMetadata, RemoteName};
use backupbox_remote::metadata::{fetch_metadata, save_metadata};
use backupbox_remote::RemoteError;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

fn remote(name: &str) -> RemoteName {
    RemoteName::new(name).unwrap()
}

#[tokio::test]
async fn test_fetch_existing_metadata() {
    let (server, client) = common::setup_remote_mock().await;
    common::mount_metadata(
        &server,
        "photos",
        serde_json::json!({
            "files": {
                "a.jpg": {"size": 3072, "mtime": 1700000000000_i64, "type": "image/jpeg", "uploadedAt": 1700000001000_i64}
            },
            "lastBackup": 1700000002000_i64,
            "totalFiles": 1,
            "totalBytes": 3072
        }),
    )
    .await;

    let metadata = fetch_metadata(&client, &remote("photos"))
        .await
        .expect("fetch failed")
        .expect("metadata missing");

    assert_eq!(metadata.total_files, 1);
    assert_eq!(metadata.total_bytes, 3072);
    assert_eq!(metadata.last_backup, Some(1_700_000_002_000));
    let file = metadata.get("a.jpg").unwrap();
    assert_eq!(file.size, 3072);
    assert_eq!(file.mime_type, "image/jpeg");
}

#[tokio::test]
async fn test_fetch_missing_metadata_is_none() {
    let (_server, client) = common::setup_remote_mock().await;

    // Nothing mounted: wiremock answers 404.
    let metadata = fetch_metadata(&client, &remote("never-synced"))
        .await
        .expect("fetch failed");
    assert!(metadata.is_none());
}

#[tokio::test]
async fn test_fetch_server_error_is_none() {
    let (server, client) = common::setup_remote_mock().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(fetch_metadata(&client, &remote("photos")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_malformed_document_is_an_error() {
    let (server, client) = common::setup_remote_mock().await;
    Mock::given(method("GET"))
        .and(path(common::folder_path("photos", "metadata.json")))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = fetch_metadata(&client, &remote("photos")).await.unwrap_err();
    assert!(matches!(err, RemoteError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_save_metadata_puts_document() {
    let (server, client) = common::setup_remote_mock().await;

    let mut metadata = RemoteMetadata::empty();
    metadata.record_upload(
        "notes/todo.txt",
        FileMeta {
            size: 12,
            mtime: 5,
            mime_type: "text/plain".into(),
            uploaded_at: 6,
        },
    );
    metadata.finalize(7);

    Mock::given(method("PUT"))
        .and(path(common::folder_path("My%20Docs", "metadata.json")))
        .and(body_json(serde_json::json!({
            "files": {
                "notes/todo.txt": {"size": 12, "mtime": 5, "type": "text/plain", "uploadedAt": 6}
            },
            "lastBackup": 7,
            "totalFiles": 1,
            "totalBytes": 12
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    save_metadata(&client, &remote("My Docs"), &metadata)
        .await
        .expect("save failed");
}

#[tokio::test]
async fn test_save_metadata_rejected() {
    let (server, client) = common::setup_remote_mock().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(507))
        .mount(&server)
        .await;

    let err = save_metadata(&client, &remote("photos"), &RemoteMetadata::empty())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Http { status: 507, .. }));
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let (server, client) = common::setup_remote_mock().await;
    let client = client.with_access_token("secret-token");
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let metadata = fetch_metadata(&client, &remote("photos")).await.unwrap();
    assert_eq!(metadata, Some(RemoteMetadata::empty()));
}
