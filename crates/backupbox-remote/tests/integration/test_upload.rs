//! File uploads: text bodies, binary envelopes and path escaping

use backupbox_core::domain::{RelativePath, RemoteName};
use backupbox_core::ports::UploadBody;
use backupbox_remote::client::RemoteClient;
use backupbox_remote::upload::upload_file;
use backupbox_remote::RemoteError;
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

fn remote(name: &str) -> RemoteName {
    RemoteName::new(name).unwrap()
}

fn rel(path: &str) -> RelativePath {
    RelativePath::new(path).unwrap()
}

#[tokio::test]
async fn test_text_upload_is_sent_raw() {
    let (server, client) = common::setup_remote_mock().await;
    Mock::given(method("PUT"))
        .and(path(common::folder_path("docs", "notes/readme.md")))
        .and(header("content-type", "text/plain"))
        .and(body_string("# hello"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    upload_file(
        &client,
        &remote("docs"),
        &rel("notes/readme.md"),
        &UploadBody::Text("# hello".into()),
    )
    .await
    .expect("upload failed");
}

#[tokio::test]
async fn test_binary_upload_uses_envelope() {
    let (server, client) = common::setup_remote_mock().await;
    Mock::given(method("PUT"))
        .and(path(common::folder_path("photos", "a.png")))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "_binary": true,
            "data": "AAEC",
            "type": "image/png",
            "name": "a.png"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    upload_file(
        &client,
        &remote("photos"),
        &rel("a.png"),
        &UploadBody::Binary {
            data: "AAEC".into(),
            mime_type: "image/png".into(),
            name: "a.png".into(),
        },
    )
    .await
    .expect("upload failed");
}

#[tokio::test]
async fn test_path_segments_are_escaped() {
    let (server, client) = common::setup_remote_mock().await;
    Mock::given(method("PUT"))
        .and(path(common::folder_path(
            "My%20Photos",
            "2024%20trip/caf%C3%A9%20%231.txt",
        )))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    upload_file(
        &client,
        &remote("My Photos"),
        &rel("2024 trip/café #1.txt"),
        &UploadBody::Text("x".into()),
    )
    .await
    .expect("upload failed");
}

#[tokio::test]
async fn test_rejected_upload_is_an_http_error() {
    let (server, client) = common::setup_remote_mock().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(413))
        .mount(&server)
        .await;

    let err = upload_file(
        &client,
        &remote("docs"),
        &rel("big.txt"),
        &UploadBody::Text("x".into()),
    )
    .await
    .unwrap_err();
    match err {
        RemoteError::Http { status, url } => {
            assert_eq!(status, 413);
            assert!(url.ends_with("/api/backupbox/data/backups/docs/big.txt"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let client = RemoteClient::with_base_url(format!("http://127.0.0.1:{port}"), common::APP_ID)
        .unwrap();

    let err = upload_file(
        &client,
        &remote("docs"),
        &rel("a.txt"),
        &UploadBody::Text("x".into()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RemoteError::Network(_)));
}
