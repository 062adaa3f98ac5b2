//! Shared test helpers for remote store integration tests

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use backupbox_remote::client::RemoteClient;

pub const APP_ID: &str = "backupbox";

/// Starts an empty mock server and returns a client pointing at it
pub async fn setup_remote_mock() -> (MockServer, RemoteClient) {
    let server = MockServer::start().await;
    let client = RemoteClient::with_base_url(server.uri(), APP_ID).expect("mock server URL");
    (server, client)
}

/// Server path of `rest` inside the remote folder `remote` (already escaped)
pub fn folder_path(remote: &str, rest: &str) -> String {
    format!("/api/{APP_ID}/data/backups/{remote}/{rest}")
}

/// Mounts `GET .../{remote}/metadata.json` answering with `body`
pub async fn mount_metadata(server: &MockServer, remote: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(folder_path(remote, "metadata.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Accepts every PUT with 200
pub async fn mount_accept_all_puts(server: &MockServer) {
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}
