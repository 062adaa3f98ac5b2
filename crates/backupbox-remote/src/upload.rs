//! File uploads
//!
//! Text bodies are sent as-is with `Content-Type: text/plain`. Binary bodies
//! are wrapped in a JSON envelope:
//!
//! ```text
//! {"_binary": true, "data": "<base64>", "type": "image/png", "name": "a.png"}
//! ```

use backupbox_core::domain::{RelativePath, RemoteName};
use backupbox_core::ports::UploadBody;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::Serialize;
use tracing::debug;

use crate::client::RemoteClient;
use crate::RemoteError;

/// JSON envelope for binary content
#[derive(Debug, Serialize)]
struct BinaryEnvelope<'a> {
    #[serde(rename = "_binary")]
    binary: bool,
    data: &'a str,
    #[serde(rename = "type")]
    mime_type: &'a str,
    name: &'a str,
}

/// Store one file at `{remoteName}/{path}`
///
/// # Errors
/// Returns `RemoteError::Http` on a non-2xx answer, or
/// `RemoteError::Network` if the request could not be sent.
#[tracing::instrument(skip(client, body), fields(remote = %remote_name, path = %path))]
pub async fn upload_file(
    client: &RemoteClient,
    remote_name: &RemoteName,
    path: &RelativePath,
    body: &UploadBody,
) -> Result<(), RemoteError> {
    let url = client.folder_url(remote_name, path.segments());
    let request = client.request(Method::PUT, url.clone());

    let request = match body {
        UploadBody::Text(text) => request
            .header(CONTENT_TYPE, body.content_type())
            .body(text.clone()),
        UploadBody::Binary {
            data,
            mime_type,
            name,
        } => request.json(&BinaryEnvelope {
            binary: true,
            data,
            mime_type,
            name,
        }),
    };

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(RemoteError::Http {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    debug!(status = status.as_u16(), "Upload complete");
    Ok(())
}
