//! Metadata document operations
//!
//! - [`fetch_metadata`] - `GET .../{remoteName}/metadata.json`
//! - [`save_metadata`] - `PUT .../{remoteName}/metadata.json`
//!
//! Any non-200 answer to the GET means the folder has no metadata yet.

use backupbox_core::domain::{RemoteMetadata, RemoteName};
use reqwest::{Method, StatusCode};
use tracing::{debug, info};

use crate::client::RemoteClient;
use crate::RemoteError;

/// File name of the metadata document inside every remote folder
pub const METADATA_FILE: &str = "metadata.json";

/// Fetch the metadata document of `remote_name`
///
/// # Returns
/// `Ok(None)` when the server does not answer 200.
#[tracing::instrument(skip(client), fields(remote = %remote_name))]
pub async fn fetch_metadata(
    client: &RemoteClient,
    remote_name: &RemoteName,
) -> Result<Option<RemoteMetadata>, RemoteError> {
    let url = client.folder_url(remote_name, [METADATA_FILE]);
    let response = client.request(Method::GET, url).send().await?;

    if response.status() != StatusCode::OK {
        debug!(status = response.status().as_u16(), "No metadata document");
        return Ok(None);
    }

    let metadata: RemoteMetadata = response
        .json()
        .await
        .map_err(|e| RemoteError::InvalidResponse(format!("metadata document: {e}")))?;
    debug!(files = metadata.files.len(), "Fetched metadata");
    Ok(Some(metadata))
}

/// Replace the metadata document of `remote_name`
///
/// # Errors
/// Returns `RemoteError::Http` on a non-2xx answer.
#[tracing::instrument(skip(client, metadata), fields(remote = %remote_name, files = metadata.total_files))]
pub async fn save_metadata(
    client: &RemoteClient,
    remote_name: &RemoteName,
    metadata: &RemoteMetadata,
) -> Result<(), RemoteError> {
    let url = client.folder_url(remote_name, [METADATA_FILE]);
    let response = client
        .request(Method::PUT, url.clone())
        .json(metadata)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(RemoteError::Http {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    info!(total_bytes = metadata.total_bytes, "Saved metadata");
    Ok(())
}
