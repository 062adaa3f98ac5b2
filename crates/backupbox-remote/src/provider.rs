//! RemoteStore - IRemoteStore implementation over HTTP
//!
//! Wraps the [`RemoteClient`] and delegates to the metadata and upload
//! modules to fulfil the [`IRemoteStore`] port contract.

use anyhow::Context;
use backupbox_core::config::RemoteConfig;
use backupbox_core::domain::{RelativePath, RemoteMetadata, RemoteName};
use backupbox_core::ports::{IRemoteStore, UploadBody};

use crate::client::RemoteClient;
use crate::{metadata, upload, RemoteError};

/// HTTP-backed remote store
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: RemoteClient,
}

impl RemoteStore {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    /// Creates a store from the `remote` configuration section
    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        Ok(Self::new(RemoteClient::new(config)?))
    }

    pub fn client(&self) -> &RemoteClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl IRemoteStore for RemoteStore {
    async fn fetch_metadata(
        &self,
        remote_name: &RemoteName,
    ) -> anyhow::Result<Option<RemoteMetadata>> {
        metadata::fetch_metadata(&self.client, remote_name)
            .await
            .with_context(|| format!("Failed to fetch metadata of {remote_name}"))
    }

    async fn save_metadata(
        &self,
        remote_name: &RemoteName,
        metadata: &RemoteMetadata,
    ) -> anyhow::Result<()> {
        metadata::save_metadata(&self.client, remote_name, metadata)
            .await
            .with_context(|| format!("Failed to save metadata of {remote_name}"))
    }

    async fn upload_file(
        &self,
        remote_name: &RemoteName,
        path: &RelativePath,
        body: UploadBody,
    ) -> anyhow::Result<()> {
        upload::upload_file(&self.client, remote_name, path, &body)
            .await
            .with_context(|| format!("Failed to upload {path} to {remote_name}"))
    }
}
