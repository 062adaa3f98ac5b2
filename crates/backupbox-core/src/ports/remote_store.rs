//! Remote store port (driven/secondary port)
//!
//! The remote side of a backup: one metadata document and a flat namespace
//! of files per remote folder name.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific.
//! - A missing metadata document is `Ok(None)`, not an error.
//! - The body of an upload is already encoded by the caller; the adapter
//!   only chooses the HTTP representation.

use crate::domain::metadata::RemoteMetadata;
use crate::domain::newtypes::{RelativePath, RemoteName};

/// Encoded content of one file upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadBody {
    /// Textual content sent verbatim
    Text(String),
    /// Arbitrary bytes, already base64-encoded
    Binary {
        /// Base64 of the file content
        data: String,
        /// MIME type of the original file
        mime_type: String,
        /// Base name of the original file
        name: String,
    },
}

impl UploadBody {
    /// `Content-Type` header the body is sent with
    pub fn content_type(&self) -> &'static str {
        match self {
            UploadBody::Text(_) => "text/plain",
            UploadBody::Binary { .. } => "application/json",
        }
    }
}

/// MIME types uploaded as raw text rather than as a base64 envelope
pub fn is_text_mime(mime_type: &str) -> bool {
    mime_type.starts_with("text/")
        || mime_type == "application/json"
        || mime_type == "application/javascript"
}

/// Remote storage operations used by the synchronization engine
#[async_trait::async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Fetch the metadata document of a remote folder
    ///
    /// Returns `Ok(None)` when the folder has no metadata yet.
    async fn fetch_metadata(&self, remote_name: &RemoteName)
        -> anyhow::Result<Option<RemoteMetadata>>;

    /// Replace the metadata document of a remote folder
    async fn save_metadata(
        &self,
        remote_name: &RemoteName,
        metadata: &RemoteMetadata,
    ) -> anyhow::Result<()>;

    /// Store one file under a remote folder
    async fn upload_file(
        &self,
        remote_name: &RemoteName,
        path: &RelativePath,
        body: UploadBody,
    ) -> anyhow::Result<()>;
}
