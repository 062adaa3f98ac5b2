//! BackupBox Remote - HTTP client for the remote object store
//!
//! Provides an async client for:
//! - Fetching and saving the per-folder metadata document
//! - Uploading single files as raw text or as a base64 JSON envelope
//!
//! ## Modules
//!
//! - [`client`] - HTTP client, URL construction and authentication
//! - [`metadata`] - Metadata document GET/PUT
//! - [`upload`] - File uploads
//! - [`provider`] - [`IRemoteStore`](backupbox_core::ports::IRemoteStore) adapter

pub mod client;
pub mod metadata;
pub mod provider;
pub mod upload;

use thiserror::Error;

/// Errors that can occur when talking to the remote store
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The configured base URL cannot be used to build request URLs
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    /// The response body could not be parsed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
