//! BackupBox Sync - Incremental folder synchronization engine
//!
//! Provides:
//! - Recursive directory walking with permission recovery
//! - Modification-time diffing against the remote metadata document
//! - A paced, sequential upload pipeline
//! - Per-folder and multi-folder synchronization
//! - The background scheduler and command service
//!
//! ## Modules
//!
//! - [`walker`] - Depth-first directory traversal into [`walker::FileRecord`]s
//! - [`diff`] - Selection of files that need uploading
//! - [`uploader`] - Throttled upload pipeline
//! - [`engine`] - Folder synchronizer and multi-folder orchestrator
//! - [`scheduler`] - One-shot backup timer
//! - [`observers`] - Event broadcast to any number of observers
//! - [`counter`] - File counting for the watch loop
//! - [`service`] - Background command handling
//! - [`runner`] - Runs a full synchronization and reports it as events
//! - [`filesystem`] - Local filesystem adapter for the directory port

pub mod counter;
pub mod diff;
pub mod engine;
pub mod filesystem;
pub mod observers;
pub mod runner;
pub mod scheduler;
pub mod service;
pub mod uploader;
pub mod walker;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

/// Errors that can occur during synchronization operations
///
/// Only [`SyncError::ConfigurationError`] (and the failures of a folder's
/// root directory) ever surface from a run. Per-file and per-subtree
/// failures are logged and counted instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A directory could not be read even after requesting access
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The remote metadata document could not be fetched
    #[error("Failed to fetch metadata for {remote}: {message}")]
    TransientFetchFailure { remote: String, message: String },

    /// A single file could not be transferred
    #[error("Failed to upload {path}: {message}")]
    UploadFailure { path: String, message: String },

    /// The remote metadata document could not be saved
    #[error("Failed to save metadata for {remote}: {message}")]
    MetadataSaveFailure { remote: String, message: String },

    /// Nothing can be synchronized with the current configuration
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The root of a folder could not be enumerated
    #[error("Failed to read directory {path}: {message}")]
    DirectoryUnreadable { path: String, message: String },

    /// A run was requested while another one is in progress
    #[error("A synchronization is already running")]
    AlreadyRunning,

    /// An I/O error occurred during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A domain-level error propagated from backupbox-core
    #[error("Domain error: {0}")]
    Domain(#[from] backupbox_core::domain::errors::DomainError),
}

/// Current time in epoch milliseconds
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
