//! Domain error types
//!
//! Validation failures raised while building folder configurations,
//! remote names and relative paths.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid relative path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Remote folder name is empty after sanitization
    #[error("Invalid remote name: {0}")]
    InvalidRemoteName(String),

    /// Another folder already uses this remote name
    #[error("Remote name \"{0}\" is already in use")]
    DuplicateRemoteName(String),

    /// The same local folder was added twice
    #[error("Folder \"{0}\" is already in the list")]
    DuplicateFolder(String),

    /// No folder matches the given remote name
    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
