//! Local directory port (driven/secondary port)
//!
//! A directory is a capability: before it can be enumerated the caller
//! checks whether read access is granted and, if not, may ask for it once.
//! Entries are resolved into fresh handles; nothing is cached between walks.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because filesystem errors are adapter-specific.
//! - Handles are reference-counted trait objects so a walked file can be
//!   read later by the upload pipeline without re-resolving it.

use std::path::Path;
use std::sync::Arc;

// ============================================================================
// Permission
// ============================================================================

/// Read capability on a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// Not decided yet; a request may grant it
    Prompt,
}

impl Permission {
    pub fn is_granted(self) -> bool {
        self == Permission::Granted
    }
}

// ============================================================================
// Entries
// ============================================================================

/// One child of a directory
pub struct DirEntry {
    /// Entry name (a single path segment)
    pub name: String,
    pub kind: EntryKind,
}

/// What a directory entry resolves to
pub enum EntryKind {
    File(Arc<dyn IFileHandle>),
    Directory(Arc<dyn IDirectory>),
}

impl std::fmt::Debug for DirEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            EntryKind::File(_) => "file",
            EntryKind::Directory(_) => "directory",
        };
        f.debug_struct("DirEntry")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

/// File attributes read when a handle is materialized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub size: u64,
    /// Modification time in epoch milliseconds
    pub mtime: i64,
    pub mime_type: String,
}

// ============================================================================
// Traits
// ============================================================================

/// A readable file inside a directory tree
#[async_trait::async_trait]
pub trait IFileHandle: Send + Sync {
    /// Read size, modification time and MIME type
    async fn info(&self) -> anyhow::Result<FileInfo>;

    /// Read the whole content
    async fn read(&self) -> anyhow::Result<Vec<u8>>;
}

/// A directory tree that may require permission before it can be read
#[async_trait::async_trait]
pub trait IDirectory: Send + Sync {
    /// Display name of the directory
    fn name(&self) -> String;

    /// Current read capability, without prompting
    async fn query_permission(&self) -> anyhow::Result<Permission>;

    /// Ask for read capability
    async fn request_permission(&self) -> anyhow::Result<Permission>;

    /// List the immediate children
    async fn entries(&self) -> anyhow::Result<Vec<DirEntry>>;
}

/// Opens the configured folders
pub trait IDirectorySource: Send + Sync {
    fn open(&self, path: &Path) -> Arc<dyn IDirectory>;
}
