//! Domain entities and business rules
//!
//! - Newtypes for validated names and paths
//! - Folder configuration and the ordered folder set
//! - Remote metadata document kept per backed-up folder
//! - Synchronization summaries
//! - The command/event protocol spoken with the background process
//! - Domain-specific error types

pub mod errors;
pub mod folder;
pub mod metadata;
pub mod newtypes;
pub mod protocol;
pub mod result;

// Re-export commonly used types
pub use errors::DomainError;
pub use folder::{FolderConfig, FolderSet};
pub use metadata::{FileMeta, RemoteMetadata};
pub use newtypes::{RelativePath, RemoteName};
pub use protocol::{Command, Event, EventResult};
pub use result::SyncResult;
