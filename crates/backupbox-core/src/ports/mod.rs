//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the synchronization
//! engine depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStore`] - Remote object store holding metadata documents and files
//! - [`IDirectory`] - A readable local directory tree with a permission model
//! - [`IDirectorySource`] - Resolves a configured folder path into an [`IDirectory`]

pub mod directory;
pub mod remote_store;

pub use directory::{
    DirEntry, EntryKind, FileInfo, IDirectory, IDirectorySource, IFileHandle, Permission,
};
pub use remote_store::{is_text_mime, IRemoteStore, UploadBody};
