//! Folder configuration
//!
//! A [`FolderConfig`] pairs a local directory with the remote name it is
//! backed up under. The ordered [`FolderSet`] is the unit that gets
//! persisted; its order is the order folders are synchronized in.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::RemoteName;

/// One local folder selected for backup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderConfig {
    /// Local directory to mirror
    pub local_path: PathBuf,
    /// Name of the folder on the remote store
    pub remote_name: RemoteName,
}

impl FolderConfig {
    pub fn new(local_path: impl Into<PathBuf>, remote_name: RemoteName) -> Self {
        Self {
            local_path: local_path.into(),
            remote_name,
        }
    }

    /// Display name of the local folder (its last path component)
    pub fn local_name(&self) -> String {
        self.local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.local_path.display().to_string())
    }
}

/// Ordered set of folders, unique by remote name and by local path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderSet(Vec<FolderConfig>);

impl FolderSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a folder, rejecting collisions
    ///
    /// # Errors
    /// - `DomainError::DuplicateFolder` if the local path is already present
    /// - `DomainError::DuplicateRemoteName` if the remote name is taken
    pub fn add(&mut self, folder: FolderConfig) -> Result<(), DomainError> {
        if self.0.iter().any(|f| f.local_path == folder.local_path) {
            return Err(DomainError::DuplicateFolder(
                folder.local_path.display().to_string(),
            ));
        }
        if self.0.iter().any(|f| f.remote_name == folder.remote_name) {
            return Err(DomainError::DuplicateRemoteName(
                folder.remote_name.to_string(),
            ));
        }
        self.0.push(folder);
        Ok(())
    }

    /// Removes the folder with the given remote name
    ///
    /// # Errors
    /// Returns `DomainError::FolderNotFound` if no folder uses that name
    pub fn remove(&mut self, remote_name: &RemoteName) -> Result<FolderConfig, DomainError> {
        let index = self
            .0
            .iter()
            .position(|f| &f.remote_name == remote_name)
            .ok_or_else(|| DomainError::FolderNotFound(remote_name.to_string()))?;
        Ok(self.0.remove(index))
    }

    pub fn get(&self, remote_name: &RemoteName) -> Option<&FolderConfig> {
        self.0.iter().find(|f| &f.remote_name == remote_name)
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.0.iter().any(|f| f.local_path == path)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FolderConfig> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[FolderConfig] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a FolderSet {
    type Item = &'a FolderConfig;
    type IntoIter = std::slice::Iter<'a, FolderConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
