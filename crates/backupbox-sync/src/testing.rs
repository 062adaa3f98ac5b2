//! In-memory port implementations shared by the unit tests

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use backupbox_core::domain::{RelativePath, RemoteMetadata, RemoteName};
use backupbox_core::ports::{
    DirEntry, EntryKind, FileInfo, IDirectory, IDirectorySource, IFileHandle, IRemoteStore,
    Permission, UploadBody,
};

use crate::walker::FileRecord;

// ============================================================================
// Files and directories
// ============================================================================

pub struct MemoryFile {
    pub content: Vec<u8>,
    pub size: u64,
    pub mtime: i64,
    pub mime_type: String,
    pub fail_info: bool,
    pub fail_read: bool,
}

impl MemoryFile {
    pub fn new(name: &str, content: impl Into<Vec<u8>>, mtime: i64) -> Self {
        let content = content.into();
        Self {
            size: content.len() as u64,
            content,
            mtime,
            mime_type: mime_guess::from_path(name)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
            fail_info: false,
            fail_read: false,
        }
    }
}

#[async_trait::async_trait]
impl IFileHandle for MemoryFile {
    async fn info(&self) -> anyhow::Result<FileInfo> {
        if self.fail_info {
            anyhow::bail!("file vanished");
        }
        Ok(FileInfo {
            size: self.size,
            mtime: self.mtime,
            mime_type: self.mime_type.clone(),
        })
    }

    async fn read(&self) -> anyhow::Result<Vec<u8>> {
        if self.fail_read {
            anyhow::bail!("read error");
        }
        Ok(self.content.clone())
    }
}

enum Node {
    File(Arc<MemoryFile>),
    Dir(Arc<MemoryDirectory>),
}

pub struct MemoryDirectory {
    name: String,
    query: Permission,
    request: Permission,
    fail_entries: bool,
    children: Vec<(String, Node)>,
    requests: Mutex<u32>,
}

impl MemoryDirectory {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            query: Permission::Granted,
            request: Permission::Granted,
            fail_entries: false,
            children: Vec::new(),
            requests: Mutex::new(0),
        }
    }

    pub fn file(self, name: &str, content: impl Into<Vec<u8>>, mtime: i64) -> Self {
        let file = MemoryFile::new(name, content, mtime);
        self.file_handle(name, file)
    }

    pub fn file_handle(mut self, name: &str, file: MemoryFile) -> Self {
        self.children
            .push((name.to_string(), Node::File(Arc::new(file))));
        self
    }

    pub fn dir(mut self, child: MemoryDirectory) -> Self {
        self.children
            .push((child.name.clone(), Node::Dir(Arc::new(child))));
        self
    }

    /// Not readable, and asking does not help
    pub fn denied(mut self) -> Self {
        self.query = Permission::Denied;
        self.request = Permission::Denied;
        self
    }

    /// Not readable until asked once
    pub fn needs_prompt(mut self) -> Self {
        self.query = Permission::Prompt;
        self.request = Permission::Granted;
        self
    }

    pub fn failing_entries(mut self) -> Self {
        self.fail_entries = true;
        self
    }

    pub fn permission_requests(&self) -> u32 {
        *self.requests.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl IDirectory for MemoryDirectory {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn query_permission(&self) -> anyhow::Result<Permission> {
        Ok(self.query)
    }

    async fn request_permission(&self) -> anyhow::Result<Permission> {
        *self.requests.lock().unwrap() += 1;
        Ok(self.request)
    }

    async fn entries(&self) -> anyhow::Result<Vec<DirEntry>> {
        if self.fail_entries {
            anyhow::bail!("enumeration failed");
        }
        Ok(self
            .children
            .iter()
            .map(|(name, node)| DirEntry {
                name: name.clone(),
                kind: match node {
                    Node::File(f) => EntryKind::File(f.clone()),
                    Node::Dir(d) => EntryKind::Directory(d.clone()),
                },
            })
            .collect())
    }
}

/// Resolves paths to prepared in-memory trees; unknown paths are denied
#[derive(Default)]
pub struct MemorySource {
    dirs: HashMap<PathBuf, Arc<MemoryDirectory>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, dir: MemoryDirectory) -> Self {
        self.dirs.insert(PathBuf::from(path), Arc::new(dir));
        self
    }

    pub fn directory(&self, path: &str) -> Option<Arc<MemoryDirectory>> {
        self.dirs.get(Path::new(path)).cloned()
    }
}

impl IDirectorySource for MemorySource {
    fn open(&self, path: &Path) -> Arc<dyn IDirectory> {
        match self.dirs.get(path) {
            Some(dir) => dir.clone(),
            None => Arc::new(MemoryDirectory::new("missing").denied()),
        }
    }
}

pub fn record(path: &str, size: u64, mtime: i64) -> FileRecord {
    let mut file = MemoryFile::new(path, Vec::new(), mtime);
    file.size = size;
    FileRecord {
        relative_path: RelativePath::new(path).unwrap(),
        size,
        mtime,
        mime_type: file.mime_type.clone(),
        content: Arc::new(file),
    }
}

// ============================================================================
// Remote store
// ============================================================================

#[derive(Default)]
pub struct MemoryStore {
    pub metadata: Mutex<HashMap<String, RemoteMetadata>>,
    pub uploads: Mutex<Vec<(String, String, UploadBody)>>,
    pub saves: Mutex<u32>,
    pub failing_paths: HashSet<String>,
    pub fail_fetch: bool,
    pub fail_save: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, path: &str) -> Self {
        self.failing_paths.insert(path.to_string());
        self
    }

    pub fn saved(&self, remote: &str) -> Option<RemoteMetadata> {
        self.metadata.lock().unwrap().get(remote).cloned()
    }

    pub fn uploaded_paths(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(_, path, _)| path.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl IRemoteStore for MemoryStore {
    async fn fetch_metadata(
        &self,
        remote_name: &RemoteName,
    ) -> anyhow::Result<Option<RemoteMetadata>> {
        if self.fail_fetch {
            anyhow::bail!("connection refused");
        }
        Ok(self.saved(remote_name.as_str()))
    }

    async fn save_metadata(
        &self,
        remote_name: &RemoteName,
        metadata: &RemoteMetadata,
    ) -> anyhow::Result<()> {
        *self.saves.lock().unwrap() += 1;
        if self.fail_save {
            anyhow::bail!("HTTP 503");
        }
        self.metadata
            .lock()
            .unwrap()
            .insert(remote_name.to_string(), metadata.clone());
        Ok(())
    }

    async fn upload_file(
        &self,
        remote_name: &RemoteName,
        path: &RelativePath,
        body: UploadBody,
    ) -> anyhow::Result<()> {
        if self.failing_paths.contains(path.as_str()) {
            anyhow::bail!("HTTP 500");
        }
        self.uploads
            .lock()
            .unwrap()
            .push((remote_name.to_string(), path.to_string(), body));
        Ok(())
    }
}
