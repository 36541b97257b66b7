//! In-memory storage backend for testing.

use super::FileInfoStream;
use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::models::FileInfo;
use crate::path::validate as validate_path;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use time::UtcDateTime;
use tokio::sync::RwLock;

/// How the mock treats writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum WriteMode {
    #[default]
    Normal,
    /// Every write fails with `PermissionDenied` and stores nothing.
    Rejected,
    /// Writes "succeed" but only the first half of the data is kept.
    Torn,
}

/// In-memory storage backend for testing.
///
/// Files live in a `HashMap` behind a [`RwLock`]. Writes can be made to fail
/// or to silently store truncated data, and deletes can be made to fail, so
/// callers can test their cleanup paths without a real filesystem.
///
/// # Examples
///
/// ```
/// use hoard_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([("automatic/one.json", b"{}")]);
/// assert_eq!(backend.stat(Path::new("automatic/one.json")).await?.size, 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockBackend {
    storage: RwLock<HashMap<PathBuf, (UtcDateTime, Vec<u8>)>>,
    write_mode: WriteMode,
    /// Paths whose deletes fail with `PermissionDenied`, keeping the file.
    undeletable: HashSet<PathBuf>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation: broken test setup should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let now = UtcDateTime::now();
        let mut map = HashMap::new();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            map.insert(validated, (now, data.into()));
        }
        Self { storage: RwLock::new(map), ..Self::default() }
    }

    /// Make every subsequent write fail.
    pub fn rejecting_writes(mut self) -> Self {
        self.write_mode = WriteMode::Rejected;
        self
    }

    /// Make every subsequent write store only half of its data.
    pub fn tearing_writes(mut self) -> Self {
        self.write_mode = WriteMode::Torn;
        self
    }

    /// Make every delete of `path` fail.
    pub fn rejecting_delete(mut self, path: impl Into<PathBuf>) -> Self {
        self.undeletable.insert(path.into());
        self
    }

    /// Sorted list of every stored path.
    pub async fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.storage.read().await.keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let validated_prefix = match prefix.map(validate_path).transpose() {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };
        Box::pin(stream! {
            // Copy out under the read lock so it isn't held across yields.
            let entries: Vec<FileInfo> = {
                let guard = self.storage.read().await;
                guard
                    .iter()
                    .filter(|(path, _)| validated_prefix.as_ref().is_none_or(|pfx| path.starts_with(pfx)))
                    .map(|(path, (modified, data))| FileInfo::new(path.clone(), data.len() as u64, *modified))
                    .collect()
            };
            for info in entries {
                yield Ok(info);
            }
        })
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let guard = self.storage.read().await;
        let (_, data) = guard.get(&path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.clone())))?;
        Ok(data.clone())
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        let stored = match self.write_mode {
            WriteMode::Normal => data.to_vec(),
            WriteMode::Rejected => exn::bail!(ErrorKind::PermissionDenied(path)),
            WriteMode::Torn => data[..data.len() / 2].to_vec(),
        };
        self.storage.write().await.insert(path, (UtcDateTime::now(), stored));
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        if self.undeletable.contains(&path) {
            exn::bail!(ErrorKind::PermissionDenied(path));
        }
        self.storage.write().await.remove(&path).map(|_| ()).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        let path = validate_path(path)?;
        let guard = self.storage.read().await;
        let (modified, data) = guard.get(&path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.clone())))?;
        Ok(FileInfo::new(path.clone(), data.len() as u64, *modified))
    }
}
