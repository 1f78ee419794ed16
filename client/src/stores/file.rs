//! File-backed key-value storage.

use crate::error::StorageError;
use crate::providers::KeyValueStorage;
use std::collections::BTreeMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Key-value storage kept as one JSON object in a file
///
/// Every call reads the whole file; writes rewrite it. A missing file is an
/// empty store. Parent directories are created on first write. A file that
/// is not a JSON object fails reads with `Corrupt`, and the next write
/// replaces it.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage backed by the file at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).map_err(|e| StorageError::Corrupt {
            key: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Entries to rewrite. A corrupt file is discarded rather than blocking
    /// every later write.
    async fn writable_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match self.read_entries().await {
            Err(error @ StorageError::Corrupt { .. }) => {
                tracing::warn!(%error, "Overwriting corrupt storage file");
                Ok(BTreeMap::new())
            },
            entries => entries,
        }
    }

    async fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Serialize(e.to_string()))?;
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send {
        async move {
            let mut entries = self.read_entries().await?;
            Ok(entries.remove(key))
        }
    }

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        async move {
            let mut entries = self.writable_entries().await?;
            entries.insert(key.to_string(), value.to_string());
            self.write_entries(&entries).await?;
            tracing::trace!(key, path = %self.path.display(), "Stored value");
            Ok(())
        }
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        async move {
            let mut entries = match self.read_entries().await {
                Err(error @ StorageError::Corrupt { .. }) => {
                    tracing::warn!(%error, "Overwriting corrupt storage file");
                    self.write_entries(&BTreeMap::new()).await?;
                    return Ok(());
                },
                entries => entries?,
            };
            if entries.remove(key).is_some() {
                self.write_entries(&entries).await?;
                tracing::trace!(key, path = %self.path.display(), "Removed value");
            }
            Ok(())
        }
    }
}
