//! File access for operations: read-before-edit, atomic write-after-edit,
//! and preview buffering.
//!
//! In preview mode nothing reaches disk — written content lands in an
//! in-memory buffer that later reads observe, so multi-step operations
//! (extract, then rename) see their own intermediate state either way.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub(crate) struct FileStore {
    preview: bool,
    buffers: HashMap<PathBuf, String>,
}

impl FileStore {
    pub fn new(preview: bool) -> Self {
        Self {
            preview,
            buffers: HashMap::new(),
        }
    }

    /// Current content: the preview buffer when one exists, disk otherwise.
    pub async fn read(&self, path: &Path) -> Result<String> {
        if let Some(buffered) = self.buffers.get(path) {
            return Ok(buffered.clone());
        }
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))
    }

    /// Persist new content — to disk atomically, or to the preview buffer.
    pub async fn write(&mut self, path: &Path, content: String) -> Result<()> {
        if self.preview {
            self.buffers.insert(path.to_path_buf(), content);
            return Ok(());
        }
        typeshift_utils::atomic_write(path, content.as_bytes())
            .with_context(|| format!("writing {}", path.display()))?;
        self.buffers.insert(path.to_path_buf(), content);
        Ok(())
    }

    /// Number of distinct files written so far.
    pub fn files_touched(&self) -> usize {
        self.buffers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_preview_write_never_touches_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ts");
        tokio::fs::write(&path, "original").await.unwrap();

        let mut store = FileStore::new(true);
        store.write(&path, "changed".to_string()).await.unwrap();

        assert_eq!(store.read(&path).await.unwrap(), "changed");
        assert_eq!(
            tokio::fs::read_to_string(&path).await.unwrap(),
            "original",
            "preview must not persist"
        );
    }

    #[tokio::test]
    async fn test_non_preview_write_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ts");
        tokio::fs::write(&path, "original").await.unwrap();

        let mut store = FileStore::new(false);
        store.write(&path, "changed".to_string()).await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "changed");
        assert_eq!(store.files_touched(), 1);
    }

    #[tokio::test]
    async fn test_read_missing_file_names_the_path() {
        let store = FileStore::new(false);
        let err = store.read(Path::new("/no/such/file.ts")).await.unwrap_err();
        assert!(format!("{err:#}").contains("file.ts"));
    }
}
