//! Single-slot store for the last delivered text artifact.
//! Raw text on disk, read once at startup to seed change detection.

use std::path::{Path, PathBuf};

use watchbell_core::{Result, WatchbellError};

pub struct ArtifactStore {
    path: PathBuf,
    current: Option<String>,
    /// Memory is ahead of disk (last write failed).
    dirty: bool,
}

impl ArtifactStore {
    /// Open the slot at `path`. A missing or unreadable file means "nothing
    /// delivered yet".
    pub fn open(path: &Path) -> Self {
        let current = match Self::read(path) {
            Ok(current) => current,
            Err(e) => {
                tracing::warn!("⚠️ Failed to read last artifact, starting empty: {e}");
                None
            }
        };
        if current.is_some() {
            tracing::info!("📄 Loaded last artifact from {}", path.display());
        }
        Self {
            path: path.to_path_buf(),
            current,
            dirty: false,
        }
    }

    /// The last delivered artifact.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Read what is currently on disk.
    pub fn load(&self) -> Result<Option<String>> {
        Self::read(&self.path)
    }

    /// Replace the slot and write it through. On a write error the new value
    /// is still held in memory and the next [`flush`](Self::flush) retries.
    pub fn record(&mut self, artifact: String) -> Result<()> {
        self.current = Some(artifact);
        self.dirty = true;
        self.flush()
    }

    /// Retry a pending write, if any.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let Some(current) = &self.current else {
            self.dirty = false;
            return Ok(());
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| WatchbellError::Persistence(format!("Create dir error: {e}")))?;
        }
        std::fs::write(&self.path, current)
            .map_err(|e| WatchbellError::Persistence(format!("Write error: {e}")))?;
        self.dirty = false;
        tracing::debug!("💾 Saved last artifact to {}", self.path.display());
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn read(path: &Path) -> Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(path)
            .map(Some)
            .map_err(|e| WatchbellError::Persistence(format!("Read error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(&dir.path().join("message.txt"));
        assert_eq!(store.current(), None);
    }

    #[test]
    fn test_record_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("message.txt");
        let text = "Status: Go for launch\nNET: 2024-06-06 12:50 UTC";
        {
            let mut store = ArtifactStore::open(&path);
            store.record(text.to_string()).unwrap();
            assert!(!store.is_dirty());
        }
        let reopened = ArtifactStore::open(&path);
        assert_eq!(reopened.current(), Some(text));
    }

    #[test]
    fn test_failed_write_keeps_memory_and_retries() {
        let dir = tempfile::tempdir().unwrap();
        // Parent is a regular file, so creating the directory fails.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let mut store = ArtifactStore::open(&blocker.join("message.txt"));

        assert!(matches!(
            store.record("Y".into()),
            Err(WatchbellError::Persistence(_))
        ));
        assert_eq!(store.current(), Some("Y"));
        assert!(store.is_dirty());

        std::fs::remove_file(&blocker).unwrap();
        store.flush().unwrap();
        assert!(!store.is_dirty());
        assert_eq!(store.load().unwrap().as_deref(), Some("Y"));
    }
}
