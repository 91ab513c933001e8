//! File-backed subscriber registry.
//!
//! Subscribers are saved as a JSON array of chat ids. Writes are
//! read-modify-compare-write: the file is re-read and only rewritten when it
//! differs from the in-memory set.
//!
//! Known constraint: one process owns the file. Two daemons pointed at the
//! same file will overwrite each other's changes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use watchbell_core::{Result, SubscriberId, WatchbellError};

/// Durable set of subscriber ids.
pub struct SubscriberRegistry {
    path: PathBuf,
    members: BTreeSet<SubscriberId>,
}

impl SubscriberRegistry {
    /// Open the registry at `path`, seeding memory from disk.
    pub fn open(path: &Path) -> Self {
        let mut registry = Self {
            path: path.to_path_buf(),
            members: BTreeSet::new(),
        };
        registry.members = match registry.load() {
            Ok(members) => {
                tracing::info!(
                    "👥 Loaded {} subscribed users from {}",
                    members.len(),
                    path.display()
                );
                members
            }
            Err(e) => {
                tracing::warn!("⚠️ Failed to load subscribers, starting fresh: {e}");
                BTreeSet::new()
            }
        };
        registry
    }

    /// Read the set currently on disk. A missing file is an empty set.
    pub fn load(&self) -> Result<BTreeSet<SubscriberId>> {
        if !self.path.exists() {
            return Ok(BTreeSet::new());
        }
        let json = std::fs::read_to_string(&self.path)
            .map_err(|e| WatchbellError::Persistence(format!("Read error: {e}")))?;
        let ids: Vec<SubscriberId> = serde_json::from_str(&json)
            .map_err(|e| WatchbellError::Persistence(format!("Parse error: {e}")))?;
        Ok(ids.into_iter().collect())
    }

    /// Write the in-memory set if it differs from disk. Returns whether a
    /// write happened.
    pub fn save(&self) -> Result<bool> {
        // An unreadable file counts as different so it gets repaired.
        let on_disk = self.load().ok();
        if on_disk.as_ref() == Some(&self.members) && self.path.exists() {
            tracing::debug!("No subscriber changes detected, skipping save");
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| WatchbellError::Persistence(format!("Create dir error: {e}")))?;
        }
        let ids: Vec<SubscriberId> = self.members.iter().copied().collect();
        let json = serde_json::to_string(&ids)?;
        std::fs::write(&self.path, json)
            .map_err(|e| WatchbellError::Persistence(format!("Write error: {e}")))?;
        tracing::debug!("💾 Saved {} subscribed users to {}", ids.len(), self.path.display());
        Ok(true)
    }

    /// Add a subscriber. Returns `true` if it was not already present.
    pub fn add(&mut self, id: SubscriberId) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        self.persist();
        true
    }

    /// Remove a subscriber. Returns `true` if it was present.
    pub fn remove(&mut self, id: SubscriberId) -> bool {
        if !self.members.remove(&id) {
            return false;
        }
        self.persist();
        true
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Copy of the current members, for fan-out.
    pub fn snapshot(&self) -> Vec<SubscriberId> {
        self.members.iter().copied().collect()
    }

    /// Memory stays authoritative when the write fails; the next save retries.
    fn persist(&self) {
        if let Err(e) = self.save() {
            tracing::warn!("⚠️ Failed to save subscribers: {e}");
        }
    }
}
