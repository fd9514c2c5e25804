//! Snapshot Disk Store
//!
//! Layout: `{cache_dir}/snapshots/{name}.json` for named snapshots,
//! `{cache_dir}/snapshots/{id}.json` otherwise. Loading verifies the
//! checksum and warns (not fails) on mismatch, so a corrupted baseline
//! can still be compared against.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::types::{MapError, Result};

use super::{Snapshot, SnapshotMetadata};

pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Store rooted at `{cache_dir}/snapshots`
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: cache_dir.as_ref().join("snapshots"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, file_stem: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem))
    }

    /// Persist a snapshot under its name, or its id when unnamed
    pub fn save(&self, snapshot: &Snapshot) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let stem = snapshot
            .metadata
            .name
            .as_deref()
            .unwrap_or(&snapshot.metadata.id);
        let path = self.path_for(stem);
        fs::write(&path, serde_json::to_string_pretty(snapshot)?)?;
        info!("Saved snapshot {}", path.display());
        Ok(path)
    }

    /// Load by name or id. A checksum mismatch logs a warning but still
    /// returns the snapshot.
    pub fn load(&self, id_or_name: &str) -> Result<Snapshot> {
        let path = self.path_for(id_or_name);
        if !path.exists() {
            return Err(MapError::SnapshotNotFound(id_or_name.to_string()));
        }
        self.load_path(&path)
    }

    fn load_path(&self, path: &Path) -> Result<Snapshot> {
        let content = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)
            .map_err(|e| MapError::Snapshot(format!("{}: {}", path.display(), e)))?;

        match snapshot.verify_checksum() {
            Ok(true) => debug!("Checksum verified for {}", path.display()),
            Ok(false) => warn!(
                "Checksum mismatch in {}; the snapshot may be corrupted",
                path.display()
            ),
            Err(e) => warn!("Could not verify checksum for {}: {}", path.display(), e),
        }
        Ok(snapshot)
    }

    /// Metadata of every stored snapshot, oldest first
    pub fn list(&self) -> Result<Vec<SnapshotMetadata>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_none_or(|e| e != "json") {
                continue;
            }
            match self.load_path(&path) {
                Ok(snapshot) => entries.push(snapshot.metadata),
                Err(e) => warn!("Skipping unreadable snapshot {}: {}", path.display(), e),
            }
        }
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(entries)
    }

    /// Most recent snapshot, if any
    pub fn load_latest(&self) -> Result<Option<Snapshot>> {
        let Some(latest) = self.list()?.into_iter().next_back() else {
            return Ok(None);
        };
        let stem = latest.name.as_deref().unwrap_or(&latest.id);
        Ok(Some(self.load(stem)?))
    }

    /// Delete the oldest unnamed snapshots beyond `keep`. Named snapshots
    /// are never pruned. Returns the ids that were removed.
    pub fn prune(&self, keep: usize) -> Result<Vec<String>> {
        let unnamed: Vec<SnapshotMetadata> = self
            .list()?
            .into_iter()
            .filter(|m| m.name.is_none())
            .collect();

        let excess = unnamed.len().saturating_sub(keep);
        let mut removed = Vec::new();
        for metadata in unnamed.into_iter().take(excess) {
            let path = self.path_for(&metadata.id);
            fs::remove_file(&path)?;
            info!("Pruned snapshot {}", metadata.id);
            removed.push(metadata.id);
        }
        Ok(removed)
    }
}
