//! Durable record of downloaded update manifests.
//!
//! # Storage layout
//!
//! ```text
//! <store_dir>/
//! ├── index.json      # ManifestIndex: ids + commit times, versioned
//! └── <id>.json       # One UpdateManifest per file
//! ```
//!
//! Writes are atomic (temp file + rename) to prevent corruption. Reads
//! re-load from disk on every call, so each read observes a consistent
//! snapshot without shared mutable state.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::manifest::UpdateManifest;

/// Current on-disk index schema version.
pub const MANIFEST_INDEX_VERSION: u32 = 1;

/// Index file name.
const INDEX_FILENAME: &str = "index.json";

/// Read path used by selection and launch.
///
/// An implementation must either be an immutable snapshot per call or
/// internally synchronized; `FileManifestStore` re-reads files on every
/// call and satisfies this by construction.
pub trait ManifestStore {
    /// Every persisted manifest, in no particular order. An empty store
    /// is a valid result (no updates downloaded yet), not an error.
    fn all_manifests(&self) -> Result<Vec<UpdateManifest>, StoreError>;

    /// Local path of one of the manifest's assets, if downloaded.
    fn asset_local_path(
        &self,
        manifest: &UpdateManifest,
        asset_key: &str,
    ) -> Result<Option<PathBuf>, StoreError>;
}

/// One line in the store index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestIndexEntry {
    pub id: Uuid,
    pub commit_time: DateTime<Utc>,
    pub runtime_version: String,
}

/// The store index: which manifests exist, without their full contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestIndex {
    pub version: u32,
    pub manifests: Vec<ManifestIndexEntry>,
}

impl ManifestIndex {
    pub fn new() -> Self {
        Self {
            version: MANIFEST_INDEX_VERSION,
            manifests: Vec::new(),
        }
    }

    /// Add an entry, replacing any previous entry with the same id.
    pub fn add(&mut self, entry: ManifestIndexEntry) {
        self.manifests.retain(|e| e.id != entry.id);
        self.manifests.push(entry);
    }

    pub fn remove(&mut self, id: Uuid) {
        self.manifests.retain(|e| e.id != id);
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }
}

impl Default for ManifestIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON-file-backed manifest store.
///
/// The read path serves selection and launch; the write path belongs to
/// the external downloader, which persists a manifest once its files are
/// fetched and fills in asset paths as they land.
#[derive(Debug, Clone)]
pub struct FileManifestStore {
    base_path: PathBuf,
}

impl FileManifestStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn index_path(&self) -> PathBuf {
        self.base_path.join(INDEX_FILENAME)
    }

    fn manifest_path(&self, id: Uuid) -> PathBuf {
        self.base_path.join(format!("{}.json", id))
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_path).map_err(StoreError::CreateDir)
    }

    /// Load the index. A missing file is an empty store, not an error.
    pub fn load_index(&self) -> Result<ManifestIndex, StoreError> {
        let content = match fs::read_to_string(self.index_path()) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ManifestIndex::new()),
            Err(e) => return Err(StoreError::Read(e)),
        };

        let index: ManifestIndex = serde_json::from_str(&content).map_err(StoreError::Parse)?;
        if index.version != MANIFEST_INDEX_VERSION {
            return Err(StoreError::UnsupportedVersion(index.version));
        }
        Ok(index)
    }

    fn save_index(&self, index: &ManifestIndex) -> Result<(), StoreError> {
        self.ensure_dir()?;
        self.write_atomic(&self.index_path(), index)
    }

    /// Serialize `value` to `path` via a temp file and rename.
    fn write_atomic<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(value).map_err(StoreError::Serialize)?;
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content).map_err(StoreError::Write)?;
        fs::rename(&temp_path, path).map_err(StoreError::Write)?;
        Ok(())
    }

    /// Load a single manifest by id.
    pub fn load_manifest(&self, id: Uuid) -> Result<UpdateManifest, StoreError> {
        let content = fs::read_to_string(self.manifest_path(id)).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StoreError::NotFound(id)
            } else {
                StoreError::Read(e)
            }
        })?;

        serde_json::from_str(&content).map_err(StoreError::Parse)
    }

    /// Persist a manifest and record it in the index. Saving the same id
    /// again replaces the previous record.
    pub fn save_manifest(&self, manifest: &UpdateManifest) -> Result<(), StoreError> {
        self.ensure_dir()?;
        self.write_atomic(&self.manifest_path(manifest.id), manifest)?;

        let mut index = self.load_index()?;
        index.add(ManifestIndexEntry {
            id: manifest.id,
            commit_time: manifest.commit_time,
            runtime_version: manifest.runtime_version.clone(),
        });
        self.save_index(&index)?;

        debug!("saved manifest {} to {}", manifest.id, self.base_path.display());
        Ok(())
    }

    /// Remove a manifest and its index entry. Removing an id that does
    /// not exist succeeds. Hook for an external pruning policy.
    pub fn remove_manifest(&self, id: Uuid) -> Result<(), StoreError> {
        match fs::remove_file(self.manifest_path(id)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::Write(e)),
        }

        let mut index = self.load_index()?;
        index.remove(id);
        self.save_index(&index)
    }

    /// Record where an asset of a stored manifest was downloaded to.
    pub fn set_asset_local_path(
        &self,
        id: Uuid,
        asset_key: &str,
        local_path: &Path,
    ) -> Result<(), StoreError> {
        self.update_manifest(id, |manifest| {
            if manifest.launch_asset.key == asset_key {
                manifest.launch_asset.local_path = Some(local_path.to_path_buf());
            }
            for asset in &mut manifest.assets {
                if asset.key == asset_key {
                    asset.local_path = Some(local_path.to_path_buf());
                }
            }
        })
    }

    pub fn increment_successful_launch_count(&self, id: Uuid) -> Result<(), StoreError> {
        self.update_manifest(id, |m| m.successful_launch_count += 1)
    }

    pub fn increment_failed_launch_count(&self, id: Uuid) -> Result<(), StoreError> {
        self.update_manifest(id, |m| m.failed_launch_count += 1)
    }

    fn update_manifest(
        &self,
        id: Uuid,
        mutate: impl FnOnce(&mut UpdateManifest),
    ) -> Result<(), StoreError> {
        let mut manifest = self.load_manifest(id)?;
        mutate(&mut manifest);
        self.write_atomic(&self.manifest_path(id), &manifest)
    }
}

impl ManifestStore for FileManifestStore {
    fn all_manifests(&self) -> Result<Vec<UpdateManifest>, StoreError> {
        let index = self.load_index()?;
        index
            .manifests
            .iter()
            .map(|entry| self.load_manifest(entry.id))
            .collect()
    }

    fn asset_local_path(
        &self,
        manifest: &UpdateManifest,
        asset_key: &str,
    ) -> Result<Option<PathBuf>, StoreError> {
        // Prefer the stored copy: the downloader may have recorded paths
        // after the caller's manifest was read.
        let stored = match self.load_manifest(manifest.id) {
            Ok(stored) => stored,
            Err(StoreError::NotFound(_)) => manifest.clone(),
            Err(e) => return Err(e),
        };

        Ok(stored
            .all_assets()
            .find(|asset| asset.key == asset_key)
            .and_then(|asset| asset.local_path.clone()))
    }
}
