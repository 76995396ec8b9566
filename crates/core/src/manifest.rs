//! Update manifest types: the record of one downloaded update.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A metadata value attached to a manifest (channel, branch, rollout
/// flags). Filters compare against these values exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    String(String),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

/// One file belonging to an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// Logical name, unique within its manifest.
    pub key: String,
    /// Hex SHA256 of the file contents, used to detect corruption.
    pub content_hash: String,
    /// Remote origin of the asset, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Path on disk once downloaded. An asset without a local path is
    /// missing and blocks launch of any manifest that references it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

impl AssetDescriptor {
    pub fn new(key: impl Into<String>, content_hash: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            content_hash: content_hash.into(),
            url: None,
            local_path: None,
        }
    }

    /// Mark the asset as downloaded to `path`.
    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }

    pub fn is_missing(&self) -> bool {
        self.local_path.is_none()
    }
}

/// Metadata describing one downloaded update: bundle, assets and
/// compatibility info. Immutable once persisted; the store fills in
/// asset local paths as downloads complete, nothing else changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateManifest {
    /// Unique id, assigned when the update was downloaded.
    pub id: Uuid,
    /// Ordering key for newest-wins selection. Informative, not
    /// wall-clock-guaranteed across channels.
    pub commit_time: DateTime<Utc>,
    /// Compatibility tag; must match one the host declares.
    pub runtime_version: String,
    /// The JS bundle asset.
    pub launch_asset: AssetDescriptor,
    /// Remaining assets, insertion order irrelevant.
    #[serde(default)]
    pub assets: Vec<AssetDescriptor>,
    /// Opaque key/value metadata consulted by filters.
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataValue>,
    /// Scope the update was published under, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_key: Option<String>,
    #[serde(default)]
    pub successful_launch_count: u32,
    #[serde(default)]
    pub failed_launch_count: u32,
}

impl UpdateManifest {
    pub fn new(
        id: Uuid,
        commit_time: DateTime<Utc>,
        runtime_version: impl Into<String>,
        launch_asset: AssetDescriptor,
    ) -> Self {
        Self {
            id,
            commit_time,
            runtime_version: runtime_version.into(),
            launch_asset,
            assets: Vec::new(),
            metadata: BTreeMap::new(),
            scope_key: None,
            successful_launch_count: 0,
            failed_launch_count: 0,
        }
    }

    pub fn with_asset(mut self, asset: AssetDescriptor) -> Self {
        self.assets.push(asset);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The launch asset followed by every other asset. Launch blocks on
    /// all of them being present.
    pub fn all_assets(&self) -> impl Iterator<Item = &AssetDescriptor> {
        std::iter::once(&self.launch_asset).chain(self.assets.iter())
    }
}
