//! Host configuration for assembling the updates coordinator.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coordinator::UpdatesCoordinator;
use crate::error::ConfigError;
use crate::launcher::EmbeddedBundle;
use crate::policy::{Newest, NewestFilterAware, SelectionPolicy, SingleUpdate};
use crate::store::FileManifestStore;

/// Which selection policy the host wants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PolicyConfig {
    #[default]
    NewestFilterAware,
    /// Filter-blind newest-wins, for hosts predating filter support.
    Newest,
    SingleUpdate {
        id: Uuid,
    },
}

/// Host configuration, usually loaded from a JSON file.
///
/// Declares where the manifest store lives, which runtime versions the
/// running host is compatible with, and the embedded fallback bundle
/// shipped inside the host binary (if any).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatesConfig {
    pub store_dir: PathBuf,
    pub runtime_versions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedded_bundle: Option<EmbeddedBundle>,
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl UpdatesConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(ConfigError::Read(e)),
        };

        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Instantiate the configured selection policy.
    pub fn selection_policy(&self) -> Box<dyn SelectionPolicy> {
        match &self.policy {
            PolicyConfig::NewestFilterAware => {
                Box::new(NewestFilterAware::new(self.runtime_versions.clone()))
            }
            PolicyConfig::Newest => Box::new(Newest::new(self.runtime_versions.clone())),
            PolicyConfig::SingleUpdate { id } => Box::new(SingleUpdate::new(*id)),
        }
    }

    /// Wire up a coordinator over the configured store and policy.
    pub fn build_coordinator(&self) -> UpdatesCoordinator {
        UpdatesCoordinator::new(
            Box::new(FileManifestStore::new(self.store_dir.clone())),
            self.selection_policy(),
            self.embedded_bundle.clone(),
        )
    }
}
