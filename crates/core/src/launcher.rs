//! Launch plan resolution: turn a selected manifest into concrete paths.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::LaunchError;
use crate::manifest::UpdateManifest;
use crate::store::ManifestStore;

/// Host-bundled fallback: the bundle shipped inside the binary, used
/// when no downloaded update qualifies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedBundle {
    pub bundle_path: PathBuf,
    #[serde(default)]
    pub asset_files: BTreeMap<String, PathBuf>,
}

/// The resolved set of paths needed to start the runtime.
///
/// Produced fresh per launch attempt and never partially populated: a
/// plan either references a fully present update or the embedded bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchPlan {
    /// The update being launched, or `None` for the embedded bundle.
    pub launched_manifest: Option<UpdateManifest>,
    /// Resolved path of the JS bundle.
    pub launch_asset_url: PathBuf,
    /// Asset key to resolved local path, launch asset included.
    pub asset_files: BTreeMap<String, PathBuf>,
    pub is_using_embedded_assets: bool,
}

/// Resolves a selected manifest into a [`LaunchPlan`], refusing to
/// launch an update whose assets are not fully present on disk.
#[derive(Debug, Clone)]
pub struct Launcher {
    embedded: Option<EmbeddedBundle>,
}

impl Launcher {
    pub fn new(embedded: Option<EmbeddedBundle>) -> Self {
        Self { embedded }
    }

    pub fn has_embedded_bundle(&self) -> bool {
        self.embedded.is_some()
    }

    /// Resolve `selected` against the store, or fall back to the
    /// embedded bundle when nothing was selected.
    pub fn launch(
        &self,
        selected: Option<&UpdateManifest>,
        store: &dyn ManifestStore,
    ) -> Result<LaunchPlan, LaunchError> {
        match selected {
            Some(manifest) => self.launch_update(manifest, store),
            None => self.launch_embedded(),
        }
    }

    fn launch_embedded(&self) -> Result<LaunchPlan, LaunchError> {
        let embedded = self.embedded.as_ref().ok_or(LaunchError::NoEmbeddedBundle)?;
        info!(
            "launching embedded bundle at {}",
            embedded.bundle_path.display()
        );

        Ok(LaunchPlan {
            launched_manifest: None,
            launch_asset_url: embedded.bundle_path.clone(),
            asset_files: embedded.asset_files.clone(),
            is_using_embedded_assets: true,
        })
    }

    fn launch_update(
        &self,
        manifest: &UpdateManifest,
        store: &dyn ManifestStore,
    ) -> Result<LaunchPlan, LaunchError> {
        let mut asset_files = BTreeMap::new();
        let mut missing = Vec::new();

        for asset in manifest.all_assets() {
            match store.asset_local_path(manifest, &asset.key)? {
                Some(path) => {
                    asset_files.insert(asset.key.clone(), path);
                }
                None => missing.push(asset.key.clone()),
            }
        }

        if !missing.is_empty() {
            debug!(
                "update {} not launchable, {} asset(s) missing",
                manifest.id,
                missing.len()
            );
            return Err(LaunchError::AssetsIncomplete {
                update_id: manifest.id,
                missing,
            });
        }

        let launch_asset_url = asset_files
            .get(&manifest.launch_asset.key)
            .cloned()
            .ok_or_else(|| LaunchError::AssetsIncomplete {
                update_id: manifest.id,
                missing: vec![manifest.launch_asset.key.clone()],
            })?;

        info!(
            "launching update {} from {}",
            manifest.id,
            launch_asset_url.display()
        );

        Ok(LaunchPlan {
            launched_manifest: Some(manifest.clone()),
            launch_asset_url,
            asset_files,
            is_using_embedded_assets: false,
        })
    }
}
