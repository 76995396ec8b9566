//! Error types for otakit-core.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Errors from the manifest store read/write path. Callers on the launch
/// path recover by treating the candidate set as empty.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create store directory: {0}")]
    CreateDir(#[source] std::io::Error),

    #[error("failed to read store file: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write store file: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to parse store file: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to serialize store file: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("manifest not found in store: {0}")]
    NotFound(Uuid),

    #[error("unsupported store index version: {0}")]
    UnsupportedVersion(u32),
}

/// Errors from a single launch attempt.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The selected update references assets that are not on disk.
    /// Recoverable: the coordinator retries with the next-best candidate.
    #[error("update {update_id} is missing assets: {}", .missing.join(", "))]
    AssetsIncomplete { update_id: Uuid, missing: Vec<String> },

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The host shipped no embedded bundle, so there is nothing to fall
    /// back to.
    #[error("no embedded fallback bundle configured")]
    NoEmbeddedBundle,
}

/// Terminal failure: nothing launchable and no embedded fallback. The
/// only error that crosses the coordinator boundary.
#[derive(Debug, Error)]
#[error("unable to resolve a launch plan: {source}")]
pub struct FatalLaunchError {
    #[source]
    pub source: LaunchError,
}

/// Errors loading host configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config file: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[source] serde_json::Error),
}
