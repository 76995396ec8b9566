//! otakit-core: update manifest storage, selection and launch planning.
//!
//! Data flows one way: the store supplies candidate manifests, the filter
//! matcher prunes them, a selection policy picks at most one, and the
//! launcher resolves it into a launch plan the host can boot from. The
//! coordinator sequences those steps and owns the embedded-fallback policy.

mod config;
mod coordinator;
mod error;
mod filter;
mod hash;
mod launcher;
mod manifest;
mod policy;
mod store;

pub use config::{PolicyConfig, UpdatesConfig};
pub use coordinator::{LaunchState, UpdatesCoordinator};
pub use error::{ConfigError, FatalLaunchError, LaunchError, StoreError};
pub use filter::{FilterSet, matches};
pub use hash::{compute_hash, hash_bytes, short_hash};
pub use launcher::{EmbeddedBundle, LaunchPlan, Launcher};
pub use manifest::{AssetDescriptor, MetadataValue, UpdateManifest};
pub use policy::{Newest, NewestFilterAware, SelectionPolicy, SingleUpdate};
pub use store::{
    FileManifestStore, MANIFEST_INDEX_VERSION, ManifestIndex, ManifestIndexEntry, ManifestStore,
};
