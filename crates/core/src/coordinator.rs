//! Orchestration: store → policy → launcher, with embedded fallback.

use tracing::{debug, error, warn};

use crate::error::{FatalLaunchError, LaunchError};
use crate::filter::FilterSet;
use crate::launcher::{EmbeddedBundle, LaunchPlan, Launcher};
use crate::policy::SelectionPolicy;
use crate::store::ManifestStore;

/// Resolution progress for a single `resolve_launch_plan` call.
/// `Launched` and `EmbeddedFallback` are the success terminals,
/// `FatalError` the failure terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    Idle,
    Resolving,
    Launched,
    EmbeddedFallback,
    FatalError,
}

/// The one component other subsystems call.
///
/// Dependencies are injected explicitly and held per instance; there is
/// no ambient global. `resolve_launch_plan` is read-only apart from the
/// store's own I/O, so concurrent calls are safe.
pub struct UpdatesCoordinator {
    store: Box<dyn ManifestStore>,
    policy: Box<dyn SelectionPolicy>,
    launcher: Launcher,
}

impl UpdatesCoordinator {
    pub fn new(
        store: Box<dyn ManifestStore>,
        policy: Box<dyn SelectionPolicy>,
        embedded: Option<EmbeddedBundle>,
    ) -> Self {
        Self {
            store,
            policy,
            launcher: Launcher::new(embedded),
        }
    }

    /// Resolve a launch plan for the given filters.
    ///
    /// "No update available" is not a failure: the embedded bundle plan
    /// is returned instead. Store read errors empty the candidate set
    /// and take the same fallback. An update with incomplete assets is
    /// skipped in favor of the next-best candidate. The only error that
    /// escapes is a host with nothing launchable and no embedded bundle.
    pub fn resolve_launch_plan(
        &self,
        filters: &FilterSet,
    ) -> Result<LaunchPlan, FatalLaunchError> {
        let mut state = LaunchState::Idle;
        transition(&mut state, LaunchState::Resolving);

        let mut candidates = match self.store.all_manifests() {
            Ok(manifests) => manifests,
            Err(err) => {
                warn!("manifest store unreadable, treating candidate set as empty: {err}");
                Vec::new()
            }
        };

        loop {
            let Some(selected) = self.policy.select(&candidates, filters) else {
                debug!("no candidate qualifies, falling back to embedded bundle");
                break;
            };
            let selected_id = selected.id;

            match self.launcher.launch(Some(selected), self.store.as_ref()) {
                Ok(plan) => {
                    transition(&mut state, LaunchState::Launched);
                    return Ok(plan);
                }
                Err(LaunchError::AssetsIncomplete { update_id, missing }) => {
                    warn!(
                        "update {update_id} is missing assets [{}], trying next candidate",
                        missing.join(", ")
                    );
                    candidates.retain(|m| m.id != selected_id);
                }
                Err(LaunchError::Store(err)) => {
                    warn!(
                        "store error while launching {selected_id}, falling back to embedded bundle: {err}"
                    );
                    break;
                }
                Err(err @ LaunchError::NoEmbeddedBundle) => {
                    transition(&mut state, LaunchState::FatalError);
                    return Err(FatalLaunchError { source: err });
                }
            }
        }

        match self.launcher.launch(None, self.store.as_ref()) {
            Ok(plan) => {
                transition(&mut state, LaunchState::EmbeddedFallback);
                Ok(plan)
            }
            Err(err) => {
                transition(&mut state, LaunchState::FatalError);
                error!("no launchable update and no embedded fallback: {err}");
                Err(FatalLaunchError { source: err })
            }
        }
    }
}

fn transition(state: &mut LaunchState, next: LaunchState) {
    debug!(from = ?*state, to = ?next, "launch state");
    *state = next;
}
