//! Selection policies: choose at most one downloaded update to launch.

use std::cmp::Ordering;

use uuid::Uuid;

use crate::filter::{self, FilterSet};
use crate::manifest::UpdateManifest;

/// Strategy deciding which downloaded update, if any, is safe and newest
/// to launch.
///
/// Returning `None` is a normal outcome (fresh install, nothing
/// compatible downloaded yet), never an error; callers fall back to the
/// embedded bundle.
pub trait SelectionPolicy {
    fn select<'a>(
        &self,
        candidates: &'a [UpdateManifest],
        filters: &FilterSet,
    ) -> Option<&'a UpdateManifest>;
}

/// Newest update that matches all filters and carries a runtime version
/// the host declared compatible.
pub struct NewestFilterAware {
    runtime_versions: Vec<String>,
}

impl NewestFilterAware {
    pub fn new(runtime_versions: Vec<String>) -> Self {
        Self { runtime_versions }
    }
}

impl SelectionPolicy for NewestFilterAware {
    fn select<'a>(
        &self,
        candidates: &'a [UpdateManifest],
        filters: &FilterSet,
    ) -> Option<&'a UpdateManifest> {
        newest(
            candidates
                .iter()
                .filter(|m| self.runtime_versions.contains(&m.runtime_version))
                .filter(|m| filter::matches(m, filters)),
        )
    }
}

/// Pins selection to a single update id, ignoring filters and recency.
pub struct SingleUpdate {
    id: Uuid,
}

impl SingleUpdate {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

impl SelectionPolicy for SingleUpdate {
    fn select<'a>(
        &self,
        candidates: &'a [UpdateManifest],
        _filters: &FilterSet,
    ) -> Option<&'a UpdateManifest> {
        candidates.iter().find(|m| m.id == self.id)
    }
}

/// Filter-blind newest-wins. Predates manifest filters; kept for hosts
/// that never send them.
pub struct Newest {
    runtime_versions: Vec<String>,
}

impl Newest {
    pub fn new(runtime_versions: Vec<String>) -> Self {
        Self { runtime_versions }
    }
}

impl SelectionPolicy for Newest {
    fn select<'a>(
        &self,
        candidates: &'a [UpdateManifest],
        _filters: &FilterSet,
    ) -> Option<&'a UpdateManifest> {
        newest(
            candidates
                .iter()
                .filter(|m| self.runtime_versions.contains(&m.runtime_version)),
        )
    }
}

fn newest<'a>(candidates: impl Iterator<Item = &'a UpdateManifest>) -> Option<&'a UpdateManifest> {
    candidates.reduce(|best, candidate| if prefer(candidate, best) { candidate } else { best })
}

/// Launch preference: greater commit time wins; equal commit times go to
/// the lexicographically smaller id, so selection is deterministic.
fn prefer(a: &UpdateManifest, b: &UpdateManifest) -> bool {
    match a.commit_time.cmp(&b.commit_time) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => a.id < b.id,
    }
}
