//! Filter matching: caller-supplied key/value constraints against
//! manifest metadata.

use std::collections::BTreeMap;

use crate::manifest::{MetadataValue, UpdateManifest};

/// Ambient key/value constraints supplied at selection time. Never
/// persisted, never mutated by matching.
pub type FilterSet = BTreeMap<String, MetadataValue>;

/// Whether `manifest` satisfies every filter in `filters`.
///
/// An empty filter set matches unconditionally. A key absent from the
/// manifest metadata fails the match (unknown keys never match).
/// Comparison is exact and case-sensitive, with no wildcard semantics.
/// Pure function: no I/O, safe to call concurrently.
pub fn matches(manifest: &UpdateManifest, filters: &FilterSet) -> bool {
    filters
        .iter()
        .all(|(key, value)| manifest.metadata.get(key) == Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::AssetDescriptor;
    use chrono::DateTime;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn manifest_with_metadata(metadata: BTreeMap<String, MetadataValue>) -> UpdateManifest {
        let mut manifest = UpdateManifest::new(
            Uuid::from_u128(7),
            DateTime::from_timestamp(100, 0).unwrap(),
            "45.0.0",
            AssetDescriptor::new("bundle.js", "aa11"),
        );
        manifest.metadata = metadata;
        manifest
    }

    #[test]
    fn matching_is_exact_and_case_sensitive() {
        let manifest = manifest_with_metadata(BTreeMap::from([(
            "channel".to_string(),
            MetadataValue::from("beta"),
        )]));

        let same = FilterSet::from([("channel".to_string(), MetadataValue::from("beta"))]);
        assert!(matches(&manifest, &same));

        let cased = FilterSet::from([("channel".to_string(), MetadataValue::from("Beta"))]);
        assert!(!matches(&manifest, &cased));
    }

    #[test]
    fn bool_filter_does_not_match_string_metadata() {
        let manifest = manifest_with_metadata(BTreeMap::from([(
            "rollout".to_string(),
            MetadataValue::from("true"),
        )]));

        let filters = FilterSet::from([("rollout".to_string(), MetadataValue::from(true))]);
        assert!(!matches(&manifest, &filters));
    }

    #[test]
    fn all_filters_must_match() {
        let manifest = manifest_with_metadata(BTreeMap::from([
            ("channel".to_string(), MetadataValue::from("beta")),
            ("branch".to_string(), MetadataValue::from("main")),
        ]));

        let filters = FilterSet::from([
            ("channel".to_string(), MetadataValue::from("beta")),
            ("branch".to_string(), MetadataValue::from("release")),
        ]);
        assert!(!matches(&manifest, &filters));
    }

    proptest! {
        #[test]
        fn empty_filter_set_always_matches(
            metadata in proptest::collection::btree_map("[a-z]{1,8}", "[a-z0-9]{0,8}", 0..5)
        ) {
            let metadata = metadata
                .into_iter()
                .map(|(k, v)| (k, MetadataValue::String(v)))
                .collect();
            let manifest = manifest_with_metadata(metadata);
            prop_assert!(matches(&manifest, &FilterSet::new()));
        }

        #[test]
        fn absent_key_never_matches(key in "[a-z]{1,8}", value in "[a-z0-9]{1,8}") {
            let manifest = manifest_with_metadata(BTreeMap::new());
            let filters = FilterSet::from([(key, MetadataValue::String(value))]);
            prop_assert!(!matches(&manifest, &filters));
        }

        #[test]
        fn subset_of_metadata_always_matches(
            metadata in proptest::collection::btree_map("[a-z]{1,8}", "[a-z0-9]{0,8}", 1..5)
        ) {
            let metadata: BTreeMap<String, MetadataValue> = metadata
                .into_iter()
                .map(|(k, v)| (k, MetadataValue::String(v)))
                .collect();
            // Any single entry taken from the metadata is a matching filter.
            let (key, value) = metadata.iter().next().unwrap();
            let filters = FilterSet::from([(key.clone(), value.clone())]);
            let manifest = manifest_with_metadata(metadata.clone());
            prop_assert!(matches(&manifest, &filters));
        }
    }
}
