//! `LastUpdate` continuity between index runs.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::manifest::{Manifest, ASSEMBLY_VERSION, INTERNAL_NAME, LAST_UPDATE};
use super::store::PluginIndex;

/// Stamp every manifest with `LastUpdate`, carrying the previous value
/// forward for plugins whose version did not change.
///
/// Only the first previous entry with a matching `InternalName` is
/// consulted. `now` is seconds since the Unix epoch.
pub fn reconcile_timestamps(
    manifests: Vec<Manifest>,
    previous: &PluginIndex,
    now: i64,
) -> PluginIndex {
    let duplicates = previous.duplicate_names();
    if !duplicates.is_empty() {
        warn!(
            "Previous index lists {} more than once; using the first entry of each",
            duplicates.join(", ")
        );
    }

    let stamp = now.to_string();
    let mut carried = 0usize;

    let entries: Vec<Manifest> = manifests
        .into_iter()
        .map(|mut manifest| {
            manifest.insert(LAST_UPDATE, stamp.clone());

            if let Some(last_update) = carried_timestamp(&manifest, previous) {
                manifest.insert(LAST_UPDATE, last_update);
                carried += 1;
            } else {
                debug!("{}: LastUpdate set to {stamp}", manifest.label());
            }

            manifest
        })
        .collect();

    info!("{carried} of {} plugins unchanged since the previous index", entries.len());

    PluginIndex::new(entries)
}

/// The previous `LastUpdate` if the first previous entry with the same
/// `InternalName` has the same `AssemblyVersion`.
fn carried_timestamp(manifest: &Manifest, previous: &PluginIndex) -> Option<Value> {
    let name = manifest.get(INTERNAL_NAME)?;
    let version = manifest.get(ASSEMBLY_VERSION)?;

    let prior = previous.entries().iter().find(|p| p.get(INTERNAL_NAME) == Some(name))?;

    if prior.get(ASSEMBLY_VERSION) != Some(version) {
        return None;
    }

    prior.get(LAST_UPDATE).cloned()
}
