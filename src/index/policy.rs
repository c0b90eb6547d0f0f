//! Field tables that decide what an index entry looks like.
//!
//! All three tables are ordered; the order determines the key order of the
//! written index entries.

use serde_json::Value;

use super::manifest::{Manifest, DOWNLOAD_LINK_INSTALL};

/// Manifest fields carried into the index, in output order.
pub const TRIMMED_KEYS: &[&str] = &[
    "Author",
    "Name",
    "Punchline",
    "Description",
    "Changelog",
    "InternalName",
    "AssemblyVersion",
    "RepoUrl",
    "ApplicableVersion",
    "Tags",
    "CategoryTags",
    "DalamudApiLevel",
    "IconUrl",
    "ImageUrls",
];

/// Values filled in when a manifest does not set them.
pub const DEFAULTS: &[(&str, FieldDefault)] = &[
    ("IsHide", FieldDefault::Bool(false)),
    ("IsTestingExclusive", FieldDefault::Bool(false)),
    ("ApplicableVersion", FieldDefault::Text("any")),
];

/// Source field copied into each target field the manifest does not set.
pub const DUPLICATES: &[(&str, &[&str])] =
    &[(DOWNLOAD_LINK_INSTALL, &["DownloadLinkTesting", "DownloadLinkUpdate"])];

/// A constant default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Bool(bool),
    Text(&'static str),
}

impl From<FieldDefault> for Value {
    fn from(default: FieldDefault) -> Self {
        match default {
            FieldDefault::Bool(b) => Self::Bool(b),
            FieldDefault::Text(s) => Self::String(s.to_string()),
        }
    }
}

/// The tables used by one index run.
#[derive(Debug, Clone, Copy)]
pub struct EnrichPolicy {
    /// Allow-listed manifest fields
    pub trimmed_keys: &'static [&'static str],

    /// Defaults applied after the download link is computed
    pub defaults: &'static [(&'static str, FieldDefault)],

    /// Source to target field copies
    pub duplicates: &'static [(&'static str, &'static [&'static str])],
}

impl Default for EnrichPolicy {
    fn default() -> Self {
        Self { trimmed_keys: TRIMMED_KEYS, defaults: DEFAULTS, duplicates: DUPLICATES }
    }
}

impl EnrichPolicy {
    /// Project a manifest onto the allow-list.
    pub fn trim(&self, manifest: &Manifest) -> Manifest {
        trim_manifest(manifest, self.trimmed_keys)
    }

    /// Fill in every default the manifest lacks.
    pub fn apply_defaults(&self, manifest: &mut Manifest) {
        for (key, value) in self.defaults {
            manifest.insert_if_absent(key, *value);
        }
    }

    /// Copy each source field into its targets where the target is absent.
    ///
    /// A source field that is itself absent is skipped.
    pub fn apply_duplicates(&self, manifest: &mut Manifest) {
        for (source, targets) in self.duplicates {
            let Some(value) = manifest.get(source).cloned() else {
                continue;
            };
            for target in *targets {
                manifest.insert_if_absent(target, value.clone());
            }
        }
    }
}

/// Keep only the listed keys that are present, in list order.
pub fn trim_manifest(manifest: &Manifest, keys: &[&str]) -> Manifest {
    let mut trimmed = Manifest::new();
    for key in keys {
        if let Some(value) = manifest.get(key) {
            trimmed.insert(*key, value.clone());
        }
    }
    trimmed
}
