//! Plugin manifest records and their collection from the plugins directory.
//!
//! A manifest is kept as an ordered JSON object rather than a typed struct:
//! the index only cares about a handful of keys and passes every other
//! allow-listed field through untouched.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use walkdir::WalkDir;

use super::{IndexError, IndexResult};

/// Unique plugin identifier, also used as the release repository name.
pub const INTERNAL_NAME: &str = "InternalName";

/// Plugin version, compared across runs.
pub const ASSEMBLY_VERSION: &str = "AssemblyVersion";

/// Plugin source repository URL.
pub const REPO_URL: &str = "RepoUrl";

/// Computed install link.
pub const DOWNLOAD_LINK_INSTALL: &str = "DownloadLinkInstall";

/// Total release asset downloads.
pub const DOWNLOAD_COUNT: &str = "DownloadCount";

/// Seconds since epoch of the last version change, as a string.
pub const LAST_UPDATE: &str = "LastUpdate";

/// A single plugin manifest record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(Map<String, Value>);

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Get a field value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Check whether a field is present.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Set a field, replacing any existing value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Set a field only if it is absent. Returns true if the value was set.
    pub fn insert_if_absent(&mut self, key: &str, value: impl Into<Value>) -> bool {
        if self.0.contains_key(key) {
            return false;
        }
        self.0.insert(key.to_string(), value.into());
        true
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the manifest has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Name used in log lines and error messages.
    pub fn label(&self) -> String {
        match self.0.get(INTERNAL_NAME) {
            Some(Value::String(name)) => name.clone(),
            Some(other) => other.to_string(),
            None => "<unnamed>".to_string(),
        }
    }

    /// Read a required field as text.
    ///
    /// Strings are returned verbatim; numbers and booleans use their JSON
    /// rendering. Arrays, objects and null are rejected.
    pub fn require_text(&self, field: &'static str) -> IndexResult<String> {
        match self.0.get(field) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(v.to_string()),
            Some(_) => Err(IndexError::InvalidField { field, plugin: self.label() }),
            None => Err(IndexError::MissingField { field, plugin: self.label() }),
        }
    }

    /// The plugin's `InternalName`.
    pub fn internal_name(&self) -> IndexResult<String> {
        self.require_text(INTERNAL_NAME)
    }
}

impl From<Map<String, Value>> for Manifest {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Read and parse a single manifest file.
pub fn read_manifest(path: &Path) -> IndexResult<Manifest> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| IndexError::Io { path: path.to_path_buf(), source })?;

    let value: Value = serde_json::from_str(&content)
        .map_err(|source| IndexError::Parse { path: path.to_path_buf(), source })?;

    match value {
        Value::Object(map) => Ok(Manifest(map)),
        _ => Err(IndexError::NotAnObject(path.to_path_buf())),
    }
}

/// Path of the manifest file a plugin directory is expected to hold.
fn manifest_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.json"))
}

/// Collect one manifest per immediate subdirectory of `root`.
///
/// A subdirectory `Foo` contributes `Foo/Foo.json` if that file exists and is
/// skipped otherwise. Results are ordered by directory name. A missing
/// `root` holds no plugins.
pub fn collect_manifests(root: &Path) -> IndexResult<Vec<Manifest>> {
    let mut manifests = Vec::new();

    if !root.exists() {
        debug!("Plugins directory {} does not exist", root.display());
        return Ok(manifests);
    }

    for entry in WalkDir::new(root).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        let path = manifest_path(entry.path(), &name);
        if !path.is_file() {
            debug!("Skipping {}: no {name}.json", entry.path().display());
            continue;
        }

        debug!("Reading manifest {}", path.display());
        manifests.push(read_manifest(&path)?);
    }

    Ok(manifests)
}
