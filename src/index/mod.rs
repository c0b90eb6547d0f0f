//! Plugin index generation.
//!
//! Builds `pluginmaster.json` from the per-plugin manifests in the plugins
//! directory.
//!
//! # Stages
//!
//! 1. **Collect**: read `<dir>/<dir>.json` for each plugin directory
//! 2. **Trim**: keep only the allow-listed manifest fields
//! 3. **Enrich**: add download links, defaults and the release download count
//! 4. **Reconcile**: carry `LastUpdate` forward for unchanged versions
//! 5. **Write**: overwrite the index with four-space indented JSON
//!
//! The previous index is loaded before anything else and must exist. Any
//! fatal error aborts the run before the index is written; failed download
//! count lookups are logged and recorded as zero.

mod enrich;
mod error;
mod manifest;
mod policy;
mod reconcile;
mod store;

use std::path::{Path, PathBuf};

use tracing::info;

pub use enrich::{download_link, enrich_manifest, fetch_download_count, DownloadCount};
pub use error::{IndexError, IndexResult};
pub use manifest::{
    collect_manifests, read_manifest, Manifest, ASSEMBLY_VERSION, DOWNLOAD_COUNT,
    DOWNLOAD_LINK_INSTALL, INTERNAL_NAME, LAST_UPDATE, REPO_URL,
};
pub use policy::{trim_manifest, EnrichPolicy, FieldDefault, DEFAULTS, DUPLICATES, TRIMMED_KEYS};
pub use reconcile::reconcile_timestamps;
pub use store::{PluginIndex, INDEX_FILE};

use crate::core::Config;
use crate::integrations::{token_from_env, GitHubReleases, ReleaseSource};

/// Result of one index build.
#[derive(Debug)]
pub struct BuildReport {
    /// The new index
    pub index: PluginIndex,

    /// Plugins whose download count lookup failed and was recorded as zero
    pub failed_lookups: Vec<String>,
}

/// Runs the index stages against one plugins directory and index file.
pub struct IndexBuilder<S> {
    /// Directory holding one subdirectory per plugin
    plugins_dir: PathBuf,

    /// Previous and next index file
    index_path: PathBuf,

    /// Owner of the release repositories
    owner: String,

    /// Field tables
    policy: EnrichPolicy,

    /// Download count lookups
    source: S,
}

impl IndexBuilder<GitHubReleases> {
    /// Create a builder that queries the GitHub API described by `config`.
    ///
    /// Requests are authenticated when `GITHUB_TOKEN` or `GH_TOKEN` is set.
    pub fn from_config(config: &Config) -> IndexResult<Self> {
        let source = GitHubReleases::new(&config.releases.api_base, config.releases.timeout())
            .map_err(IndexError::Client)?
            .with_token(token_from_env());

        Ok(Self::new(config, source))
    }
}

impl<S: ReleaseSource> IndexBuilder<S> {
    /// Create a builder with an explicit release source.
    pub fn new(config: &Config, source: S) -> Self {
        Self {
            plugins_dir: config.paths.plugins_dir.clone(),
            index_path: config.paths.index_path.clone(),
            owner: config.releases.owner.clone(),
            policy: EnrichPolicy::default(),
            source,
        }
    }

    /// Use different field tables.
    pub fn with_policy(mut self, policy: EnrichPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The index file path.
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Build the new index without writing it.
    ///
    /// `now` is the current time in seconds since the Unix epoch.
    pub fn build(&self, now: i64) -> IndexResult<BuildReport> {
        let previous = PluginIndex::load(&self.index_path)?;
        info!("Loaded {} entries from {}", previous.len(), self.index_path.display());

        let manifests = collect_manifests(&self.plugins_dir)?;
        info!("Collected {} manifests from {}", manifests.len(), self.plugins_dir.display());

        let mut enriched = Vec::with_capacity(manifests.len());
        let mut failed_lookups = Vec::new();

        for manifest in &manifests {
            let mut entry = self.policy.trim(manifest);
            let count = enrich_manifest(&mut entry, &self.policy, &self.source, &self.owner)?;
            if count.is_failed() {
                failed_lookups.push(entry.label());
            }
            enriched.push(entry);
        }

        let index = reconcile_timestamps(enriched, &previous, now);

        Ok(BuildReport { index, failed_lookups })
    }

    /// Build the index as of `now` and overwrite the index file.
    pub fn run_at(&self, now: i64) -> IndexResult<BuildReport> {
        let report = self.build(now)?;
        report.index.write(&self.index_path)?;

        info!("Wrote {} entries to {}", report.index.len(), self.index_path.display());
        Ok(report)
    }

    /// Build the index as of the current time and overwrite the index file.
    pub fn run(&self) -> IndexResult<BuildReport> {
        self.run_at(chrono::Utc::now().timestamp())
    }
}
