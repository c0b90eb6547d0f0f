//! # pluginmaster
//!
//! Builds a consolidated plugin index from per-plugin manifest files.
//!
//! Each plugin lives in its own directory under `plugins/` with a manifest
//! named after the directory. pluginmaster trims every manifest to the
//! fields the index publishes, adds download links and defaults, looks up
//! the release download count on GitHub, and writes the result to
//! `pluginmaster.json`, keeping each plugin's `LastUpdate` as long as its
//! version does not change.
//!
//! ## Quick Start
//!
//! ```bash
//! # From the repository root holding plugins/ and pluginmaster.json
//! pluginmaster
//!
//! # Preview the new index without overwriting the old one
//! pluginmaster --dry-run
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

pub mod core;
pub mod index;
pub mod integrations;

pub use crate::core::Config;
pub use index::{BuildReport, IndexBuilder, IndexError, IndexResult, Manifest, PluginIndex};
pub use integrations::{FetchError, GitHubReleases, ReleaseSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
