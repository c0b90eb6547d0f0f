//! External integrations module.
//!
//! Provides the remote lookups the index pipeline depends on.

pub mod github_releases;

pub use github_releases::{
    token_from_env, total_downloads, FetchError, FetchResult, GitHubReleases, Release,
    ReleaseAsset, ReleaseSource, DEFAULT_API_BASE,
};
