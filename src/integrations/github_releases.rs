//! GitHub Releases integration.
//!
//! Looks up the release list of a repository and totals the download count
//! of every release asset.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Source of per-repository download totals.
///
/// The index pipeline only depends on this trait, so tests can substitute a
/// canned source for the real API.
pub trait ReleaseSource {
    /// Total downloads across every asset of every release of `owner/repo`.
    fn download_count(&self, owner: &str, repo: &str) -> FetchResult<u64>;
}

impl<T: ReleaseSource + ?Sized> ReleaseSource for &T {
    fn download_count(&self, owner: &str, repo: &str) -> FetchResult<u64> {
        (**self).download_count(owner, repo)
    }
}

/// A release as returned by the releases endpoint.
///
/// Only the fields the index uses are modelled; everything else is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Release {
    /// Release tag
    #[serde(default)]
    pub tag_name: Option<String>,

    /// Uploaded assets
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A downloadable release asset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// Asset file name
    #[serde(default)]
    pub name: Option<String>,

    /// Number of times the asset was downloaded
    #[serde(default)]
    pub download_count: u64,
}

/// Why a download-count lookup failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be sent or the connection failed
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("GitHub API error: {message} (status: {status})")]
    Status { status: u16, message: String },

    /// The response body is not a release list
    #[error("Invalid response: {0}")]
    InvalidBody(String),
}

/// Result type for release lookups.
pub type FetchResult<T> = Result<T, FetchError>;

/// Sum the download counts of every asset of every release.
pub fn total_downloads(releases: &[Release]) -> u64 {
    releases.iter().flat_map(|release| &release.assets).map(|asset| asset.download_count).sum()
}

/// Read a GitHub token from `GITHUB_TOKEN` or `GH_TOKEN`.
///
/// An empty variable counts as unset.
pub fn token_from_env() -> Option<String> {
    let non_empty = |name: &str| std::env::var(name).ok().filter(|token| !token.is_empty());
    non_empty("GITHUB_TOKEN").or_else(|| non_empty("GH_TOKEN"))
}

/// Blocking client for the GitHub releases endpoint.
pub struct GitHubReleases {
    /// GitHub API base URL
    base_url: String,

    /// Optional personal access token
    token: Option<String>,

    /// HTTP client
    client: reqwest::blocking::Client,
}

impl GitHubReleases {
    /// Create an anonymous client.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> FetchResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(format!("pluginmaster/{}", crate::VERSION))
            .build()?;

        Ok(Self { base_url: base_url.into(), token: None, client })
    }

    /// Authenticate requests with a token.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Whether requests carry an `Authorization` header.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// URL of the releases listing for a repository.
    fn releases_url(&self, owner: &str, repo: &str) -> String {
        format!(
            "{}/repos/{}/{}/releases",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        )
    }

    /// Fetch the first page of releases for `owner/repo`.
    pub fn list_releases(&self, owner: &str, repo: &str) -> FetchResult<Vec<Release>> {
        let url = self.releases_url(owner, repo);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request.send()?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FetchError::Status { status: status.as_u16(), message });
        }

        response.json().map_err(|e| FetchError::InvalidBody(e.to_string()))
    }
}

impl ReleaseSource for GitHubReleases {
    fn download_count(&self, owner: &str, repo: &str) -> FetchResult<u64> {
        let releases = self.list_releases(owner, repo)?;
        Ok(total_downloads(&releases))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const RELEASES_BODY: &str = r#"[
        {"tag_name": "v1.1", "assets": [{"name": "latest.zip", "download_count": 40}, {"name": "src.zip", "download_count": 2}]},
        {"tag_name": "v1.0", "assets": [{"name": "latest.zip", "download_count": 100}]},
        {"tag_name": "v0.9"}
    ]"#;

    fn client(server: &mockito::Server) -> GitHubReleases {
        GitHubReleases::new(server.url(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_total_downloads() {
        let releases: Vec<Release> = serde_json::from_str(RELEASES_BODY).unwrap();
        assert_eq!(total_downloads(&releases), 142);
        assert_eq!(total_downloads(&[]), 0);
    }

    #[test]
    fn test_asset_without_count_counts_as_zero() {
        let releases: Vec<Release> =
            serde_json::from_str(r#"[{"assets": [{"name": "a.zip"}, {"download_count": 7}]}]"#)
                .unwrap();
        assert_eq!(total_downloads(&releases), 7);
    }

    #[test]
    fn test_download_count_sums_assets() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/repos/SHOEGAZEssb/Foo/releases")
            .match_header("accept", "application/vnd.github+json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(RELEASES_BODY)
            .create();

        let count = client(&server).download_count("SHOEGAZEssb", "Foo").unwrap();

        assert_eq!(count, 142);
        mock.assert();
    }

    #[test]
    fn test_download_count_sends_token() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/repos/owner/Foo/releases")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_body("[]")
            .create();

        let releases = client(&server).with_token(Some("secret".to_string()));
        assert!(releases.is_authenticated());
        assert_eq!(releases.download_count("owner", "Foo").unwrap(), 0);
        mock.assert();
    }

    #[test]
    fn test_non_success_status_is_classified() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/repos/owner/Missing/releases")
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create();

        let err = client(&server).download_count("owner", "Missing").unwrap_err();

        match err {
            FetchError::Status { status, message } => {
                assert_eq!(status, 404);
                assert!(message.contains("Not Found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unexpected_body_is_classified() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/repos/owner/Foo/releases")
            .with_status(200)
            .with_body(r#"{"releases": []}"#)
            .create();

        let err = client(&server).download_count("owner", "Foo").unwrap_err();
        assert!(matches!(err, FetchError::InvalidBody(_)));
    }

    #[test]
    fn test_connection_failure_is_transport_error() {
        // Nothing listens on port 1
        let releases = GitHubReleases::new("http://127.0.0.1:1", Duration::from_secs(5)).unwrap();
        let err = releases.download_count("owner", "Foo").unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn test_repo_name_is_percent_encoded() {
        let releases = GitHubReleases::new("https://api.example.com/", Duration::from_secs(5))
            .unwrap();
        assert_eq!(
            releases.releases_url("owner", "My Plugin"),
            "https://api.example.com/repos/owner/My%20Plugin/releases"
        );
    }

    #[test]
    #[serial(github_env)]
    fn test_token_from_env() {
        // Save current values
        let original_github = std::env::var("GITHUB_TOKEN").ok();
        let original_gh = std::env::var("GH_TOKEN").ok();

        std::env::set_var("GITHUB_TOKEN", "primary");
        std::env::set_var("GH_TOKEN", "secondary");
        assert_eq!(token_from_env().as_deref(), Some("primary"));

        std::env::remove_var("GITHUB_TOKEN");
        assert_eq!(token_from_env().as_deref(), Some("secondary"));

        std::env::set_var("GITHUB_TOKEN", "");
        assert_eq!(token_from_env().as_deref(), Some("secondary"));

        std::env::set_var("GH_TOKEN", "");
        assert_eq!(token_from_env(), None);

        // Restore or remove
        match original_github {
            Some(val) => std::env::set_var("GITHUB_TOKEN", val),
            None => std::env::remove_var("GITHUB_TOKEN"),
        }
        match original_gh {
            Some(val) => std::env::set_var("GH_TOKEN", val),
            None => std::env::remove_var("GH_TOKEN"),
        }
    }
}
