//! Derived fields added to each trimmed manifest.

use tracing::{debug, warn};

use super::manifest::{
    Manifest, ASSEMBLY_VERSION, DOWNLOAD_COUNT, DOWNLOAD_LINK_INSTALL, REPO_URL,
};
use super::policy::EnrichPolicy;
use super::IndexResult;
use crate::integrations::{FetchError, FetchResult, ReleaseSource};

/// Install link for a plugin release.
pub fn download_link(repo_url: &str, version: &str) -> String {
    format!("{repo_url}/releases/download/v{version}/latest.zip")
}

/// Outcome of a download-count lookup.
///
/// A failed lookup is written to the index as zero, but stays
/// distinguishable from a real zero here.
#[derive(Debug)]
pub enum DownloadCount {
    /// The API returned a release list
    Fetched(u64),

    /// The lookup failed
    Failed(FetchError),
}

impl DownloadCount {
    /// The count written to the index.
    pub fn value(&self) -> u64 {
        match self {
            Self::Fetched(count) => *count,
            Self::Failed(_) => 0,
        }
    }

    /// Whether the lookup failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl From<FetchResult<u64>> for DownloadCount {
    fn from(result: FetchResult<u64>) -> Self {
        match result {
            Ok(count) => Self::Fetched(count),
            Err(e) => Self::Failed(e),
        }
    }
}

/// Look up the download count for `owner/repo`, logging any failure.
pub fn fetch_download_count<S: ReleaseSource + ?Sized>(
    source: &S,
    owner: &str,
    repo: &str,
) -> DownloadCount {
    let count = DownloadCount::from(source.download_count(owner, repo));
    match &count {
        DownloadCount::Fetched(n) => debug!("{owner}/{repo}: {n} downloads"),
        DownloadCount::Failed(e) => warn!("Request failed for {owner}/{repo}: {e}"),
    }
    count
}

/// Add the download link, defaults, duplicated links and download count.
///
/// Missing `RepoUrl`, `AssemblyVersion` or `InternalName` is fatal; a failed
/// count lookup is not.
pub fn enrich_manifest<S: ReleaseSource + ?Sized>(
    manifest: &mut Manifest,
    policy: &EnrichPolicy,
    source: &S,
    owner: &str,
) -> IndexResult<DownloadCount> {
    let repo_url = manifest.require_text(REPO_URL)?;
    let version = manifest.require_text(ASSEMBLY_VERSION)?;
    manifest.insert(DOWNLOAD_LINK_INSTALL, download_link(&repo_url, &version));

    policy.apply_defaults(manifest);
    policy.apply_duplicates(manifest);

    let name = manifest.internal_name()?;
    let count = fetch_download_count(source, owner, &name);
    manifest.insert(DOWNLOAD_COUNT, count.value());

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexError;
    use serde_json::{json, Value};
    use std::cell::RefCell;

    /// Release source answering from a fixed table and recording every call.
    struct CannedReleases {
        counts: Vec<(&'static str, u64)>,
        calls: RefCell<Vec<String>>,
    }

    impl CannedReleases {
        fn new(counts: Vec<(&'static str, u64)>) -> Self {
            Self { counts, calls: RefCell::new(Vec::new()) }
        }
    }

    impl ReleaseSource for CannedReleases {
        fn download_count(&self, owner: &str, repo: &str) -> FetchResult<u64> {
            self.calls.borrow_mut().push(format!("{owner}/{repo}"));
            self.counts
                .iter()
                .find(|(name, _)| *name == repo)
                .map(|(_, count)| *count)
                .ok_or(FetchError::Status { status: 404, message: "Not Found".to_string() })
        }
    }

    fn manifest(value: Value) -> Manifest {
        Manifest::from(value.as_object().unwrap().clone())
    }

    fn foo() -> Manifest {
        manifest(json!({
            "Author": "A",
            "InternalName": "Foo",
            "AssemblyVersion": "1.0",
            "RepoUrl": "https://x/Foo",
        }))
    }

    #[test]
    fn test_download_link_format() {
        assert_eq!(
            download_link("https://github.com/me/Foo", "1.2.3.4"),
            "https://github.com/me/Foo/releases/download/v1.2.3.4/latest.zip"
        );
    }

    #[test]
    fn test_enrich_adds_all_fields() {
        let source = CannedReleases::new(vec![("Foo", 17)]);
        let mut m = foo();

        let count = enrich_manifest(&mut m, &EnrichPolicy::default(), &source, "owner").unwrap();

        assert!(!count.is_failed());
        let link = "https://x/Foo/releases/download/v1.0/latest.zip";
        assert_eq!(m.get("DownloadLinkInstall"), Some(&json!(link)));
        assert_eq!(m.get("DownloadLinkTesting"), Some(&json!(link)));
        assert_eq!(m.get("DownloadLinkUpdate"), Some(&json!(link)));
        assert_eq!(m.get("IsHide"), Some(&json!(false)));
        assert_eq!(m.get("IsTestingExclusive"), Some(&json!(false)));
        assert_eq!(m.get("ApplicableVersion"), Some(&json!("any")));
        assert_eq!(m.get("DownloadCount"), Some(&json!(17)));
        assert_eq!(*source.calls.borrow(), vec!["owner/Foo".to_string()]);
    }

    #[test]
    fn test_enrich_key_order() {
        let source = CannedReleases::new(vec![("Foo", 1)]);
        let mut m = foo();
        enrich_manifest(&mut m, &EnrichPolicy::default(), &source, "owner").unwrap();

        assert_eq!(
            m.keys().collect::<Vec<_>>(),
            vec![
                "Author",
                "InternalName",
                "AssemblyVersion",
                "RepoUrl",
                "DownloadLinkInstall",
                "IsHide",
                "IsTestingExclusive",
                "ApplicableVersion",
                "DownloadLinkTesting",
                "DownloadLinkUpdate",
                "DownloadCount",
            ]
        );
    }

    #[test]
    fn test_enrich_failed_lookup_counts_zero() {
        let source = CannedReleases::new(vec![]);
        let mut m = foo();

        let count = enrich_manifest(&mut m, &EnrichPolicy::default(), &source, "owner").unwrap();

        assert!(count.is_failed());
        assert_eq!(count.value(), 0);
        assert_eq!(m.get("DownloadCount"), Some(&json!(0)));
    }

    #[test]
    fn test_enrich_keeps_explicit_values() {
        let source = CannedReleases::new(vec![("Foo", 0)]);
        let mut m = foo();
        m.insert("ApplicableVersion", "2023.1");
        m.insert("IsHide", true);

        enrich_manifest(&mut m, &EnrichPolicy::default(), &source, "owner").unwrap();

        assert_eq!(m.get("ApplicableVersion"), Some(&json!("2023.1")));
        assert_eq!(m.get("IsHide"), Some(&json!(true)));
    }

    #[test]
    fn test_enrich_requires_repo_url() {
        let source = CannedReleases::new(vec![("Foo", 1)]);
        let mut m = manifest(json!({"InternalName": "Foo", "AssemblyVersion": "1.0"}));

        let err = enrich_manifest(&mut m, &EnrichPolicy::default(), &source, "owner").unwrap_err();

        assert!(matches!(err, IndexError::MissingField { field: "RepoUrl", .. }));
        assert!(source.calls.borrow().is_empty());
    }

    #[test]
    fn test_enrich_requires_internal_name() {
        let source = CannedReleases::new(vec![]);
        let mut m = manifest(json!({"AssemblyVersion": "1.0", "RepoUrl": "https://x"}));

        let err = enrich_manifest(&mut m, &EnrichPolicy::default(), &source, "owner").unwrap_err();

        assert!(matches!(err, IndexError::MissingField { field: "InternalName", .. }));
    }
}
