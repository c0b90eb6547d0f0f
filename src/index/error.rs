//! Index pipeline error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::integrations::FetchError;

/// Result type for index pipeline operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that abort an index run.
///
/// Failures of the download-count lookup are not represented here; they are
/// reported as [`FetchError`](crate::integrations::FetchError) and downgraded
/// to a zero count by the enricher.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Reading or writing a file failed.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Walking the plugins directory failed.
    #[error("Failed to walk plugins directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// A manifest or index file is not valid JSON.
    #[error("Malformed JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A manifest file does not contain a JSON object.
    #[error("Manifest {0} is not a JSON object")]
    NotAnObject(PathBuf),

    /// The index file does not contain a JSON array of objects.
    #[error("Index {0} is not a JSON array of objects")]
    NotAnArray(PathBuf),

    /// The previous index file does not exist.
    #[error("Previous index not found: {0}")]
    MissingIndex(PathBuf),

    /// A required manifest field is absent.
    #[error("Plugin '{plugin}' is missing required field '{field}'")]
    MissingField { field: &'static str, plugin: String },

    /// A required manifest field has a type that cannot be used as text.
    #[error("Plugin '{plugin}' has a non-scalar value for field '{field}'")]
    InvalidField { field: &'static str, plugin: String },

    /// Serializing the index document failed.
    #[error("Failed to serialize index: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client")]
    Client(#[source] FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_client_error_keeps_source() {
        let err = IndexError::Client(FetchError::InvalidBody("no TLS backend".to_string()));

        let source = err.source().expect("client error has a source");
        assert_eq!(source.to_string(), "Invalid response: no TLS backend");
        assert_eq!(err.to_string(), "Failed to build HTTP client");
    }
}
