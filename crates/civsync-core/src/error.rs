//! Error types for civsync.
//!
//! Every failure the engine can surface maps to one variant here. Network and
//! catalog-availability failures stay distinguishable so callers can render a
//! terminal, human-readable classification instead of a raw error chain.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the civsync library.
#[derive(Debug, Error)]
pub enum CivsyncError {
    // Network errors
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {message}")]
    Network {
        message: String,
        /// HTTP status code when the server answered with a failure status
        status: Option<u16>,
    },

    /// The catalog answered, but not with JSON. Treated as the service being down.
    #[error("Catalog service unavailable: {message}")]
    ServiceUnavailable { message: String },

    // Pagination errors
    #[error("No request is known for page {page}")]
    NoSuchPage { page: u32 },

    // Lookup errors
    #[error("Invalid hash: {input}")]
    InvalidHash { input: String },

    #[error("No model version found for hash {hash}")]
    HashNotFound { hash: String },

    #[error("Model not found: {model_id}")]
    ModelNotFound { model_id: String },

    #[error("User not found: {username}")]
    UserNotFound { username: String },

    #[error("Catalog returned no models")]
    NoItems,

    // Local store errors
    #[error("Corrupt sidecar {path:?}: {reason}")]
    CorruptSidecar { path: PathBuf, reason: String },

    #[error("Cannot resolve a folder for content type {content_type}")]
    UnresolvedFolder { content_type: String },

    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for civsync operations.
pub type Result<T> = std::result::Result<T, CivsyncError>;

impl From<std::io::Error> for CivsyncError {
    fn from(err: std::io::Error) -> Self {
        CivsyncError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for CivsyncError {
    fn from(err: serde_json::Error) -> Self {
        CivsyncError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl CivsyncError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        CivsyncError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// True when the remote service answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CivsyncError::Network { status: Some(404), .. })
    }

    /// Stable snake_case classification of this error.
    ///
    /// These codes are what front-ends switch on; they never change with the
    /// wording of the display message.
    pub fn error_kind(&self) -> &'static str {
        match self {
            CivsyncError::Timeout(_) => "timeout",
            CivsyncError::Network { .. } => "error",
            CivsyncError::ServiceUnavailable { .. } => "offline",
            CivsyncError::NoSuchPage { .. } => "no_such_page",
            CivsyncError::InvalidHash { .. } => "invalid_hash",
            CivsyncError::HashNotFound { .. } => "hash_not_found",
            CivsyncError::ModelNotFound { .. } => "not_found",
            CivsyncError::UserNotFound { .. } => "user_not_found",
            CivsyncError::NoItems => "no_items",
            CivsyncError::CorruptSidecar { .. } => "corrupt_sidecar",
            CivsyncError::UnresolvedFolder { .. } => "path_not_found",
            CivsyncError::Io { .. } => "io",
            CivsyncError::Json { .. } => "json",
            CivsyncError::Config { .. } => "config",
            CivsyncError::Validation { .. } => "validation",
            CivsyncError::Other(_) => "other",
        }
    }

    /// Human-readable message suitable for showing in place of results.
    pub fn user_message(&self) -> String {
        match self {
            CivsyncError::Timeout(_) => "The catalog API has timed out, please try again. \
                The servers might be too busy or down if the issue persists."
                .to_string(),
            CivsyncError::ServiceUnavailable { .. } => {
                "The catalog servers are currently offline. Please try again later.".to_string()
            }
            CivsyncError::ModelNotFound { .. } => {
                "Model ID not found in the catalog. Maybe the model doesn't exist?".to_string()
            }
            CivsyncError::UserNotFound { username } => {
                format!("No models found for user \"{}\".", username)
            }
            CivsyncError::NoItems => "Failed to retrieve any models from the catalog. \
                The servers might be too busy or down if the issue persists."
                .to_string(),
            CivsyncError::InvalidHash { .. } => {
                "Invalid hash. Please enter a valid SHA256 hash (64 hexadecimal characters)."
                    .to_string()
            }
            CivsyncError::HashNotFound { .. } => {
                "No model found for this SHA256 hash in the catalog.".to_string()
            }
            CivsyncError::NoSuchPage { page } => {
                format!("Page {} has not been visited yet. Browse to it with next/previous.", page)
            }
            CivsyncError::UnresolvedFolder { .. } => {
                "Local model not found. Could not locate the model path.".to_string()
            }
            other => format!("The catalog API failed: {}", other),
        }
    }

    /// Whether this error came from the remote side rather than local state.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            CivsyncError::Timeout(_)
                | CivsyncError::Network { .. }
                | CivsyncError::ServiceUnavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CivsyncError::ModelNotFound {
            model_id: "4201".into(),
        };
        assert_eq!(err.to_string(), "Model not found: 4201");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            CivsyncError::InvalidHash {
                input: "abc123".into()
            }
            .error_kind(),
            "invalid_hash"
        );
        assert_eq!(
            CivsyncError::HashNotFound { hash: "AB".into() }.error_kind(),
            "hash_not_found"
        );
        assert_eq!(
            CivsyncError::Timeout(Duration::from_secs(30)).error_kind(),
            "timeout"
        );
        assert_eq!(
            CivsyncError::ServiceUnavailable {
                message: "<html>".into()
            }
            .error_kind(),
            "offline"
        );
    }

    #[test]
    fn test_not_found_detection() {
        let err = CivsyncError::Network {
            message: "404".into(),
            status: Some(404),
        };
        assert!(err.is_not_found());
        assert!(err.is_remote());

        let err = CivsyncError::Network {
            message: "500".into(),
            status: Some(500),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_user_message_never_empty() {
        let errors = [
            CivsyncError::NoItems,
            CivsyncError::NoSuchPage { page: 4 },
            CivsyncError::Other("boom".into()),
        ];
        for err in errors {
            assert!(!err.user_message().is_empty());
        }
    }
}
