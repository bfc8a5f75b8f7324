//! Error types for the operator catalog

use std::path::PathBuf;
use thiserror::Error;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the catalog
#[derive(Error, Debug)]
pub enum Error {
    /// No descriptor is registered under the name
    #[error("operator not found: {name}")]
    NotFound {
        /// Requested name
        name: String,
    },

    /// The search location is missing or not a readable directory
    #[error("search location '{path}' is not readable: {message}")]
    LocationUnreadable {
        /// Search location as given
        path: String,
        /// Why it could not be read
        message: String,
    },

    /// A candidate failed to load and discovery runs in fail-fast mode
    #[error("discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Error from the core library (e.g. instantiation)
    #[error(transparent)]
    Core(#[from] tessel_core::Error),
}

/// A candidate that could not be registered
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}: {kind}", .path.display())]
pub struct DiscoveryError {
    /// Manifest path (or `<builtin>/<kind>` for table entries)
    pub path: PathBuf,
    /// What went wrong
    pub kind: DiscoveryErrorKind,
}

/// Why a candidate could not be registered
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoveryErrorKind {
    /// The file could not be read
    #[error("unreadable: {0}")]
    Unreadable(String),

    /// The file is not a valid operator manifest
    #[error("malformed manifest: {0}")]
    Malformed(String),

    /// The manifest names an operator kind missing from the table
    #[error("unknown operator kind '{kind}'")]
    UnknownKind {
        /// Requested kind
        kind: String,
    },

    /// The operator rejected the manifest's parameters
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Another descriptor already holds the name
    #[error("name '{name}' is already registered from {existing}")]
    NameConflict {
        /// Contested name
        name: String,
        /// Source of the descriptor that kept the name
        existing: String,
    },
}

impl DiscoveryError {
    /// Build an error for `path`
    pub fn new(path: impl Into<PathBuf>, kind: DiscoveryErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_error_display_includes_path() {
        let err = DiscoveryError::new(
            "operators/tfidf.yaml",
            DiscoveryErrorKind::UnknownKind {
                kind: "tfidf".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "operators/tfidf.yaml: unknown operator kind 'tfidf'"
        );
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::NotFound {
            name: "pca".to_string(),
        };
        assert_eq!(err.to_string(), "operator not found: pca");
    }
}
