//! Error types for tessel-core

use thiserror::Error;

use crate::feature_type::FeatureType;

/// Result type alias for tessel-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tessel-core
#[derive(Error, Debug)]
pub enum Error {
    /// Declared and actual dataset shapes disagree
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// What was being checked (e.g. "feature types", "column 2")
        context: String,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// A transformer was pointed at a column whose type it does not accept
    #[error(
        "transformer '{transformer}' does not accept column {column} of type {found} (accepts: {})",
        format_types(.accepted)
    )]
    TypeMismatch {
        /// Transformer name
        transformer: String,
        /// Offending column index
        column: usize,
        /// Type tag of the offending column
        found: FeatureType,
        /// Types the transformer accepts
        accepted: Vec<FeatureType>,
    },

    /// A column selection referenced a column that does not exist
    #[error("column {column} is out of range for a dataset with {n_columns} columns")]
    ColumnOutOfRange {
        /// Requested column index
        column: usize,
        /// Number of columns in the dataset
        n_columns: usize,
    },

    /// No column of the node is eligible for the transformer
    #[error("transformer '{transformer}' has no applicable columns")]
    NoApplicableColumns {
        /// Transformer name
        transformer: String,
    },

    /// A row-preserving transformer returned a different number of rows
    #[error("transformer '{transformer}' changed the row count from {before} to {after}")]
    RowCountChanged {
        /// Transformer name
        transformer: String,
        /// Rows before the transform
        before: usize,
        /// Rows after the transform
        after: usize,
    },

    /// A transformer returned labels without declaring that it rewrites them
    #[error("transformer '{transformer}' rewrote labels without declaring it")]
    LabelsChanged {
        /// Transformer name
        transformer: String,
    },

    /// Transformer fit or transform failure
    #[error("transform error in '{transformer}': {message}")]
    TransformFailed {
        /// Transformer name
        transformer: String,
        /// Description of the error
        message: String,
    },

    /// Invalid transformer parameter
    #[error("invalid parameter '{parameter}': {message}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Description of what's invalid
        message: String,
    },

    /// Configuration file could not be found
    #[error("configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched
        path: String,
    },

    /// Failed to parse YAML configuration
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Invalid configuration value
    #[error("invalid configuration: {message}")]
    ConfigInvalid {
        /// Description of what's invalid
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_types(types: &[FeatureType]) -> String {
    types
        .iter()
        .map(FeatureType::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Build a [`Error::TransformFailed`] for the given transformer
    pub fn transform(transformer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransformFailed {
            transformer: transformer.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_names_column_and_types() {
        let err = Error::TypeMismatch {
            transformer: "standard_scaler".to_string(),
            column: 1,
            found: FeatureType::Text,
            accepted: vec![FeatureType::Numerical],
        };
        let msg = err.to_string();
        assert!(msg.contains("column 1"));
        assert!(msg.contains("text"));
        assert!(msg.contains("numerical"));
    }

    #[test]
    fn test_shape_mismatch_display() {
        let err = Error::ShapeMismatch {
            context: "feature types".to_string(),
            expected: 4,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "shape mismatch in feature types: expected 4, got 3"
        );
    }
}
