//! Feature-type taxonomy
//!
//! Every column of a dataset carries exactly one [`FeatureType`] tag. The tag
//! sequence is the only source of type information: transformers are checked
//! against it and never inspect cell contents to guess a column's semantics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Semantic classification of a dataset column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    /// Continuous numeric values
    Numerical,
    /// Integer-valued counts or codes
    Discrete,
    /// Unordered categories
    Categorical,
    /// Ordered categories
    Ordinal,
    /// Free-form text
    Text,
}

impl FeatureType {
    /// All feature types, in declaration order
    pub const ALL: [FeatureType; 5] = [
        FeatureType::Numerical,
        FeatureType::Discrete,
        FeatureType::Categorical,
        FeatureType::Ordinal,
        FeatureType::Text,
    ];

    /// Lowercase name used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numerical => "numerical",
            Self::Discrete => "discrete",
            Self::Categorical => "categorical",
            Self::Ordinal => "ordinal",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        FeatureType::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| Error::ConfigInvalid {
                message: format!("unknown feature type '{}'", s),
            })
    }
}
