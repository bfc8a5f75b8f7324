//! Pipeline definitions
//!
//! A pipeline names an input file, declares the type of every feature column,
//! and lists the operators to apply in order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::feature_type::FeatureType;
use crate::transformer::ColumnSelection;

/// A pipeline definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline name (must be unique within project)
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Input file, relative to the project (`.jsonl` or `.csv`)
    pub input: String,

    /// Field holding the label
    pub label: String,

    /// Feature columns, in order
    pub features: Vec<FeatureSpec>,

    /// Operators to apply, in order
    #[serde(default)]
    pub steps: Vec<StepConfig>,

    /// Optional output file for the terminal dataset (JSONL)
    #[serde(default)]
    pub output: Option<String>,
}

/// One declared feature column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSpec {
    /// Field name in the input file
    pub name: String,

    /// Declared feature type
    #[serde(rename = "type")]
    pub feature_type: FeatureType,
}

/// Step configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepConfig {
    /// Operator applied to every accepted column
    Simple(String),

    /// Operator applied to explicit columns
    Targeted {
        /// Registry name of the operator
        operator: String,
        /// Column indices in the node the step is applied to
        #[serde(default)]
        columns: Option<Vec<usize>>,
    },
}

impl StepConfig {
    /// Registry name of the operator
    pub fn operator(&self) -> &str {
        match self {
            StepConfig::Simple(name) => name,
            StepConfig::Targeted { operator, .. } => operator,
        }
    }

    /// Columns the step touches
    pub fn selection(&self) -> ColumnSelection {
        match self {
            StepConfig::Targeted {
                columns: Some(columns),
                ..
            } => ColumnSelection::Indices(columns.clone()),
            _ => ColumnSelection::Accepted,
        }
    }
}

impl Pipeline {
    /// Declared feature names, in column order
    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    /// Declared feature types, in column order
    pub fn feature_types(&self) -> Vec<FeatureType> {
        self.features.iter().map(|f| f.feature_type).collect()
    }

    /// Check the definition for structural problems
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Error::ConfigInvalid {
            message: format!("pipeline '{}': {}", self.name, message),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty".to_string()));
        }
        if self.features.is_empty() {
            return Err(invalid("at least one feature is required".to_string()));
        }

        let mut seen = HashSet::new();
        for feature in &self.features {
            if !seen.insert(feature.name.as_str()) {
                return Err(invalid(format!("duplicate feature '{}'", feature.name)));
            }
        }
        if seen.contains(self.label.as_str()) {
            return Err(invalid(format!(
                "label '{}' is also declared as a feature",
                self.label
            )));
        }
        if let Some(step) = self.steps.iter().find(|s| s.operator().trim().is_empty()) {
            return Err(invalid(format!("empty operator name in step {:?}", step)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pipeline() {
        let yaml = r#"
name: text_features
input: data/train.jsonl
label: label
features:
  - { name: score, type: numerical }
  - { name: title, type: text }
  - { name: body, type: text }
  - { name: votes, type: discrete }
steps:
  - text2vector
  - operator: standard_scaler
    columns: [0]
output: data/out.jsonl
"#;
        let pipeline: Pipeline = serde_yaml::from_str(yaml).unwrap();
        pipeline.validate().unwrap();
        assert_eq!(
            pipeline.feature_types(),
            vec![
                FeatureType::Numerical,
                FeatureType::Text,
                FeatureType::Text,
                FeatureType::Discrete
            ]
        );
        assert_eq!(pipeline.steps.len(), 2);
        assert_eq!(pipeline.steps[0].operator(), "text2vector");
        assert_eq!(pipeline.steps[0].selection(), ColumnSelection::Accepted);
        assert_eq!(pipeline.steps[1].operator(), "standard_scaler");
        assert_eq!(
            pipeline.steps[1].selection(),
            ColumnSelection::Indices(vec![0])
        );
        assert_eq!(pipeline.output.as_deref(), Some("data/out.jsonl"));
    }

    #[test]
    fn test_targeted_step_without_columns() {
        let step: StepConfig = serde_yaml::from_str("operator: one_hot").unwrap();
        assert_eq!(step.operator(), "one_hot");
        assert_eq!(step.selection(), ColumnSelection::Accepted);
    }

    #[test]
    fn test_duplicate_feature_rejected() {
        let yaml = r#"
name: dup
input: in.csv
label: y
features:
  - { name: a, type: numerical }
  - { name: a, type: text }
"#;
        let pipeline: Pipeline = serde_yaml::from_str(yaml).unwrap();
        let err = pipeline.validate().unwrap_err().to_string();
        assert!(err.contains("duplicate feature 'a'"));
    }

    #[test]
    fn test_label_cannot_be_feature() {
        let yaml = r#"
name: leak
input: in.csv
label: a
features:
  - { name: a, type: numerical }
"#;
        let pipeline: Pipeline = serde_yaml::from_str(yaml).unwrap();
        assert!(pipeline.validate().is_err());
    }
}
