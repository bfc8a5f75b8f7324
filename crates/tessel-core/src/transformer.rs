//! Transformer contract
//!
//! A transformer is a pluggable operator that learns from the columns it
//! touches (`fit`) and rewrites them (`transform`). Its [`Signature`] declares
//! which column types it accepts, which type its output columns carry, and
//! whether it may change the row count or the labels. The dataset graph checks
//! these declarations before and after every application.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::dataset::{Column, Dataset, Value};
use crate::error::{Error, Result};
use crate::feature_type::FeatureType;

/// Operations an operator kind provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Learns parameters from data
    Fit,
    /// Rewrites data
    Transform,
    /// Maps transformed data back to the original space
    InverseTransform,
}

/// Whether a transformer may change the number of rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowPolicy {
    /// Output has exactly the input's rows
    #[default]
    Preserve,
    /// Output may keep a subset of rows; kept indices must be reported
    MayChange,
}

/// Whether a transformer may rewrite labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    /// Labels pass through untouched
    #[default]
    Carry,
    /// Transformer returns new labels
    Rewrites,
}

/// Declared type constraints of a transformer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Column types the transformer accepts
    pub input_types: BTreeSet<FeatureType>,
    /// Type of every column produced from a touched column; `None` keeps
    /// the touched column's own type
    pub output_type: Option<FeatureType>,
    /// Row-count behavior
    #[serde(default)]
    pub rows: RowPolicy,
    /// Label behavior
    #[serde(default)]
    pub labels: LabelPolicy,
}

impl Signature {
    /// Signature that accepts `input_types` and tags its output with `output_type`
    pub fn new(input_types: impl IntoIterator<Item = FeatureType>, output_type: FeatureType) -> Self {
        Self {
            input_types: input_types.into_iter().collect(),
            output_type: Some(output_type),
            rows: RowPolicy::Preserve,
            labels: LabelPolicy::Carry,
        }
    }

    /// Signature whose output columns keep their input type
    pub fn preserving(input_types: impl IntoIterator<Item = FeatureType>) -> Self {
        Self {
            input_types: input_types.into_iter().collect(),
            output_type: None,
            rows: RowPolicy::Preserve,
            labels: LabelPolicy::Carry,
        }
    }

    /// Declare that the transformer may drop rows
    pub fn changing_rows(mut self) -> Self {
        self.rows = RowPolicy::MayChange;
        self
    }

    /// Declare that the transformer rewrites labels
    pub fn rewriting_labels(mut self) -> Self {
        self.labels = LabelPolicy::Rewrites;
        self
    }

    /// Whether a column of type `ty` may be touched
    pub fn accepts(&self, ty: FeatureType) -> bool {
        self.input_types.contains(&ty)
    }

    /// Type tag of a column produced from a touched column of type `input`
    pub fn output_for(&self, input: FeatureType) -> FeatureType {
        self.output_type.unwrap_or(input)
    }
}

/// Which columns a transformer touches
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSelection {
    /// Every column whose type the transformer accepts
    #[default]
    Accepted,
    /// Exactly these column indices; each must have an accepted type
    Indices(Vec<usize>),
}

/// Result of a transform call
#[derive(Debug, Clone, Default)]
pub struct TransformOutput {
    /// One entry per touched column, in selection order; each entry holds
    /// the columns that replace it (zero or more)
    pub replacements: Vec<Vec<Column>>,
    /// Indices of kept input rows, for row-changing transformers
    pub kept_rows: Option<Vec<usize>>,
    /// New labels, for label-rewriting transformers
    pub labels: Option<Arc<[Value]>>,
}

impl TransformOutput {
    /// Output that replaces each touched column with the given columns
    pub fn replacing(replacements: Vec<Vec<Column>>) -> Self {
        Self {
            replacements,
            ..Default::default()
        }
    }

    /// Output that replaces each touched column one-for-one
    pub fn one_to_one(columns: Vec<Column>) -> Self {
        Self::replacing(columns.into_iter().map(|c| vec![c]).collect())
    }

    /// Attach the indices of the rows that survived
    pub fn with_kept_rows(mut self, rows: Vec<usize>) -> Self {
        self.kept_rows = Some(rows);
        self
    }

    /// Attach rewritten labels
    pub fn with_labels(mut self, labels: impl Into<Arc<[Value]>>) -> Self {
        self.labels = Some(labels.into());
        self
    }
}

/// A pluggable feature-engineering operator
///
/// `fit` sees the node's full dataset plus the indices of the columns it
/// touches; `transform` must return one replacement entry per touched column.
pub trait Transformer: fmt::Debug + Send + Sync {
    /// Operator name, used in lineage and error messages
    fn name(&self) -> &str;

    /// Declared type constraints
    fn signature(&self) -> &Signature;

    /// Learn parameters from the touched columns
    fn fit(&mut self, data: &Dataset, columns: &[usize]) -> Result<()>;

    /// Rewrite the touched columns using learned parameters
    fn transform(&self, data: &Dataset, columns: &[usize]) -> Result<TransformOutput>;

    /// Map transformed columns back to their original space
    fn inverse_transform(&self, _data: &Dataset, _columns: &[usize]) -> Result<TransformOutput> {
        Err(Error::transform(
            self.name(),
            "inverse transform is not supported",
        ))
    }
}
