//! Dataset graph
//!
//! A [`DatasetNode`] is an immutable snapshot of a dataset together with one
//! [`FeatureType`] per column. Applying a transformer never touches the node
//! it is applied to; it produces a child that points back at its parent and
//! remembers the fitted transformer, forming a tree of lineages that a search
//! can branch from freely.
//!
//! Nodes are cheap to clone (`Arc`) and `Send + Sync`, so several search
//! branches may apply different transformers to the same parent in parallel.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::dataset::{Column, Dataset, Value};
use crate::error::{Error, Result};
use crate::feature_type::FeatureType;
use crate::transformer::{ColumnSelection, LabelPolicy, RowPolicy, Signature, Transformer};

/// Where a node sits in its lineage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Built from raw input; has no parent
    Root,
    /// Produced by applying one transformer to one parent
    Derived,
}

/// One edge of a lineage: the fitted transformer and the columns it touched
#[derive(Debug, Clone)]
pub struct Step {
    transformer: Arc<dyn Transformer>,
    columns: Vec<usize>,
}

impl Step {
    /// Name of the applied transformer
    pub fn name(&self) -> &str {
        self.transformer.name()
    }

    /// Indices (in the parent) of the touched columns
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    /// The fitted transformer
    pub fn transformer(&self) -> &Arc<dyn Transformer> {
        &self.transformer
    }
}

enum Origin {
    Root,
    Derived { parent: DatasetNode, step: Step },
}

struct NodeInner {
    id: Uuid,
    data: Dataset,
    feature_types: Vec<FeatureType>,
    origin: Origin,
}

// Unwind uniquely owned ancestors in a loop so dropping a deep lineage
// does not recurse once per node.
impl Drop for NodeInner {
    fn drop(&mut self) {
        let mut origin = std::mem::replace(&mut self.origin, Origin::Root);
        while let Origin::Derived { parent, .. } = origin {
            match Arc::try_unwrap(parent.inner) {
                Ok(mut inner) => origin = std::mem::replace(&mut inner.origin, Origin::Root),
                Err(_) => break,
            }
        }
    }
}

/// Immutable, type-tagged dataset snapshot in a transformation lineage
#[derive(Clone)]
pub struct DatasetNode {
    inner: Arc<NodeInner>,
}

impl DatasetNode {
    /// Build a root node from raw columns, labels, and one type per column.
    ///
    /// # Errors
    ///
    /// [`Error::ShapeMismatch`] if the type count differs from the column
    /// count or a column's length differs from the label count.
    pub fn create_root(
        columns: Vec<Column>,
        labels: impl Into<Arc<[Value]>>,
        feature_types: Vec<FeatureType>,
    ) -> Result<Self> {
        if feature_types.len() != columns.len() {
            return Err(Error::ShapeMismatch {
                context: "feature types".to_string(),
                expected: columns.len(),
                actual: feature_types.len(),
            });
        }
        let data = Dataset::new(columns, labels)?;
        Self::from_dataset(data, feature_types)
    }

    /// Build a root node from an already-assembled dataset
    pub fn from_dataset(data: Dataset, feature_types: Vec<FeatureType>) -> Result<Self> {
        if feature_types.len() != data.n_columns() {
            return Err(Error::ShapeMismatch {
                context: "feature types".to_string(),
                expected: data.n_columns(),
                actual: feature_types.len(),
            });
        }
        let node = Self::new_node(data, feature_types, Origin::Root);
        tracing::debug!(
            node = %node.id(),
            rows = node.n_rows(),
            columns = node.n_columns(),
            "created root node"
        );
        Ok(node)
    }

    fn new_node(data: Dataset, feature_types: Vec<FeatureType>, origin: Origin) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                id: Uuid::new_v4(),
                data,
                feature_types,
                origin,
            }),
        }
    }

    /// Unique node id
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Root or derived
    pub fn state(&self) -> NodeState {
        match self.inner.origin {
            Origin::Root => NodeState::Root,
            Origin::Derived { .. } => NodeState::Derived,
        }
    }

    /// Dataset payload
    pub fn data(&self) -> &Dataset {
        &self.inner.data
    }

    /// Per-column type tags
    pub fn feature_types(&self) -> &[FeatureType] {
        &self.inner.feature_types
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.inner.data.n_rows()
    }

    /// Number of feature columns
    pub fn n_columns(&self) -> usize {
        self.inner.data.n_columns()
    }

    /// Parent node, if derived
    pub fn parent(&self) -> Option<&DatasetNode> {
        match &self.inner.origin {
            Origin::Root => None,
            Origin::Derived { parent, .. } => Some(parent),
        }
    }

    /// Step that produced this node, if derived
    pub fn step(&self) -> Option<&Step> {
        match &self.inner.origin {
            Origin::Root => None,
            Origin::Derived { step, .. } => Some(step),
        }
    }

    /// Number of steps between this node and its root
    pub fn depth(&self) -> usize {
        self.lineage().count() - 1
    }

    /// Nodes from this one back to the root, child first
    pub fn lineage(&self) -> Lineage {
        Lineage {
            next: Some(self.clone()),
        }
    }

    /// Steps from the root down to this node
    pub fn steps(&self) -> Vec<Step> {
        let mut steps: Vec<Step> = self.lineage().filter_map(|n| n.step().cloned()).collect();
        steps.reverse();
        steps
    }

    /// SHA-256 digest of the step sequence leading to this node.
    ///
    /// Two nodes reached through the same operators on the same columns share
    /// a fingerprint regardless of which root or branch produced them.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for step in self.steps() {
            hasher.update(step.name().as_bytes());
            hasher.update([0u8]);
            for column in step.columns() {
                hasher.update((*column as u64).to_le_bytes());
            }
            hasher.update([0xffu8]);
        }
        hex::encode(hasher.finalize())
    }

    /// Fit `transformer` on every column it accepts and derive a child node
    pub fn apply(&self, transformer: Box<dyn Transformer>) -> Result<DatasetNode> {
        self.apply_with(transformer, &ColumnSelection::Accepted)
    }

    /// Fit `transformer` on the selected columns and derive a child node.
    ///
    /// Selected indices are applied in ascending order; duplicates collapse.
    ///
    /// # Errors
    ///
    /// - [`Error::ColumnOutOfRange`] for an index past the last column
    /// - [`Error::TypeMismatch`] for a selected column whose type is not accepted
    /// - [`Error::NoApplicableColumns`] when nothing is selected
    /// - any fit/transform error, or a violation of the declared signature
    pub fn apply_with(
        &self,
        mut transformer: Box<dyn Transformer>,
        selection: &ColumnSelection,
    ) -> Result<DatasetNode> {
        let columns = self.resolve(transformer.name(), transformer.signature(), selection)?;
        transformer.fit(&self.inner.data, &columns)?;
        self.derive(Arc::from(transformer), columns)
    }

    /// Re-apply the fitted steps of this node's lineage onto `base`.
    ///
    /// Transformers are not refitted; each step touches the same column
    /// indices it touched originally, and types are checked again.
    pub fn replay(&self, base: &DatasetNode) -> Result<DatasetNode> {
        let mut current = base.clone();
        for step in self.steps() {
            let columns = current.resolve(
                step.name(),
                step.transformer.signature(),
                &ColumnSelection::Indices(step.columns.clone()),
            )?;
            current = current.derive(step.transformer.clone(), columns)?;
        }
        Ok(current)
    }

    fn resolve(
        &self,
        name: &str,
        signature: &Signature,
        selection: &ColumnSelection,
    ) -> Result<Vec<usize>> {
        let types = self.feature_types();
        let columns: Vec<usize> = match selection {
            ColumnSelection::Accepted => (0..types.len())
                .filter(|&i| signature.accepts(types[i]))
                .collect(),
            ColumnSelection::Indices(indices) => {
                let mut columns = indices.clone();
                columns.sort_unstable();
                columns.dedup();
                for &column in &columns {
                    let found = *types.get(column).ok_or(Error::ColumnOutOfRange {
                        column,
                        n_columns: types.len(),
                    })?;
                    if !signature.accepts(found) {
                        return Err(Error::TypeMismatch {
                            transformer: name.to_string(),
                            column,
                            found,
                            accepted: signature.input_types.iter().copied().collect(),
                        });
                    }
                }
                columns
            }
        };

        if columns.is_empty() {
            return Err(Error::NoApplicableColumns {
                transformer: name.to_string(),
            });
        }
        Ok(columns)
    }

    fn derive(&self, transformer: Arc<dyn Transformer>, columns: Vec<usize>) -> Result<DatasetNode> {
        let name = transformer.name().to_string();
        let signature = transformer.signature().clone();
        let parent = &self.inner.data;
        let before = parent.n_rows();

        let output = transformer.transform(parent, &columns)?;

        if output.replacements.len() != columns.len() {
            return Err(Error::ShapeMismatch {
                context: format!("replacement columns from '{}'", name),
                expected: columns.len(),
                actual: output.replacements.len(),
            });
        }

        let kept_rows = match (signature.rows, output.kept_rows) {
            (_, None) => None,
            (RowPolicy::Preserve, Some(kept)) => {
                if kept.len() != before || kept.iter().enumerate().any(|(i, &r)| i != r) {
                    return Err(Error::RowCountChanged {
                        transformer: name,
                        before,
                        after: kept.len(),
                    });
                }
                None
            }
            (RowPolicy::MayChange, Some(kept)) => {
                if let Some(&row) = kept.iter().find(|&&r| r >= before) {
                    return Err(Error::transform(
                        name,
                        format!("kept row {} is out of range for {} rows", row, before),
                    ));
                }
                if let Some(pair) = kept.windows(2).find(|w| w[0] >= w[1]) {
                    return Err(Error::transform(
                        name,
                        format!(
                            "kept rows must be strictly increasing, found {} then {}",
                            pair[0], pair[1]
                        ),
                    ));
                }
                Some(kept)
            }
        };
        let after = kept_rows.as_ref().map_or(before, Vec::len);

        let labels: Arc<[Value]> = match (signature.labels, output.labels) {
            (LabelPolicy::Carry, Some(_)) => {
                return Err(Error::LabelsChanged { transformer: name });
            }
            (LabelPolicy::Rewrites, Some(labels)) => {
                if labels.len() != after {
                    return Err(match signature.rows {
                        RowPolicy::Preserve => Error::RowCountChanged {
                            transformer: name,
                            before,
                            after: labels.len(),
                        },
                        RowPolicy::MayChange => Error::ShapeMismatch {
                            context: format!("labels from '{}'", name),
                            expected: after,
                            actual: labels.len(),
                        },
                    });
                }
                labels
            }
            (_, None) => match &kept_rows {
                Some(kept) => select_rows(parent.labels(), kept),
                None => parent.labels().clone(),
            },
        };

        let touched: HashMap<usize, usize> =
            columns.iter().enumerate().map(|(k, &c)| (c, k)).collect();
        let mut replacements = output.replacements;
        let mut new_columns = Vec::with_capacity(parent.n_columns());
        let mut new_types = Vec::with_capacity(parent.n_columns());

        for (index, column) in parent.columns().iter().enumerate() {
            match touched.get(&index) {
                Some(&k) => {
                    for replacement in std::mem::take(&mut replacements[k]) {
                        if replacement.len() != after {
                            return Err(if signature.rows == RowPolicy::Preserve {
                                Error::RowCountChanged {
                                    transformer: name,
                                    before,
                                    after: replacement.len(),
                                }
                            } else {
                                Error::ShapeMismatch {
                                    context: format!("output of '{}' for column {}", name, index),
                                    expected: after,
                                    actual: replacement.len(),
                                }
                            });
                        }
                        new_columns.push(replacement);
                        new_types.push(signature.output_for(self.inner.feature_types[index]));
                    }
                }
                None => {
                    new_columns.push(match &kept_rows {
                        Some(kept) => select_rows(column, kept),
                        None => column.clone(),
                    });
                    new_types.push(self.inner.feature_types[index]);
                }
            }
        }

        let data = Dataset::new(new_columns, labels)?;
        let child = Self::new_node(
            data,
            new_types,
            Origin::Derived {
                parent: self.clone(),
                step: Step {
                    transformer,
                    columns,
                },
            },
        );

        tracing::debug!(
            transformer = %name,
            parent = %self.id(),
            child = %child.id(),
            rows = child.n_rows(),
            columns = child.n_columns(),
            "applied transformer"
        );
        Ok(child)
    }
}

fn select_rows(values: &[Value], rows: &[usize]) -> Arc<[Value]> {
    rows.iter().map(|&r| values[r].clone()).collect()
}

impl PartialEq for DatasetNode {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for DatasetNode {}

impl fmt::Debug for DatasetNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetNode")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("rows", &self.n_rows())
            .field("feature_types", &self.inner.feature_types)
            .field("step", &self.step().map(Step::name))
            .finish()
    }
}

/// Iterator over a node and its ancestors, child first
#[derive(Debug, Clone)]
pub struct Lineage {
    next: Option<DatasetNode>,
}

impl Iterator for Lineage {
    type Item = DatasetNode;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.parent().cloned();
        Some(current)
    }
}
