//! Tessel Core Library
//!
//! This crate provides the core functionality for Tessel:
//! - Feature-type taxonomy for dataset columns
//! - Columnar datasets with aligned labels
//! - The transformer contract (fit/transform with declared type signatures)
//! - The dataset graph: immutable, type-tagged nodes linked by lineage
//! - Project and pipeline configuration parsing
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Root Node  │────▶│ Transformer │────▶│ Child Node  │──▶ ...
//! │ (raw data)  │     │ (fit+apply) │     │  (derived)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use tessel_core::{DatasetNode, FeatureType};
//!
//! let root = DatasetNode::create_root(columns, labels, vec![FeatureType::Text])?;
//! let child = root.apply(vectorizer)?;
//! for node in child.lineage() {
//!     println!("{} ({:?})", node.id(), node.state());
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dataset;
pub mod error;
pub mod feature_type;
pub mod graph;
pub mod pipeline;
pub mod transformer;

pub use config::{Config, ProjectConfig};
pub use dataset::{Column, Dataset, Value};
pub use error::{Error, Result};
pub use feature_type::FeatureType;
pub use graph::{DatasetNode, Lineage, NodeState, Step};
pub use pipeline::Pipeline;
pub use transformer::{
    Capability, ColumnSelection, LabelPolicy, RowPolicy, Signature, TransformOutput, Transformer,
};
