//! Tessel Operator Catalog
//!
//! This crate discovers feature-engineering operators and exposes them as a
//! name-keyed registry for pipeline search.
//!
//! # Discovery Overview
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Operator    │────▶│  Manifests   │────▶│  Component   │
//! │  Table       │     │ (search dir) │     │  Registry    │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Built-in operators are collected into a static [`OperatorTable`] at compile
//! time. A search directory holds YAML manifests that instantiate table
//! entries under new names with their own parameters; dropping a manifest into
//! the directory is all it takes to make an operator available to the search.
//!
//! # Example
//!
//! ```rust,ignore
//! use tessel_catalog::{builtins, ComponentRegistry, DiscoveryOptions};
//! use tessel_core::Capability;
//!
//! let registry = ComponentRegistry::new(builtins::table(), DiscoveryOptions::default());
//! let report = registry.discover("operators", "./operators", &[Capability::Fit, Capability::Transform])?;
//! for descriptor in registry.all().iter() {
//!     println!("{}: {:?}", descriptor.name(), descriptor.signature());
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builtins;
pub mod descriptor;
pub mod error;
pub mod manifest;
pub mod operator;
pub mod registry;

pub use descriptor::{Source, TransformerDescriptor};
pub use error::{DiscoveryError, DiscoveryErrorKind, Error, Result};
pub use operator::{OperatorKind, OperatorTable, Params};
pub use registry::{ComponentRegistry, DiscoveryOptions, DiscoveryReport, Exclusion, Snapshot};
