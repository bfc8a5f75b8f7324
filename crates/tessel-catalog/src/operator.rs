//! Static operator table
//!
//! Every operator module exposes a `KIND` constant: its name, the capabilities
//! it provides, and a constructor. The table collects those constants once;
//! discovery and the registry only ever instantiate operators through it.

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use tessel_core::{Capability, Transformer};

/// Operator parameters, as written in a manifest
pub type Params = serde_yaml::Value;

/// Constructor: instance name and parameters to an unfitted transformer
pub type BuildFn = fn(&str, &Params) -> tessel_core::Result<Box<dyn Transformer>>;

/// A constructible operator kind
#[derive(Debug, Clone, Copy)]
pub struct OperatorKind {
    /// Kind name referenced by manifests
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Operations the kind provides
    pub capabilities: &'static [Capability],
    /// Constructor
    pub build: BuildFn,
}

impl OperatorKind {
    /// Whether the kind provides every capability in `required`
    pub fn provides(&self, required: &[Capability]) -> bool {
        required.iter().all(|c| self.capabilities.contains(c))
    }

    /// Required capabilities the kind lacks
    pub fn missing(&self, required: &[Capability]) -> Vec<Capability> {
        required
            .iter()
            .filter(|c| !self.capabilities.contains(c))
            .copied()
            .collect()
    }
}

/// Name-keyed collection of operator kinds
#[derive(Debug, Clone, Default)]
pub struct OperatorTable {
    kinds: BTreeMap<&'static str, OperatorKind>,
}

impl OperatorTable {
    /// Collect kinds into a table; a repeated kind name keeps the first entry
    pub fn new(kinds: impl IntoIterator<Item = OperatorKind>) -> Self {
        let mut table = BTreeMap::new();
        for kind in kinds {
            if table.contains_key(kind.name) {
                tracing::warn!(kind = kind.name, "duplicate operator kind ignored");
                continue;
            }
            table.insert(kind.name, kind);
        }
        Self { kinds: table }
    }

    /// Look up a kind by name
    pub fn get(&self, name: &str) -> Option<&OperatorKind> {
        self.kinds.get(name)
    }

    /// All kinds, in name order
    pub fn iter(&self) -> impl Iterator<Item = &OperatorKind> {
        self.kinds.values()
    }

    /// Number of kinds
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// Deserialize operator parameters, falling back to defaults when absent
pub fn parse_params<T>(kind: &str, params: &Params) -> tessel_core::Result<T>
where
    T: DeserializeOwned + Default,
{
    if params.is_null() {
        return Ok(T::default());
    }
    serde_yaml::from_value(params.clone()).map_err(|e| tessel_core::Error::InvalidParameter {
        parameter: kind.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default, deny_unknown_fields)]
    struct Knobs {
        size: usize,
    }

    fn never(_: &str, _: &Params) -> tessel_core::Result<Box<dyn Transformer>> {
        Err(tessel_core::Error::transform("never", "not constructible"))
    }

    const FIT_ONLY: OperatorKind = OperatorKind {
        name: "fit_only",
        description: "test kind",
        capabilities: &[Capability::Fit],
        build: never,
    };

    #[test]
    fn test_missing_capabilities() {
        assert!(FIT_ONLY.provides(&[Capability::Fit]));
        assert!(!FIT_ONLY.provides(&[Capability::Fit, Capability::Transform]));
        assert_eq!(
            FIT_ONLY.missing(&[Capability::Fit, Capability::Transform]),
            vec![Capability::Transform]
        );
    }

    #[test]
    fn test_table_keeps_first_duplicate() {
        let second = OperatorKind {
            description: "shadow",
            ..FIT_ONLY
        };
        let table = OperatorTable::new([FIT_ONLY, second]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("fit_only").unwrap().description, "test kind");
    }

    #[test]
    fn test_parse_params_defaults_on_null() {
        let knobs: Knobs = parse_params("knobs", &Params::Null).unwrap();
        assert_eq!(knobs, Knobs::default());

        let params: Params = serde_yaml::from_str("size: 4").unwrap();
        let knobs: Knobs = parse_params("knobs", &params).unwrap();
        assert_eq!(knobs.size, 4);
    }

    #[test]
    fn test_parse_params_rejects_unknown_fields() {
        let params: Params = serde_yaml::from_str("colour: red").unwrap();
        let err = parse_params::<Knobs>("knobs", &params).unwrap_err();
        assert!(matches!(err, tessel_core::Error::InvalidParameter { .. }));
    }
}
