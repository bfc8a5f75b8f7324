//! Registry entries

use std::fmt;
use std::path::PathBuf;

use tessel_core::{Capability, Signature, Transformer};

use crate::operator::{OperatorKind, Params};

/// Where a descriptor came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Package identity given to discovery
    pub package: String,
    /// Manifest path; `None` for entries taken straight from the table
    pub path: Option<PathBuf>,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} ({})", self.package, path.display()),
            None => f.write_str(&self.package),
        }
    }
}

/// A named, constructible operator with its declared signature
#[derive(Debug, Clone)]
pub struct TransformerDescriptor {
    name: String,
    kind: OperatorKind,
    params: Params,
    description: Option<String>,
    signature: Signature,
    source: Source,
}

impl TransformerDescriptor {
    /// Build a descriptor, instantiating the operator once to validate
    /// `params` and capture its signature.
    pub fn new(
        name: impl Into<String>,
        kind: OperatorKind,
        params: Params,
        source: Source,
    ) -> tessel_core::Result<Self> {
        let name = name.into();
        let prototype = (kind.build)(&name, &params)?;
        let signature = prototype.signature().clone();
        Ok(Self {
            name,
            kind,
            params,
            description: None,
            signature,
            source,
        })
    }

    /// Replace the kind's description in listings
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Registry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operator kind name
    pub fn kind(&self) -> &'static str {
        self.kind.name
    }

    /// Description from the manifest, or the kind's own
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(self.kind.description)
    }

    /// Operations the operator provides
    pub fn capabilities(&self) -> &'static [Capability] {
        self.kind.capabilities
    }

    /// Parameters passed to the constructor
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Declared type constraints
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Origin of the descriptor
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Create a fresh, unfitted transformer
    pub fn instantiate(&self) -> tessel_core::Result<Box<dyn Transformer>> {
        (self.kind.build)(&self.name, &self.params)
    }
}

impl PartialEq for TransformerDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind.name == other.kind.name
            && self.params == other.params
            && self.signature == other.signature
            && self.source == other.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;

    #[test]
    fn test_descriptor_captures_signature() {
        let kind = *builtins::table().get("text2vector").unwrap();
        let params: Params = serde_yaml::from_str("dimensions: 3").unwrap();
        let descriptor = TransformerDescriptor::new(
            "text_hash",
            kind,
            params,
            Source {
                package: "operators".to_string(),
                path: Some(PathBuf::from("operators/text_hash.yaml")),
            },
        )
        .unwrap();

        assert_eq!(descriptor.name(), "text_hash");
        assert_eq!(descriptor.kind(), "text2vector");
        assert!(descriptor.signature().accepts(tessel_core::FeatureType::Text));
        assert_eq!(
            descriptor.source().to_string(),
            "operators (operators/text_hash.yaml)"
        );

        let instance = descriptor.instantiate().unwrap();
        assert_eq!(instance.name(), "text_hash");
    }

    #[test]
    fn test_invalid_params_fail_construction() {
        let kind = *builtins::table().get("text2vector").unwrap();
        let params: Params = serde_yaml::from_str("dimensions: 0").unwrap();
        let result = TransformerDescriptor::new(
            "broken",
            kind,
            params,
            Source {
                package: "operators".to_string(),
                path: None,
            },
        );
        assert!(result.is_err());
    }
}
