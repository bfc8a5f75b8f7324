//! Operator manifest parser
//!
//! A manifest is a YAML file in the search location that instantiates an
//! operator kind under the file's name:
//!
//! ```yaml
//! # operators/title_hash.yaml -> registered as "title_hash"
//! kind: text2vector
//! description: Hashed token counts for titles
//! params:
//!   dimensions: 16
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::error::DiscoveryErrorKind;
use crate::operator::Params;

/// Parsed manifest
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Operator kind from the static table
    pub kind: String,

    /// Description shown in listings instead of the kind's own
    #[serde(default)]
    pub description: Option<String>,

    /// Constructor parameters
    #[serde(default)]
    pub params: Params,
}

/// Whether `path` looks like a manifest file
pub fn is_manifest(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml")
}

/// Registry name for the manifest at `path` (its file stem)
pub fn manifest_name(path: &Path) -> Option<&str> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
}

/// Read and parse the manifest at `path`
pub fn load(path: &Path) -> Result<Manifest, DiscoveryErrorKind> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| DiscoveryErrorKind::Unreadable(e.to_string()))?;
    parse(&contents)
}

/// Parse a manifest from YAML text
pub fn parse(yaml: &str) -> Result<Manifest, DiscoveryErrorKind> {
    let manifest: Manifest =
        serde_yaml::from_str(yaml).map_err(|e| DiscoveryErrorKind::Malformed(e.to_string()))?;
    if manifest.kind.trim().is_empty() {
        return Err(DiscoveryErrorKind::Malformed(
            "kind must not be empty".to_string(),
        ));
    }
    Ok(manifest)
}
