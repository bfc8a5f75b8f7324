//! Configuration parsing and validation
//!
//! This module handles loading and validating Tessel project files.
//!
//! # Configuration Files
//!
//! - `tessel.yaml` - Project root configuration
//! - `pipelines/*.yaml` - Individual pipeline definitions
//! - `operators/*.yaml` - Operator manifests picked up by discovery

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::transformer::Capability;

/// Name of the project file looked up in a project directory
pub const PROJECT_FILE: &str = "tessel.yaml";

/// Root project configuration from `tessel.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Project version
    #[serde(default = "default_version")]
    pub version: String,

    /// Operator catalog configuration
    #[serde(default)]
    pub catalog: CatalogConfig,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// How operator discovery behaves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Package identity recorded on discovered descriptors
    #[serde(default = "default_package")]
    pub package: String,

    /// Search location, relative to the project directory
    #[serde(default = "default_operator_path")]
    pub path: String,

    /// Capabilities an operator must provide to be registered
    #[serde(default = "default_require")]
    pub require: Vec<Capability>,

    /// Abort discovery on the first manifest that fails to load
    #[serde(default)]
    pub fail_fast: bool,

    /// What happens when two operators claim the same name
    #[serde(default)]
    pub on_conflict: ConflictPolicy,

    /// Also register every built-in operator under its kind name
    #[serde(default = "default_true")]
    pub builtins: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            package: default_package(),
            path: default_operator_path(),
            require: default_require(),
            fail_fast: false,
            on_conflict: ConflictPolicy::default(),
            builtins: true,
        }
    }
}

fn default_package() -> String {
    "operators".to_string()
}

fn default_operator_path() -> String {
    "operators".to_string()
}

fn default_require() -> Vec<Capability> {
    vec![Capability::Fit, Capability::Transform]
}

fn default_true() -> bool {
    true
}

/// Name collision policy for the operator catalog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Keep the first registration and report the collision
    #[default]
    Reject,
    /// Replace the existing entry
    LastWriteWins,
}

/// Main configuration container
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Base path of the project
    pub base_path: PathBuf,
}

impl Config {
    /// Load configuration from a directory
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the project directory or tessel.yaml file
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = Config::load("./my-project")?;
    /// println!("Project: {}", config.project.name);
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let (config_path, base_path) = if path.is_dir() {
            (path.join(PROJECT_FILE), path.to_path_buf())
        } else {
            (
                path.to_path_buf(),
                path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            )
        };

        if !config_path.exists() {
            return Err(Error::ConfigNotFound {
                path: config_path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let project: ProjectConfig = serde_yaml::from_str(&contents)?;

        if project.catalog.package.trim().is_empty() {
            return Err(Error::ConfigInvalid {
                message: "catalog.package must not be empty".to_string(),
            });
        }

        Ok(Self { project, base_path })
    }

    /// Absolute-ish path of the operator search location
    pub fn operator_dir(&self) -> PathBuf {
        self.base_path.join(&self.project.catalog.path)
    }

    /// Resolve a path from a pipeline or config relative to the project
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    /// Load all pipeline definitions from `pipelines/*.yaml`
    pub fn load_pipelines(&self) -> Result<Vec<Pipeline>> {
        let pipelines_dir = self.base_path.join("pipelines");
        if !pipelines_dir.exists() {
            return Ok(vec![]);
        }

        let mut pipelines = Vec::new();
        let mut entries: Vec<_> = std::fs::read_dir(&pipelines_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml")
            })
            .collect();
        entries.sort_by_key(|e| e.path());

        for entry in entries {
            let contents = std::fs::read_to_string(entry.path())?;
            let pipeline: Pipeline = serde_yaml::from_str(&contents)?;
            pipeline.validate()?;
            pipelines.push(pipeline);
        }
        Ok(pipelines)
    }

    /// Load a single pipeline by name
    pub fn load_pipeline(&self, name: &str) -> Result<Pipeline> {
        self.load_pipelines()?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::ConfigInvalid {
                message: format!("pipeline '{}' not found", name),
            })
    }
}
