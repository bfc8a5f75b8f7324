//! Registry setup shared by the commands

use anyhow::{Context, Result};
use tessel_catalog::{ComponentRegistry, DiscoveryOptions, DiscoveryReport, builtins};
use tessel_core::Config;

/// Registry populated from the project's catalog settings
pub struct Catalog {
    pub registry: ComponentRegistry,
    pub reports: Vec<DiscoveryReport>,
}

/// Build the registry: built-ins first (when enabled), then the search location
pub fn load(config: &Config) -> Result<Catalog> {
    let settings = &config.project.catalog;
    let registry = ComponentRegistry::new(builtins::table(), DiscoveryOptions::from(settings));
    let mut reports = Vec::new();

    if settings.builtins {
        reports.push(registry.register_builtins(&settings.require)?);
    }

    let location = config.operator_dir();
    if location.is_dir() {
        let report = registry
            .discover(&settings.package, &location, &settings.require)
            .with_context(|| format!("Failed to discover operators in {}", location.display()))?;
        reports.push(report);
    } else {
        tracing::debug!(location = %location.display(), "no operator directory");
    }

    Ok(Catalog { registry, reports })
}
