//! Validate configuration command

use anyhow::{Context, Result};
use tessel_core::Config;

use crate::catalog;

/// Run the validate command
pub fn run(config_path: &str) -> Result<()> {
    tracing::info!("Validating configuration: {}", config_path);

    let config = Config::load(config_path).context("Failed to load configuration")?;

    tracing::info!("✓ Project: {}", config.project.name);
    tracing::info!("✓ Version: {}", config.project.version);

    let catalog = catalog::load(&config)?;
    let mut problems = 0;
    for report in &catalog.reports {
        for exclusion in &report.excluded {
            tracing::info!(
                "  - {} excluded (missing {:?})",
                exclusion.name,
                exclusion.missing
            );
        }
        for error in &report.errors {
            tracing::error!("✗ {}", error);
            problems += 1;
        }
    }
    tracing::info!("✓ Operators: {}", catalog.registry.len());

    let pipelines = config
        .load_pipelines()
        .context("Failed to load pipelines")?;
    for pipeline in &pipelines {
        for step in &pipeline.steps {
            if catalog.registry.lookup(step.operator()).is_err() {
                tracing::error!(
                    "✗ Pipeline '{}': unknown operator '{}'",
                    pipeline.name,
                    step.operator()
                );
                problems += 1;
            }
        }
    }
    tracing::info!("✓ Pipelines: {}", pipelines.len());

    if problems > 0 {
        anyhow::bail!("Validation failed with {} problem(s)", problems);
    }

    tracing::info!("✓ Configuration is valid");
    Ok(())
}
