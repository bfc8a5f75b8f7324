//! Apply pipelines to their input data

use anyhow::{Context, Result};
use tessel_catalog::ComponentRegistry;
use tessel_core::{Config, DatasetNode, Pipeline};

use crate::{catalog, input};

/// Run every pipeline, or only `pipeline` when given
pub fn run(config_path: &str, pipeline: Option<&str>) -> Result<()> {
    tracing::info!("Loading configuration from {}", config_path);
    let config = Config::load(config_path).context("Failed to load configuration")?;
    tracing::info!("Project: {}", config.project.name);

    let catalog = catalog::load(&config)?;

    let pipelines = match pipeline {
        Some(name) => vec![config.load_pipeline(name)?],
        None => config.load_pipelines().context("Failed to load pipelines")?,
    };
    if pipelines.is_empty() {
        tracing::warn!("No pipelines found in {}", config.base_path.join("pipelines").display());
        return Ok(());
    }

    for pipeline in &pipelines {
        run_pipeline(&config, &catalog.registry, pipeline)
            .with_context(|| format!("Pipeline '{}' failed", pipeline.name))?;
    }
    Ok(())
}

fn run_pipeline(config: &Config, registry: &ComponentRegistry, pipeline: &Pipeline) -> Result<()> {
    let input_path = config.resolve_path(&pipeline.input);
    let root = input::load_root(pipeline, &input_path)?;
    tracing::info!(
        pipeline = %pipeline.name,
        rows = root.n_rows(),
        columns = root.n_columns(),
        "loaded root dataset"
    );

    let terminal = apply_steps(registry, pipeline, root)?;

    for (depth, node) in terminal.lineage().enumerate() {
        let step = node.step().map_or("<root>", |s| s.name());
        tracing::debug!(depth, step, types = ?node.feature_types(), "lineage");
    }
    tracing::info!(
        pipeline = %pipeline.name,
        steps = terminal.depth(),
        rows = terminal.n_rows(),
        columns = terminal.n_columns(),
        fingerprint = %terminal.fingerprint(),
        "✓ pipeline complete"
    );

    if let Some(output) = &pipeline.output {
        let path = config.resolve_path(output);
        let written = input::write_jsonl(&terminal, &pipeline.label, &path)?;
        tracing::info!("✓ Wrote {} rows to {}", written, path.display());
    }
    Ok(())
}

fn apply_steps(
    registry: &ComponentRegistry,
    pipeline: &Pipeline,
    root: DatasetNode,
) -> Result<DatasetNode> {
    let mut node = root;
    for step in &pipeline.steps {
        let transformer = registry.instantiate(step.operator())?;
        node = node
            .apply_with(transformer, &step.selection())
            .with_context(|| format!("Step '{}' failed", step.operator()))?;
        tracing::debug!(
            step = step.operator(),
            columns = node.n_columns(),
            rows = node.n_rows(),
            "applied step"
        );
    }
    Ok(node)
}
