//! Operator catalog commands

use anyhow::{Context, Result};
use tessel_core::Config;

use crate::catalog;

/// List registered operators
pub fn list(config_path: &str) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    let catalog = catalog::load(&config)?;
    let snapshot = catalog.registry.all();

    if snapshot.is_empty() {
        println!("No operators registered");
        return Ok(());
    }

    println!("Operators ({}):", snapshot.len());
    for descriptor in &snapshot {
        let accepts: Vec<_> = descriptor
            .signature()
            .input_types
            .iter()
            .map(|t| t.as_str())
            .collect();
        println!(
            "  {:<20} {:<16} [{}] {}",
            descriptor.name(),
            descriptor.kind(),
            accepts.join(", "),
            descriptor.description()
        );
    }
    Ok(())
}

/// Show details of one operator
pub fn show(config_path: &str, name: &str) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    let catalog = catalog::load(&config)?;
    let descriptor = catalog.registry.lookup(name)?;
    let signature = descriptor.signature();

    println!("Operator: {}", descriptor.name());
    println!("  Kind: {}", descriptor.kind());
    println!("  Description: {}", descriptor.description());
    println!("  Source: {}", descriptor.source());
    println!("  Capabilities: {:?}", descriptor.capabilities());
    println!(
        "  Accepts: {}",
        signature
            .input_types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    match signature.output_type {
        Some(output) => println!("  Produces: {}", output),
        None => println!("  Produces: input type"),
    }
    println!("  Rows: {:?}", signature.rows);
    println!("  Labels: {:?}", signature.labels);
    if !descriptor.params().is_null() {
        println!("  Params: {}", serde_json::to_string(descriptor.params())?);
    }
    Ok(())
}
