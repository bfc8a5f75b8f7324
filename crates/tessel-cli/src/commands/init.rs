//! Initialize a new Tessel project

use anyhow::Result;
use std::fs;
use std::path::Path;

use tessel_core::config::PROJECT_FILE;

/// Run the init command
pub fn run(path: &str, name: Option<&str>) -> Result<()> {
    let project_dir = Path::new(path);

    // Create directory if it doesn't exist
    if !project_dir.exists() {
        fs::create_dir_all(project_dir)?;
    }

    let abs_path = project_dir.canonicalize()?;

    // Derive project name from directory name if not provided
    let project_name = match name {
        Some(n) => n.to_string(),
        None => abs_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("Could not determine project name from path"))?,
    };

    if project_dir.join(PROJECT_FILE).exists() {
        anyhow::bail!(
            "Directory '{}' already contains a {}",
            project_dir.display(),
            PROJECT_FILE
        );
    }

    tracing::info!("Creating new Tessel project: {}", project_name);

    fs::create_dir_all(project_dir.join("operators"))?;
    fs::create_dir_all(project_dir.join("pipelines"))?;
    fs::create_dir_all(project_dir.join("data"))?;

    let config = format!(
        r#"# Tessel Project Configuration
name: {project_name}
version: "0.1.0"

catalog:
  # Identity of the operators discovered under `path`
  package: operators
  path: operators
  # Operators lacking any of these are left out of the catalog
  require: [fit, transform]
  fail_fast: false
  on_conflict: reject
  builtins: true
"#
    );
    fs::write(project_dir.join(PROJECT_FILE), config)?;

    // Operator manifests: each file registers an operator under its stem
    fs::write(
        project_dir.join("operators/title_hash.yaml"),
        r#"kind: text2vector
description: Hashed token counts over 8 buckets
params:
  dimensions: 8
"#,
    )?;
    fs::write(
        project_dir.join("operators/scale.yaml"),
        r#"kind: standard_scaler
description: Standardize numerical columns
"#,
    )?;

    let pipeline = r#"# Example pipeline
name: reviews
description: Vectorize review text, scale the score, encode votes

input: data/reviews.jsonl
label: sentiment

features:
  - { name: score, type: numerical }
  - { name: title, type: text }
  - { name: body, type: text }
  - { name: votes, type: discrete }

steps:
  - text2vector
  - operator: scale
    columns: [0]
  - one_hot

output: data/features.jsonl
"#;
    fs::write(project_dir.join("pipelines/reviews.yaml"), pipeline)?;

    let sample_data = r#"{"score": 1, "title": "I am good", "body": "I am right", "votes": 3, "sentiment": 0}
{"score": 2, "title": "You are bad", "body": "You are wrong", "votes": 1, "sentiment": 1}
{"score": 3, "title": "We are fine", "body": "and it shows", "votes": 4, "sentiment": 0}
{"score": 4, "title": "They are great", "body": "no doubt", "votes": 2, "sentiment": 1}
"#;
    fs::write(project_dir.join("data/reviews.jsonl"), sample_data)?;

    let gitignore = r#"# Pipeline output
data/features.jsonl

# IDE
.idea/
.vscode/
*.swp
"#;
    fs::write(project_dir.join(".gitignore"), gitignore)?;

    tracing::info!(
        "✓ Created project '{}' at {}",
        project_name,
        abs_path.display()
    );
    tracing::info!("");
    tracing::info!("Next steps:");
    if path != "." {
        tracing::info!("  cd {}", project_dir.display());
    }
    tracing::info!("  tessel validate         # Check configuration and operators");
    tracing::info!("  tessel operators list   # Browse the catalog");
    tracing::info!("  tessel run              # Apply pipelines");

    Ok(())
}
