//! Raw input loading and terminal output
//!
//! Builds a root node from a pipeline's input file (JSONL or CSV) and
//! writes a node's dataset back out as JSONL.

use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use tessel_core::{Column, DatasetNode, FeatureType, Pipeline, Value};

/// Load `path` as the root node described by `pipeline`
pub fn load_root(pipeline: &Pipeline, path: &Path) -> Result<DatasetNode> {
    let rows = match path.extension().and_then(|e| e.to_str()) {
        Some("jsonl") | Some("ndjson") => read_jsonl(pipeline, path)?,
        Some("csv") => read_csv(pipeline, path)?,
        _ => bail!(
            "Unsupported input format '{}' (expected .jsonl or .csv)",
            path.display()
        ),
    };
    tracing::debug!(rows = rows.len(), path = %path.display(), "loaded input");

    let n_features = pipeline.features.len();
    let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); n_features];
    let mut labels = Vec::with_capacity(rows.len());
    for (features, label) in rows {
        for (column, value) in columns.iter_mut().zip(features) {
            column.push(value);
        }
        labels.push(label);
    }

    let columns: Vec<Column> = columns.into_iter().map(Arc::from).collect();
    DatasetNode::create_root(columns, labels, pipeline.feature_types())
        .context("Failed to build root dataset")
}

type Row = (Vec<Value>, Value);

fn read_jsonl(pipeline: &Pipeline, path: &Path) -> Result<Vec<Row>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rows = Vec::new();

    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: serde_json::Value = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid JSON", path.display(), number + 1))?;
        let field = |name: &str| -> Result<Value> {
            let Some(raw) = record.get(name) else {
                return Ok(Value::Null);
            };
            Value::from_json(raw)
                .with_context(|| format!("{}:{}: field '{}'", path.display(), number + 1, name))
        };

        let features = pipeline
            .feature_names()
            .into_iter()
            .map(&field)
            .collect::<Result<Vec<_>>>()?;
        rows.push((features, field(&pipeline.label)?));
    }
    Ok(rows)
}

fn read_csv(pipeline: &Pipeline, path: &Path) -> Result<Vec<Row>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let position = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("{}: missing column '{}'", path.display(), name))
    };

    let feature_positions = pipeline
        .features
        .iter()
        .map(|f| Ok((position(&f.name)?, f.feature_type)))
        .collect::<Result<Vec<_>>>()?;
    let label_position = position(&pipeline.label)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let features = feature_positions
            .iter()
            .map(|&(i, ty)| csv_cell(record.get(i), Some(ty)))
            .collect();
        rows.push((features, csv_cell(record.get(label_position), None)));
    }
    Ok(rows)
}

/// CSV cells are untyped: numeric-looking cells of non-text columns become numbers
fn csv_cell(raw: Option<&str>, ty: Option<FeatureType>) -> Value {
    let raw = raw.unwrap_or("").trim();
    if raw.is_empty() {
        return Value::Null;
    }
    let textual = matches!(ty, Some(FeatureType::Text) | Some(FeatureType::Categorical));
    match raw.parse::<f64>() {
        Ok(n) if !textual => Value::Number(n),
        _ => Value::Text(raw.to_string()),
    }
}

/// Write `node`'s rows as JSONL: `{"features": [...], "<label>": ...}`
pub fn write_jsonl(node: &DatasetNode, label: &str, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);

    let data = node.data();
    for row in 0..data.n_rows() {
        let features: Vec<serde_json::Value> =
            data.columns().iter().map(|c| c[row].to_json()).collect();
        let mut record = serde_json::Map::new();
        record.insert("features".to_string(), serde_json::Value::Array(features));
        record.insert(label.to_string(), data.labels()[row].to_json());
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(data.n_rows())
}
