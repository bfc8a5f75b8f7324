//! Columnar dataset payload
//!
//! A [`Dataset`] is an ordered list of feature columns plus an aligned label
//! vector. Columns are reference-counted slices so that a derived dataset can
//! share every column a transformer did not touch with its parent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

/// A single cell
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value
    #[default]
    Null,
    /// Numeric value
    Number(f64),
    /// Textual value
    Text(String),
}

impl Value {
    /// Whether the cell is missing
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell, if it holds a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text view of the cell, if it holds text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a JSON scalar into a cell.
    ///
    /// Booleans become `0`/`1`; arrays and objects are rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).ok_or_else(|| {
                Error::ConfigInvalid {
                    message: format!("number {} is not representable as f64", n),
                }
            }),
            serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
            other => Err(Error::ConfigInvalid {
                message: format!("expected a scalar cell, got {}", other),
            }),
        }
    }

    /// Convert the cell into JSON
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// A feature column, shared between datasets that did not rewrite it
pub type Column = Arc<[Value]>;

/// Feature columns plus aligned labels
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    labels: Arc<[Value]>,
}

impl Dataset {
    /// Build a dataset, checking that every column has one cell per label.
    pub fn new(columns: Vec<Column>, labels: impl Into<Arc<[Value]>>) -> Result<Self> {
        let labels = labels.into();
        for (index, column) in columns.iter().enumerate() {
            if column.len() != labels.len() {
                return Err(Error::ShapeMismatch {
                    context: format!("column {}", index),
                    expected: labels.len(),
                    actual: column.len(),
                });
            }
        }
        Ok(Self { columns, labels })
    }

    /// Build a dataset from row-major records.
    ///
    /// Every row must have the same width.
    pub fn from_rows(rows: Vec<Vec<Value>>, labels: Vec<Value>) -> Result<Self> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); width];
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(Error::ShapeMismatch {
                    context: format!("row {}", index),
                    expected: width,
                    actual: row.len(),
                });
            }
            for (column, cell) in columns.iter_mut().zip(row) {
                column.push(cell);
            }
        }
        Self::new(columns.into_iter().map(Column::from).collect(), labels)
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    /// Number of feature columns
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// All feature columns
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// A single feature column
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Label vector
    pub fn labels(&self) -> &Arc<[Value]> {
        &self.labels
    }

    /// Cells of one row, in column order
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        (index < self.n_rows()).then(|| self.columns.iter().map(|c| &c[index]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_transposes() {
        let data = Dataset::from_rows(
            vec![
                vec![Value::from(1.0), Value::from("a")],
                vec![Value::from(2.0), Value::from("b")],
            ],
            vec![Value::from(0.0), Value::from(1.0)],
        )
        .unwrap();
        assert_eq!(data.n_rows(), 2);
        assert_eq!(data.n_columns(), 2);
        assert_eq!(data.column(1).unwrap()[1], Value::from("b"));
        assert_eq!(data.row(0).unwrap(), vec![&Value::from(1.0), &Value::from("a")]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = Dataset::from_rows(
            vec![vec![Value::from(1.0), Value::from(2.0)], vec![Value::from(3.0)]],
            vec![Value::Null, Value::Null],
        );
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_column_length_must_match_labels() {
        let column: Column = vec![Value::from(1.0)].into();
        let result = Dataset::new(vec![column], vec![Value::Null, Value::Null]);
        match result {
            Err(Error::ShapeMismatch {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("Expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_value_json_conversion() {
        let value = Value::from_json(&serde_json::json!(true)).unwrap();
        assert_eq!(value, Value::Number(1.0));
        assert_eq!(Value::from_json(&serde_json::json!(null)).unwrap(), Value::Null);
        assert!(Value::from_json(&serde_json::json!([1, 2])).is_err());
        assert_eq!(Value::from("hi").to_json(), serde_json::json!("hi"));
    }

    #[test]
    fn test_value_deserializes_untagged() {
        let cells: Vec<Value> = serde_json::from_str(r#"[1.5, "x", null]"#).unwrap();
        assert_eq!(
            cells,
            vec![Value::Number(1.5), Value::Text("x".to_string()), Value::Null]
        );
    }
}
