//! Hashed bag-of-words vectorizer
//!
//! Each text column becomes `dimensions` numerical columns holding token
//! counts per hash bucket. With the default of one dimension this is the
//! token count of the cell.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

use tessel_core::{
    Capability, Column, Dataset, Error, FeatureType, Result, Signature, TransformOutput,
    Transformer, Value,
};

use super::column;
use crate::operator::{OperatorKind, Params, parse_params};

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid token pattern"));

/// Hashed bag-of-words operator kind
pub const KIND: OperatorKind = OperatorKind {
    name: "text2vector",
    description: "Hashed token counts for text columns",
    capabilities: &[Capability::Fit, Capability::Transform],
    build,
};

/// Vectorizer parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Text2VectorConfig {
    /// Hash buckets per text column
    pub dimensions: usize,
    /// Fold tokens to lower case before hashing
    pub lowercase: bool,
}

impl Default for Text2VectorConfig {
    fn default() -> Self {
        Self {
            dimensions: 1,
            lowercase: true,
        }
    }
}

/// Fitted or unfitted vectorizer
#[derive(Debug)]
pub struct Text2Vector {
    name: String,
    config: Text2VectorConfig,
    signature: Signature,
    fitted_columns: Option<usize>,
}

fn build(name: &str, params: &Params) -> Result<Box<dyn Transformer>> {
    let config: Text2VectorConfig = parse_params(KIND.name, params)?;
    if config.dimensions == 0 {
        return Err(Error::InvalidParameter {
            parameter: "dimensions".to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    Ok(Box::new(Text2Vector {
        name: name.to_string(),
        config,
        signature: Signature::new([FeatureType::Text], FeatureType::Numerical),
        fitted_columns: None,
    }))
}

impl Text2Vector {
    fn vectorize(&self, cells: &[Value]) -> Vec<Column> {
        let dims = self.config.dimensions;
        let mut buckets = vec![vec![Value::Null; cells.len()]; dims];

        for (row, cell) in cells.iter().enumerate() {
            let Some(text) = cell.as_str() else {
                continue;
            };
            let mut counts = vec![0.0; dims];
            for token in TOKEN.find_iter(text) {
                let hash = if self.config.lowercase {
                    fnv1a(token.as_str().to_lowercase().as_bytes())
                } else {
                    fnv1a(token.as_str().as_bytes())
                };
                counts[(hash % dims as u64) as usize] += 1.0;
            }
            for (bucket, count) in buckets.iter_mut().zip(counts) {
                bucket[row] = Value::Number(count);
            }
        }

        buckets.into_iter().map(Arc::from).collect()
    }
}

impl Transformer for Text2Vector {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn fit(&mut self, data: &Dataset, columns: &[usize]) -> Result<()> {
        for &index in columns {
            column(data, index)?;
        }
        self.fitted_columns = Some(columns.len());
        Ok(())
    }

    fn transform(&self, data: &Dataset, columns: &[usize]) -> Result<TransformOutput> {
        match self.fitted_columns {
            None => return Err(Error::transform(&self.name, "transform called before fit")),
            Some(n) if n != columns.len() => {
                return Err(Error::transform(
                    &self.name,
                    format!("fitted on {} columns, got {}", n, columns.len()),
                ));
            }
            Some(_) => {}
        }

        let replacements = columns
            .iter()
            .map(|&index| Ok(self.vectorize(column(data, index)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(TransformOutput::replacing(replacements))
    }
}

/// 64-bit FNV-1a; stable across runs and platforms
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn text_data() -> Dataset {
        Dataset::from_rows(
            vec![
                vec![Value::from("I am good")],
                vec![Value::from("I am right")],
                vec![Value::Null],
            ],
            vec![Value::from(0.0), Value::from(1.0), Value::from(0.0)],
        )
        .unwrap()
    }

    fn numbers(column: &Column) -> Vec<Option<f64>> {
        column.iter().map(Value::as_f64).collect()
    }

    #[test]
    fn test_single_dimension_counts_tokens() {
        let mut t = build("t2v", &Params::Null).unwrap();
        let data = text_data();
        t.fit(&data, &[0]).unwrap();
        let out = t.transform(&data, &[0]).unwrap();

        assert_eq!(out.replacements.len(), 1);
        assert_eq!(out.replacements[0].len(), 1);
        assert_eq!(
            numbers(&out.replacements[0][0]),
            vec![Some(3.0), Some(3.0), None]
        );
    }

    #[rstest]
    #[case(2)]
    #[case(8)]
    fn test_buckets_sum_to_token_count(#[case] dimensions: usize) {
        let params: Params = serde_yaml::from_str(&format!("dimensions: {dimensions}")).unwrap();
        let mut t = build("t2v", &params).unwrap();
        let data = text_data();
        t.fit(&data, &[0]).unwrap();
        let out = t.transform(&data, &[0]).unwrap();

        let columns = &out.replacements[0];
        assert_eq!(columns.len(), dimensions);
        let first_row: f64 = columns.iter().filter_map(|c| c[0].as_f64()).sum();
        assert_eq!(first_row, 3.0);
    }

    #[test]
    fn test_lowercase_folds_case() {
        let data = Dataset::from_rows(
            vec![vec![Value::from("Word")], vec![Value::from("word")]],
            vec![Value::Null, Value::Null],
        )
        .unwrap();
        let params: Params = serde_yaml::from_str("dimensions: 64").unwrap();
        let mut t = build("t2v", &params).unwrap();
        t.fit(&data, &[0]).unwrap();
        let out = t.transform(&data, &[0]).unwrap();

        let rows: Vec<Vec<f64>> = (0..2)
            .map(|r| {
                out.replacements[0]
                    .iter()
                    .filter_map(|c| c[r].as_f64())
                    .collect()
            })
            .collect();
        assert_eq!(rows[0], rows[1]);
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let t = build("t2v", &Params::Null).unwrap();
        let err = t.transform(&text_data(), &[0]).unwrap_err();
        assert!(matches!(err, Error::TransformFailed { .. }));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let params: Params = serde_yaml::from_str("dimensions: 0").unwrap();
        assert!(matches!(
            build("t2v", &params),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }
}
