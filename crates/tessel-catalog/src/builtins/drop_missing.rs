//! Drop rows with missing values

use serde::Deserialize;

use tessel_core::{
    Capability, Column, Dataset, FeatureType, Result, Signature, TransformOutput, Transformer,
};

use super::column;
use crate::operator::{OperatorKind, Params, parse_params};

/// Missing-value filter operator kind
pub const KIND: OperatorKind = OperatorKind {
    name: "drop_missing",
    description: "Remove rows where any touched column is null",
    capabilities: &[Capability::Fit, Capability::Transform],
    build,
};

/// Filter parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DropMissingConfig {
    /// Also drop rows whose label is null
    pub labels: bool,
}

/// Row filter over touched columns
#[derive(Debug)]
pub struct DropMissing {
    name: String,
    config: DropMissingConfig,
    signature: Signature,
}

fn build(name: &str, params: &Params) -> Result<Box<dyn Transformer>> {
    Ok(Box::new(DropMissing {
        name: name.to_string(),
        config: parse_params(KIND.name, params)?,
        signature: Signature::preserving(FeatureType::ALL).changing_rows(),
    }))
}

impl Transformer for DropMissing {
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
        Ok(())
    }

    fn transform(&self, data: &Dataset, columns: &[usize]) -> Result<TransformOutput> {
        let touched = columns
            .iter()
            .map(|&index| column(data, index))
            .collect::<Result<Vec<_>>>()?;

        let kept: Vec<usize> = (0..data.n_rows())
            .filter(|&row| touched.iter().all(|c| !c[row].is_null()))
            .filter(|&row| !self.config.labels || !data.labels()[row].is_null())
            .collect();

        if kept.len() < data.n_rows() {
            tracing::debug!(
                transformer = %self.name,
                dropped = data.n_rows() - kept.len(),
                "dropped rows with missing values"
            );
        }

        let filtered: Vec<Column> = touched
            .iter()
            .map(|c| kept.iter().map(|&row| c[row].clone()).collect::<Vec<_>>().into())
            .collect();
        Ok(TransformOutput::one_to_one(filtered).with_kept_rows(kept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_core::Value;

    fn data() -> Dataset {
        Dataset::from_rows(
            vec![
                vec![Value::from(1.0), Value::from("a")],
                vec![Value::Null, Value::from("b")],
                vec![Value::from(3.0), Value::Null],
                vec![Value::from(4.0), Value::from("d")],
            ],
            vec![Value::from(0.0), Value::from(1.0), Value::from(0.0), Value::Null],
        )
        .unwrap()
    }

    fn kept(params: &str, columns: &[usize]) -> Vec<usize> {
        let params: Params = serde_yaml::from_str(params).unwrap();
        let mut t = build("dropna", &params).unwrap();
        t.fit(&data(), columns).unwrap();
        t.transform(&data(), columns).unwrap().kept_rows.unwrap()
    }

    #[test]
    fn test_only_touched_columns_count() {
        assert_eq!(kept("{}", &[0]), vec![0, 2, 3]);
        assert_eq!(kept("{}", &[1]), vec![0, 1, 3]);
        assert_eq!(kept("{}", &[0, 1]), vec![0, 3]);
    }

    #[test]
    fn test_touched_columns_are_filtered() {
        let mut t = build("dropna", &Params::Null).unwrap();
        t.fit(&data(), &[0]).unwrap();
        let out = t.transform(&data(), &[0]).unwrap();
        let values: Vec<_> = out.replacements[0][0].iter().map(Value::as_f64).collect();
        assert_eq!(values, vec![Some(1.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_null_labels_dropped_on_request() {
        assert_eq!(kept("labels: true", &[0, 1]), vec![0]);
    }

    #[test]
    fn test_accepts_every_type_and_preserves_it() {
        let t = build("dropna", &Params::Null).unwrap();
        for ty in FeatureType::ALL {
            assert!(t.signature().accepts(ty));
            assert_eq!(t.signature().output_for(ty), ty);
        }
    }
}
