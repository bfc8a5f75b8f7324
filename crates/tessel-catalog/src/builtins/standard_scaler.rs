//! Standardize numerical columns to zero mean and unit variance

use serde::Deserialize;

use tessel_core::{
    Capability, Column, Dataset, Error, FeatureType, Result, Signature, TransformOutput,
    Transformer, Value,
};

use super::column;
use crate::operator::{OperatorKind, Params, parse_params};

/// Standard scaler operator kind
pub const KIND: OperatorKind = OperatorKind {
    name: "standard_scaler",
    description: "Center and scale numerical columns",
    capabilities: &[
        Capability::Fit,
        Capability::Transform,
        Capability::InverseTransform,
    ],
    build,
};

/// Scaler parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StandardScalerConfig {
    /// Subtract the fitted mean
    pub with_mean: bool,
    /// Divide by the fitted standard deviation
    pub with_std: bool,
}

impl Default for StandardScalerConfig {
    fn default() -> Self {
        Self {
            with_mean: true,
            with_std: true,
        }
    }
}

/// Fitted location and scale of one column
#[derive(Debug, Clone, Copy, PartialEq)]
struct Moments {
    mean: f64,
    scale: f64,
}

/// Per-column standard scaler
#[derive(Debug)]
pub struct StandardScaler {
    name: String,
    config: StandardScalerConfig,
    signature: Signature,
    moments: Option<Vec<Moments>>,
}

fn build(name: &str, params: &Params) -> Result<Box<dyn Transformer>> {
    let config = parse_params(KIND.name, params)?;
    Ok(Box::new(StandardScaler {
        name: name.to_string(),
        config,
        signature: Signature::new([FeatureType::Numerical], FeatureType::Numerical),
        moments: None,
    }))
}

impl StandardScaler {
    fn moments(&self, n_columns: usize) -> Result<&[Moments]> {
        let moments = self
            .moments
            .as_deref()
            .ok_or_else(|| Error::transform(&self.name, "transform called before fit"))?;
        if moments.len() != n_columns {
            return Err(Error::transform(
                &self.name,
                format!("fitted on {} columns, got {}", moments.len(), n_columns),
            ));
        }
        Ok(moments)
    }

    fn fit_column(&self, cells: &[Value]) -> Result<Moments> {
        let values = numbers(&self.name, cells)?;
        if values.is_empty() {
            return Ok(Moments {
                mean: 0.0,
                scale: 1.0,
            });
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();

        Ok(Moments {
            mean: if self.config.with_mean { mean } else { 0.0 },
            scale: if !self.config.with_std || std == 0.0 {
                1.0
            } else {
                std
            },
        })
    }

    fn map(
        &self,
        data: &Dataset,
        columns: &[usize],
        f: impl Fn(f64, Moments) -> f64,
    ) -> Result<TransformOutput> {
        let moments = self.moments(columns.len())?;
        let mut output = Vec::with_capacity(columns.len());
        for (&index, &m) in columns.iter().zip(moments) {
            let cells = column(data, index)?;
            numbers(&self.name, cells)?;
            let scaled: Column = cells
                .iter()
                .map(|cell| match cell.as_f64() {
                    Some(v) => Value::Number(f(v, m)),
                    None => Value::Null,
                })
                .collect::<Vec<_>>()
                .into();
            output.push(scaled);
        }
        Ok(TransformOutput::one_to_one(output))
    }
}

/// Non-null cells as numbers; text cells are an error
fn numbers(name: &str, cells: &[Value]) -> Result<Vec<f64>> {
    cells
        .iter()
        .filter(|cell| !cell.is_null())
        .map(|cell| {
            cell.as_f64()
                .ok_or_else(|| Error::transform(name, format!("expected a number, found {cell}")))
        })
        .collect()
}

impl Transformer for StandardScaler {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn fit(&mut self, data: &Dataset, columns: &[usize]) -> Result<()> {
        let moments = columns
            .iter()
            .map(|&index| self.fit_column(column(data, index)?))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(transformer = %self.name, columns = moments.len(), "fitted scaler");
        self.moments = Some(moments);
        Ok(())
    }

    fn transform(&self, data: &Dataset, columns: &[usize]) -> Result<TransformOutput> {
        self.map(data, columns, |v, m| (v - m.mean) / m.scale)
    }

    fn inverse_transform(&self, data: &Dataset, columns: &[usize]) -> Result<TransformOutput> {
        self.map(data, columns, |v, m| v * m.scale + m.mean)
    }
}
