//! One-hot encoding of categorical columns
//!
//! Every touched column expands into one numerical indicator column per
//! category seen during fit, in sorted category order.

use serde::Deserialize;
use std::collections::HashMap;

use tessel_core::{
    Capability, Column, Dataset, Error, FeatureType, Result, Signature, TransformOutput,
    Transformer, Value,
};

use super::column;
use crate::operator::{OperatorKind, Params, parse_params};

/// One-hot encoder operator kind
pub const KIND: OperatorKind = OperatorKind {
    name: "one_hot",
    description: "Indicator columns for categorical values",
    capabilities: &[Capability::Fit, Capability::Transform],
    build,
};

/// What to do with a category not seen during fit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    /// All indicators zero
    #[default]
    Ignore,
    /// Fail the transform
    Error,
}

/// Encoder parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OneHotConfig {
    /// Keep only the most frequent categories per column
    pub max_categories: Option<usize>,
    /// Unseen category policy
    pub handle_unknown: HandleUnknown,
}

/// Per-column one-hot encoder
#[derive(Debug)]
pub struct OneHot {
    name: String,
    config: OneHotConfig,
    signature: Signature,
    categories: Option<Vec<Vec<String>>>,
}

fn build(name: &str, params: &Params) -> Result<Box<dyn Transformer>> {
    let config: OneHotConfig = parse_params(KIND.name, params)?;
    if config.max_categories == Some(0) {
        return Err(Error::InvalidParameter {
            parameter: "max_categories".to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    Ok(Box::new(OneHot {
        name: name.to_string(),
        config,
        signature: Signature::new(
            [
                FeatureType::Categorical,
                FeatureType::Discrete,
                FeatureType::Ordinal,
            ],
            FeatureType::Numerical,
        ),
        categories: None,
    }))
}

/// Category key of a cell; numbers and text share one namespace
fn category(cell: &Value) -> Option<String> {
    (!cell.is_null()).then(|| cell.to_string())
}

impl OneHot {
    fn fit_column(&self, cells: &[Value]) -> Vec<String> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for key in cells.iter().filter_map(category) {
            *counts.entry(key).or_default() += 1;
        }

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        if let Some(max) = self.config.max_categories {
            // most frequent first, ties broken by category
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            ranked.truncate(max);
        }

        let mut categories: Vec<String> = ranked.into_iter().map(|(k, _)| k).collect();
        categories.sort();
        categories
    }

    fn encode(&self, cells: &[Value], categories: &[String]) -> Result<Vec<Column>> {
        let mut indicators = vec![vec![Value::Number(0.0); cells.len()]; categories.len()];

        for (row, cell) in cells.iter().enumerate() {
            let Some(key) = category(cell) else {
                for indicator in indicators.iter_mut() {
                    indicator[row] = Value::Null;
                }
                continue;
            };
            match categories.binary_search(&key) {
                Ok(position) => indicators[position][row] = Value::Number(1.0),
                Err(_) if self.config.handle_unknown == HandleUnknown::Error => {
                    return Err(Error::transform(
                        &self.name,
                        format!("unknown category '{key}'"),
                    ));
                }
                Err(_) => {}
            }
        }

        Ok(indicators.into_iter().map(Column::from).collect())
    }
}

impl Transformer for OneHot {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn fit(&mut self, data: &Dataset, columns: &[usize]) -> Result<()> {
        let categories = columns
            .iter()
            .map(|&index| Ok(self.fit_column(column(data, index)?)))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(
            transformer = %self.name,
            indicators = categories.iter().map(Vec::len).sum::<usize>(),
            "fitted one-hot encoder"
        );
        self.categories = Some(categories);
        Ok(())
    }

    fn transform(&self, data: &Dataset, columns: &[usize]) -> Result<TransformOutput> {
        let fitted = self
            .categories
            .as_ref()
            .ok_or_else(|| Error::transform(&self.name, "transform called before fit"))?;
        if fitted.len() != columns.len() {
            return Err(Error::transform(
                &self.name,
                format!("fitted on {} columns, got {}", fitted.len(), columns.len()),
            ));
        }

        let replacements = columns
            .iter()
            .zip(fitted)
            .map(|(&index, categories)| self.encode(column(data, index)?, categories))
            .collect::<Result<Vec<_>>>()?;
        Ok(TransformOutput::replacing(replacements))
    }
}
