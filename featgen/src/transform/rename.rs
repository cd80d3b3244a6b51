//! Rename: replace scalars through a static lookup table.

use std::collections::HashMap;

use crate::error::{TransformError, TransformResult};
use crate::model::Value;

use super::{Transformed, Transformer};

/// Substitutes each scalar found in the table; others pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct Rename {
    mapping: HashMap<String, String>,
}

impl Rename {
    pub const NAME: &'static str = "rename";

    pub fn new<I, K, V>(mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            mapping: mapping
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Build the table from a mapping of scalars, e.g. a properties file.
    pub fn from_value(value: &Value) -> TransformResult<Self> {
        const EXPECTED: &str = "a mapping of scalars";
        let record = value
            .as_mapping()
            .ok_or_else(|| TransformError::shape(Self::NAME, EXPECTED, value.shape()))?;

        let mapping = record
            .iter()
            .map(|(k, v)| match v.as_scalar() {
                Some(s) => Ok((k.clone(), s.to_string())),
                None => Err(TransformError::InvalidShape {
                    operator: Self::NAME,
                    expected: EXPECTED.to_string(),
                    actual: format!("a {} under '{}'", v.shape(), k),
                }),
            })
            .collect::<TransformResult<_>>()?;
        Ok(Self { mapping })
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Rename every scalar of `input`. Output has the same length and order.
    pub fn apply(&self, input: Option<&Value>) -> TransformResult<Vec<String>> {
        let input = input.ok_or(TransformError::EmptyInput { operator: Self::NAME })?;
        let renamed = input
            .scalars(Self::NAME)?
            .into_iter()
            .map(|name| match self.mapping.get(&name) {
                Some(mapped) => mapped.clone(),
                None => name,
            })
            .collect();
        Ok(renamed)
    }
}

impl Transformer for Rename {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn transform(&self, input: Option<&Value>) -> TransformResult<Transformed> {
        Ok(Transformed::new(Value::sequence(self.apply(input)?)))
    }
}
