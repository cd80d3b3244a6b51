//! Filter: keep the records a predicate accepts, in their original order.

use regex::Regex;

use crate::error::{TransformError, TransformResult};
use crate::model::{Record, Value};

use super::{require, Transformed, Transformer};

pub type Predicate = Box<dyn Fn(&Record) -> bool + Send + Sync>;

/// True iff scalar field `field` equals `expected`. A missing field is false.
pub fn field_equals(
    field: impl Into<String>,
    expected: impl Into<String>,
) -> impl Fn(&Record) -> bool + Send + Sync {
    let field = field.into();
    let expected = expected.into();
    move |record| record.get(&field).and_then(Value::as_scalar) == Some(expected.as_str())
}

/// True iff scalar field `field` matches the regex `pattern`. A missing field is false.
pub fn field_matches(
    field: impl Into<String>,
    pattern: &str,
) -> TransformResult<impl Fn(&Record) -> bool + Send + Sync> {
    let re = Regex::new(pattern).map_err(|e| TransformError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    let field = field.into();
    Ok(move |record: &Record| {
        record
            .get(&field)
            .and_then(Value::as_scalar)
            .is_some_and(|value| re.is_match(value))
    })
}

pub struct Filter {
    predicate: Predicate,
}

impl Filter {
    pub const NAME: &'static str = "filter";

    pub fn new(predicate: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
        }
    }

    pub fn apply(&self, input: &Value) -> TransformResult<Vec<Value>> {
        const EXPECTED: &str = "a sequence of records";
        let items = input.expect_sequence(Self::NAME, EXPECTED)?;

        let mut kept = Vec::new();
        for (i, item) in items.iter().enumerate() {
            let Value::Mapping(record) = item else {
                return Err(TransformError::InvalidShape {
                    operator: Self::NAME,
                    expected: EXPECTED.to_string(),
                    actual: format!("a {} at index {}", item.shape(), i),
                });
            };
            if (self.predicate)(record) {
                kept.push(item.clone());
            }
        }
        Ok(kept)
    }
}

impl Transformer for Filter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn transform(&self, input: Option<&Value>) -> TransformResult<Transformed> {
        let input = require(input, Self::NAME)?;
        Ok(Transformed::new(Value::Sequence(self.apply(input)?)))
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter").finish_non_exhaustive()
    }
}
