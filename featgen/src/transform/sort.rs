//! Sort: stable ordering by a derived string key.

use crate::error::TransformResult;
use crate::model::Value;

use super::mapper::SortKey;
use super::{require, Transformed, Transformer};

pub struct Sort {
    key: SortKey,
}

impl Sort {
    pub const NAME: &'static str = "sort";

    pub fn new(key: impl Fn(&Value) -> TransformResult<String> + Send + Sync + 'static) -> Self {
        Self { key: Box::new(key) }
    }

    /// Sort `input` lexicographically by key. Equal keys keep their input order.
    ///
    /// Keys are derived once per item; the first failing item aborts the sort.
    pub fn apply(&self, input: &Value) -> TransformResult<Vec<Value>> {
        let items = input.expect_sequence(Self::NAME, "a sequence")?;

        let mut keyed = items
            .iter()
            .map(|item| (self.key)(item).map(|key| (key, item.clone())))
            .collect::<TransformResult<Vec<(String, Value)>>>()?;

        // `sort_by` is stable.
        keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(keyed.into_iter().map(|(_, item)| item).collect())
    }
}

impl Transformer for Sort {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn transform(&self, input: Option<&Value>) -> TransformResult<Transformed> {
        let input = require(input, Self::NAME)?;
        Ok(Transformed::new(Value::Sequence(self.apply(input)?)))
    }
}

impl std::fmt::Debug for Sort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sort").finish_non_exhaustive()
    }
}
