//! ToMap: key a sequence into a mapping.
//!
//! Used to turn tabular configuration (one record per row) into an
//! [`super::ExpansionTable`] keyed by one of its columns.

use crate::error::{TransformError, TransformResult};
use crate::model::{Record, Value};

use super::mapper::Mapper;
use super::{require, Transformed, Transformer};

pub struct ToMap {
    key: Mapper,
    value: Mapper,
}

impl ToMap {
    pub const NAME: &'static str = "to_map";

    pub fn new(
        key: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static,
        value: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Build the mapping. Later items replace earlier ones with the same key.
    pub fn apply(&self, input: &Value) -> TransformResult<Record> {
        let items = input.expect_sequence(Self::NAME, "a sequence")?;

        let mut map = Record::new();
        for (i, item) in items.iter().enumerate() {
            let key = match (self.key)(item) {
                Some(Value::Scalar(key)) => key,
                Some(other) => {
                    return Err(TransformError::InvalidShape {
                        operator: Self::NAME,
                        expected: "a scalar key".to_string(),
                        actual: format!("a {} key at index {}", other.shape(), i),
                    });
                }
                None => {
                    return Err(TransformError::InvalidShape {
                        operator: Self::NAME,
                        expected: "an item with a key".to_string(),
                        actual: format!("no key at index {}", i),
                    });
                }
            };
            let value = (self.value)(item).ok_or_else(|| TransformError::InvalidShape {
                operator: Self::NAME,
                expected: "an item with a value".to_string(),
                actual: format!("no value at index {}", i),
            })?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl Transformer for ToMap {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn transform(&self, input: Option<&Value>) -> TransformResult<Transformed> {
        let input = require(input, Self::NAME)?;
        Ok(Transformed::new(Value::Mapping(self.apply(input)?)))
    }
}

impl std::fmt::Debug for ToMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToMap").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::mapper::{field_mapper, identity_mapper};

    #[test]
    fn test_simple_list() {
        let input = Value::Sequence(vec![
            Value::mapping([("foo", "1"), ("bar", "BAR1")]),
            Value::mapping([("foo", "2"), ("bar", "BAR2")]),
        ]);
        let to_map = ToMap::new(field_mapper("foo"), field_mapper("bar"));

        let map = to_map.apply(&input).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["1"], Value::scalar("BAR1"));
        assert_eq!(map["2"], Value::scalar("BAR2"));
    }

    #[test]
    fn test_whole_record_as_value() {
        let input = Value::Sequence(vec![
            Value::mapping([("name", "a"), ("priority", "1")]),
            Value::mapping([("name", "a"), ("priority", "2")]),
        ]);
        let map = ToMap::new(field_mapper("name"), identity_mapper).apply(&input).unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(map["a"].field_str("priority"), Some("2"));
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let input = Value::Sequence(vec![Value::mapping([("bar", "x")])]);
        let err = ToMap::new(field_mapper("foo"), identity_mapper).apply(&input).unwrap_err();
        assert!(err.to_string().contains("no key at index 0"));

        let nested = Value::Sequence(vec![Value::mapping([("foo", Value::sequence(["x"]))])]);
        let err = ToMap::new(field_mapper("foo"), identity_mapper).apply(&nested).unwrap_err();
        assert!(err.to_string().contains("a sequence key"));

        let err = ToMap::new(identity_mapper, field_mapper("missing"))
            .apply(&Value::sequence(["k"]))
            .unwrap_err();
        assert!(err.to_string().contains("no value"));
    }

    #[test]
    fn test_transformer_wraps_mapping() {
        let to_map = ToMap::new(identity_mapper, identity_mapper);
        let out = to_map.transform(Some(&Value::sequence(["a"]))).unwrap();
        assert_eq!(out.value, Value::mapping([("a", "a")]));
        assert!(to_map.transform(None).is_err());
    }
}
