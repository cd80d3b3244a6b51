//! Dynamic record model shared by every adapter and operator.
//!
//! Input files have no fixed schema, so everything flowing through the
//! pipeline is a [`Value`]:
//!
//! - [`Value::Scalar`] - a string (numbers and booleans are stored in their
//!   canonical text form)
//! - [`Value::Sequence`] - an ordered list of values (a record set)
//! - [`Value::Mapping`] - a [`Record`], string field names to values
//!
//! Operators match on the variant and report a
//! [`TransformError::InvalidShape`] when it is not the one they need.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{TransformError, TransformResult};

/// Named fields of one logical entry. Iteration is sorted by field name.
pub type Record = BTreeMap<String, Value>;

// =============================================================================
// Shape
// =============================================================================

/// The variant of a [`Value`], used in shape errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Sequence,
    Mapping,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Scalar => "scalar",
            Shape::Sequence => "sequence",
            Shape::Mapping => "mapping",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Value
// =============================================================================

/// A dynamically-typed value.
///
/// Serializes as plain JSON: strings, arrays and objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(String),
    Sequence(Vec<Value>),
    Mapping(Record),
}

impl Value {
    /// Build a scalar.
    pub fn scalar(s: impl Into<String>) -> Self {
        Value::Scalar(s.into())
    }

    /// Build a sequence from anything convertible to values.
    pub fn sequence<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }

    /// Build a mapping from `(field, value)` pairs.
    pub fn mapping<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Mapping(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn shape(&self) -> Shape {
        match self {
            Value::Scalar(_) => Shape::Scalar,
            Value::Sequence(_) => Shape::Sequence,
            Value::Mapping(_) => Shape::Mapping,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Scalar(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Sequence(_))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Value::Mapping(_))
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Record> {
        match self {
            Value::Mapping(record) => Some(record),
            _ => None,
        }
    }

    /// Look up a field by name.
    ///
    /// `None` means the field is absent (or `self` is not a mapping);
    /// a present empty field is `Some(Value::Scalar(""))`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_mapping().and_then(|record| record.get(name))
    }

    /// Look up a field and return it only if it is a scalar.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_scalar)
    }

    /// Borrow the items of a sequence, failing with a shape error otherwise.
    pub fn expect_sequence(
        &self,
        operator: &'static str,
        expected: &str,
    ) -> TransformResult<&[Value]> {
        self.as_sequence()
            .ok_or_else(|| TransformError::shape(operator, expected, self.shape()))
    }

    /// Materialize a sequence of scalar strings.
    ///
    /// Fails if `self` is not a sequence or if any item is not a scalar.
    pub fn scalars(&self, operator: &'static str) -> TransformResult<Vec<String>> {
        const EXPECTED: &str = "a sequence of scalars";
        self.expect_sequence(operator, EXPECTED)?
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Scalar(s) => Ok(s.clone()),
                other => Err(TransformError::InvalidShape {
                    operator,
                    expected: EXPECTED.to_string(),
                    actual: format!("a {} at index {}", other.shape(), i),
                }),
            })
            .collect()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Mapping(record)
    }
}

// =============================================================================
// Conversions from parsed documents
// =============================================================================

impl From<serde_yaml::Value> for Value {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value as Yaml;

        match value {
            Yaml::Null => Value::Scalar(String::new()),
            Yaml::Bool(b) => Value::Scalar(b.to_string()),
            Yaml::Number(n) => Value::Scalar(n.to_string()),
            Yaml::String(s) => Value::Scalar(s),
            Yaml::Sequence(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
            Yaml::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (yaml_key(k), Value::from(v)))
                    .collect(),
            ),
            Yaml::Tagged(tagged) => Value::from(tagged.value),
        }
    }
}

/// Mapping keys are stored as strings; complex keys fall back to their YAML text.
fn yaml_key(key: serde_yaml::Value) -> String {
    match Value::from(key.clone()) {
        Value::Scalar(s) => s,
        _ => serde_yaml::to_string(&key)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match value {
            Json::Null => Value::Scalar(String::new()),
            Json::Bool(b) => Value::Scalar(b.to_string()),
            Json::Number(n) => Value::Scalar(n.to_string()),
            Json::String(s) => Value::Scalar(s),
            Json::Array(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_absent_vs_empty() {
        let record = Value::mapping([("present", ""), ("name", "a")]);

        assert_eq!(record.field("present"), Some(&Value::scalar("")));
        assert_eq!(record.field("missing"), None);
        assert_eq!(record.field_str("name"), Some("a"));

        // Scalars and sequences have no fields.
        assert_eq!(Value::scalar("x").field("x"), None);
        assert_eq!(Value::sequence(["x"]).field("x"), None);
    }

    #[test]
    fn test_scalars_materializes_strings() {
        let list = Value::sequence(["a", "b"]);
        assert_eq!(list.scalars("test").unwrap(), vec!["a", "b"]);

        let empty = Value::Sequence(Vec::new());
        assert!(empty.scalars("test").unwrap().is_empty());
    }

    #[test]
    fn test_scalars_rejects_wrong_shapes() {
        let err = Value::scalar("a").scalars("rename").unwrap_err();
        assert_eq!(
            err,
            TransformError::InvalidShape {
                operator: "rename",
                expected: "a sequence of scalars".into(),
                actual: "scalar".into(),
            }
        );

        let mixed = Value::Sequence(vec![Value::scalar("a"), Value::mapping([("k", "v")])]);
        let err = mixed.scalars("rename").unwrap_err();
        assert!(err.to_string().contains("a mapping at index 1"));
    }

    #[test]
    fn test_from_yaml_coerces_scalars() {
        let doc: serde_yaml::Value = serde_yaml::from_str(
            "feature:\n  priority: 2\n  enabled: true\n  note: ~\n  tags: [a, 1]\n3: three\n",
        )
        .unwrap();
        let value = Value::from(doc);

        let feature = value.field("feature").unwrap();
        assert_eq!(feature.field_str("priority"), Some("2"));
        assert_eq!(feature.field_str("enabled"), Some("true"));
        assert_eq!(feature.field_str("note"), Some(""));
        assert_eq!(feature.field("tags"), Some(&Value::sequence(["a", "1"])));
        assert_eq!(value.field_str("3"), Some("three"));
    }

    #[test]
    fn test_from_json_and_serialize() {
        let json = serde_json::json!({"name": "a", "n": 1, "list": ["x"]});
        let value = Value::from(json);
        assert_eq!(value.field_str("n"), Some("1"));

        let out = serde_json::to_value(&value).unwrap();
        assert_eq!(out, serde_json::json!({"name": "a", "n": "1", "list": ["x"]}));
    }

    #[test]
    fn test_shape_display() {
        assert_eq!(Value::scalar("a").shape().to_string(), "scalar");
        assert_eq!(Value::sequence(["a"]).shape().to_string(), "sequence");
        assert_eq!(Value::mapping([("a", "b")]).shape().to_string(), "mapping");
    }
}
