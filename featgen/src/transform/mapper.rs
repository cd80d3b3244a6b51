//! Key and value mappers used to parameterize the operators.
//!
//! Three kinds of functions appear here:
//! - [`KeyFn`]: derives an expansion lookup key from an input scalar
//! - [`SortKey`]: derives the string a [`super::Sort`] orders by
//! - [`Mapper`]: projects a value out of an item, `None` when absent

use crate::error::{TransformError, TransformResult};
use crate::model::Value;

/// Lookup-key derivation for [`super::Expand`].
pub type KeyFn = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Sort-key derivation for [`super::Sort`]. Failing elements abort the sort.
pub type SortKey = Box<dyn Fn(&Value) -> TransformResult<String> + Send + Sync>;

/// Item projection for [`super::ToMap`].
pub type Mapper = Box<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// The scalar is its own lookup key.
pub fn identity_key(input: &str) -> String {
    input.to_string()
}

/// Returns the item unchanged.
pub fn identity_mapper(item: &Value) -> Option<Value> {
    Some(item.clone())
}

/// Extracts field `name` from a record; `None` if absent or not a record.
pub fn field_mapper(name: impl Into<String>) -> impl Fn(&Value) -> Option<Value> + Send + Sync {
    let name = name.into();
    move |item| item.field(&name).cloned()
}

/// Sort key of a scalar item.
pub fn scalar_key(item: &Value) -> TransformResult<String> {
    item.as_scalar()
        .map(str::to_string)
        .ok_or_else(|| TransformError::shape("sort", "a scalar", item.shape()))
}

/// Sort key read from the scalar field `name` of a record.
///
/// A missing field is a shape error, not an empty key.
pub fn field_key(
    name: impl Into<String>,
) -> impl Fn(&Value) -> TransformResult<String> + Send + Sync {
    let name = name.into();
    move |item| {
        if let Some(key) = item.field_str(&name) {
            return Ok(key.to_string());
        }
        let actual = match item {
            Value::Mapping(record) => match record.get(&name) {
                Some(field) => format!("a {} in field '{}'", field.shape(), name),
                None => format!("a mapping without field '{}'", name),
            },
            other => other.shape().to_string(),
        };
        Err(TransformError::InvalidShape {
            operator: "sort",
            expected: format!("a record with scalar field '{}'", name),
            actual,
        })
    }
}
