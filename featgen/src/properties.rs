//! Layered property lookup.
//!
//! A [`PropertyChain`] is an ordered list of [`PropertyLayer`]s queried
//! first-match-wins: a key in an earlier layer overrides the same key in
//! every later one. Layers are never modified after construction.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{TransformError, TransformResult};
use crate::model::Value;

/// One immutable key-value source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PropertyLayer {
    entries: BTreeMap<String, String>,
}

impl PropertyLayer {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Build a layer from a mapping of scalars (the properties adapter output).
    pub fn from_value(value: &Value) -> TransformResult<Self> {
        const EXPECTED: &str = "a mapping of scalars";
        let record = value
            .as_mapping()
            .ok_or_else(|| TransformError::shape("properties", EXPECTED, value.shape()))?;

        let entries = record
            .iter()
            .map(|(k, v)| {
                v.as_scalar()
                    .map(|s| (k.clone(), s.to_string()))
                    .ok_or_else(|| TransformError::InvalidShape {
                        operator: "properties",
                        expected: EXPECTED.to_string(),
                        actual: format!("a {} under '{}'", v.shape(), k),
                    })
            })
            .collect::<TransformResult<_>>()?;
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered, first-match-wins sequence of layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PropertyChain {
    layers: Vec<PropertyLayer>,
}

impl PropertyChain {
    pub fn new(layers: Vec<PropertyLayer>) -> Self {
        Self { layers }
    }

    pub fn layers(&self) -> &[PropertyLayer] {
        &self.layers
    }

    /// True iff some layer contains `key`.
    pub fn has(&self, key: &str) -> bool {
        self.layers.iter().any(|layer| layer.contains(key))
    }

    /// Value from the first layer containing `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }

    /// Merged view of all layers, earlier layers winning.
    pub fn effective(&self) -> BTreeMap<&str, &str> {
        let mut merged = BTreeMap::new();
        for layer in &self.layers {
            for (k, v) in &layer.entries {
                merged.entry(k.as_str()).or_insert(v.as_str());
            }
        }
        merged
    }
}

impl FromIterator<PropertyLayer> for PropertyChain {
    fn from_iter<I: IntoIterator<Item = PropertyLayer>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> PropertyChain {
        PropertyChain::new(vec![
            PropertyLayer::new([("key1", "value1"), ("key2", "value2")]),
            PropertyLayer::new([("foo", "value foo"), ("key2", "bar")]),
        ])
    }

    #[test]
    fn test_has_property() {
        let chain = chain();
        assert!(chain.has("foo"));
        assert!(chain.has("key1"));
        assert!(!chain.has("bar"));
    }

    #[test]
    fn test_get_property_first_match_wins() {
        let chain = chain();
        assert_eq!(chain.get("key2"), Some("value2"));
        assert_eq!(chain.get("foo"), Some("value foo"));
        assert_eq!(chain.get("bar"), None);
    }

    #[test]
    fn test_empty_chain() {
        let chain = PropertyChain::default();
        assert!(!chain.has("anything"));
        assert_eq!(chain.get("anything"), None);
        assert!(chain.effective().is_empty());
    }

    #[test]
    fn test_present_empty_value() {
        let chain = PropertyChain::new(vec![
            PropertyLayer::new([("k", "")]),
            PropertyLayer::new([("k", "fallback")]),
        ]);
        assert!(chain.has("k"));
        assert_eq!(chain.get("k"), Some(""));
    }

    #[test]
    fn test_effective_view() {
        let chain = chain();
        let merged = chain.effective();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged["key2"], "value2");
        assert_eq!(merged["foo"], "value foo");
    }

    #[test]
    fn test_layer_from_value() {
        let layer = PropertyLayer::from_value(&Value::mapping([("a", "1")])).unwrap();
        assert_eq!(layer.get("a"), Some("1"));

        assert!(PropertyLayer::from_value(&Value::sequence(["a"])).is_err());
        let nested = Value::mapping([("a", Value::mapping([("b", "c")]))]);
        assert!(PropertyLayer::from_value(&nested).is_err());
    }

    #[test]
    fn test_serializes_layers_in_order() {
        let json = serde_json::to_value(chain()).unwrap();
        assert_eq!(json[0]["key2"], "value2");
        assert_eq!(json[1]["key2"], "bar");
    }
}
