//! Expand: turn scalar keys into full records from a side table.
//!
//! Besides projecting sparse names onto rich configuration, Expand checks
//! that both sides agree. Every input key missing from the table is reported
//! as [`Diagnostic::UnmatchedKey`], and every table entry nobody asked for
//! as [`Diagnostic::UnusedEntry`]. Neither stops the pipeline.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::error::{TransformError, TransformResult};
use crate::logs::log_warning;
use crate::model::Value;

use super::mapper::{identity_key, KeyFn};
use super::{require, Diagnostic, Transformed, Transformer};

/// Field added to expanded records when the original key is retained.
pub const NAME_FIELD: &str = "Name";

// =============================================================================
// Expansion table
// =============================================================================

/// Side dataset keyed by name. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionTable {
    entries: BTreeMap<String, Value>,
}

impl ExpansionTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Use a top-level mapping (e.g. a YAML document) as the table.
    pub fn from_value(value: Value) -> TransformResult<Self> {
        match value {
            Value::Mapping(entries) => Ok(Self { entries }),
            other => Err(TransformError::shape(Expand::NAME, "a mapping", other.shape())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Expand operator
// =============================================================================

/// Result of one expansion: matched records and bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub records: Vec<Value>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Expansion {
    pub fn unmatched(&self) -> impl Iterator<Item = &str> {
        self.diagnostics.iter().filter_map(|d| match d {
            Diagnostic::UnmatchedKey(key) => Some(key.as_str()),
            Diagnostic::UnusedEntry(_) => None,
        })
    }

    pub fn unused(&self) -> impl Iterator<Item = &str> {
        self.diagnostics.iter().filter_map(|d| match d {
            Diagnostic::UnusedEntry(key) => Some(key.as_str()),
            Diagnostic::UnmatchedKey(_) => None,
        })
    }
}

pub struct Expand {
    table: Arc<ExpansionTable>,
    key: KeyFn,
    retain_key: bool,
}

impl Expand {
    pub const NAME: &'static str = "expand";

    /// Expand with identity keys and without retaining the original key.
    ///
    /// Pass an `Arc<ExpansionTable>` to share one table between operators.
    pub fn new(table: impl Into<Arc<ExpansionTable>>) -> Self {
        Self {
            table: table.into(),
            key: Box::new(identity_key),
            retain_key: false,
        }
    }

    /// Derive lookup keys with `key` instead of using the scalar as-is.
    pub fn with_key_fn(mut self, key: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.key = Box::new(key);
        self
    }

    /// Store the original scalar in the [`NAME_FIELD`] of each expanded record.
    pub fn retain_key(mut self, retain: bool) -> Self {
        self.retain_key = retain;
        self
    }

    pub fn table(&self) -> &ExpansionTable {
        &self.table
    }

    pub fn apply(&self, input: Option<&Value>) -> TransformResult<Expansion> {
        let input = require(input, Self::NAME)?;
        let keys = input.scalars(Self::NAME)?;

        let mut used: HashSet<&str> = HashSet::new();
        let mut expansion = Expansion::default();

        for original in keys {
            let derived = (self.key)(&original);
            let Some((table_key, entry)) = self.table.entries.get_key_value(&derived) else {
                let diagnostic = Diagnostic::UnmatchedKey(original);
                log_warning(diagnostic.to_string());
                expansion.diagnostics.push(diagnostic);
                continue;
            };

            // Copy first: the same entry may be expanded under several keys.
            let mut record = entry.clone();
            if self.retain_key {
                match &mut record {
                    Value::Mapping(fields) => {
                        if fields.contains_key(NAME_FIELD) {
                            log_warning(format!(
                                "Config entry '{}' already has a '{}' field, replacing it with '{}'",
                                table_key, NAME_FIELD, original
                            ));
                        }
                        fields.insert(NAME_FIELD.to_string(), Value::Scalar(original));
                    }
                    other => {
                        return Err(TransformError::InvalidShape {
                            operator: Self::NAME,
                            expected: format!("a mapping for entry '{}'", table_key),
                            actual: other.shape().to_string(),
                        });
                    }
                }
            }
            used.insert(table_key.as_str());
            expansion.records.push(record);
        }

        for key in self.table.keys() {
            if !used.contains(key) {
                let diagnostic = Diagnostic::UnusedEntry(key.to_string());
                log_warning(diagnostic.to_string());
                expansion.diagnostics.push(diagnostic);
            }
        }

        Ok(expansion)
    }
}

impl Transformer for Expand {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn transform(&self, input: Option<&Value>) -> TransformResult<Transformed> {
        let expansion = self.apply(input)?;
        Ok(Transformed::new(Value::Sequence(expansion.records)).with_diagnostics(expansion.diagnostics))
    }
}

impl std::fmt::Debug for Expand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expand")
            .field("table", &self.table)
            .field("retain_key", &self.retain_key)
            .finish_non_exhaustive()
    }
}
