//! Transformation module.
//!
//! Operators over the dynamic record model:
//! - [`Rename`]: substitute scalars through a static table
//! - [`Expand`]: enrich scalar keys into records, with usage bookkeeping
//! - [`Filter`]: keep records matching a predicate
//! - [`Sort`]: stable sort by a derived string key
//! - [`ToMap`]: key a sequence into a mapping
//!
//! Each operator has a typed `apply` method and also implements
//! [`Transformer`], so operators can be composed into a [`Chain`].
//! [`pipeline`] wires them together with the input sources.

pub mod expand;
pub mod filter;
pub mod mapper;
pub mod pipeline;
pub mod rename;
pub mod sort;
pub mod to_map;

use std::fmt;

use serde::Serialize;

use crate::error::{TransformError, TransformResult};
use crate::model::Value;

pub use expand::{Expand, Expansion, ExpansionTable, NAME_FIELD};
pub use filter::{field_equals, field_matches, Filter, Predicate};
pub use mapper::{field_key, field_mapper, identity_key, identity_mapper, scalar_key, KeyFn, Mapper, SortKey};
pub use pipeline::*;
pub use rename::Rename;
pub use sort::Sort;
pub use to_map::ToMap;

// =============================================================================
// Diagnostics
// =============================================================================

/// A non-fatal condition found while expanding keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum Diagnostic {
    /// An input key had no entry in the expansion table.
    UnmatchedKey(String),
    /// A table entry was never looked up.
    UnusedEntry(String),
}

impl Diagnostic {
    pub fn key(&self) -> &str {
        match self {
            Diagnostic::UnmatchedKey(key) | Diagnostic::UnusedEntry(key) => key,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnmatchedKey(key) => write!(f, "Input key '{}' not found in data", key),
            Diagnostic::UnusedEntry(key) => write!(f, "Config key '{}' not used", key),
        }
    }
}

// =============================================================================
// Transformer
// =============================================================================

/// Output of one transformer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub value: Value,
    pub diagnostics: Vec<Diagnostic>,
}

impl Transformed {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

/// A pipeline operator.
///
/// `input` is `None` when the previous stage produced nothing at all, which
/// is distinct from an empty sequence.
pub trait Transformer: Send + Sync {
    fn name(&self) -> &'static str;

    fn transform(&self, input: Option<&Value>) -> TransformResult<Transformed>;
}

/// Unwrap an optional input or report it as nil.
pub(crate) fn require<'a>(
    input: Option<&'a Value>,
    operator: &'static str,
) -> TransformResult<&'a Value> {
    input.ok_or(TransformError::NilInput { operator })
}

// =============================================================================
// Chain
// =============================================================================

/// Runs transformers in sequence, feeding each the previous output.
///
/// The first error stops the chain and is returned unchanged. Diagnostics
/// are accumulated in stage order.
#[derive(Default)]
pub struct Chain {
    stages: Vec<Box<dyn Transformer>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn stage(mut self, transformer: impl Transformer + 'static) -> Self {
        self.stages.push(Box::new(transformer));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, input: Option<&Value>) -> TransformResult<Transformed> {
        let Some((first, rest)) = self.stages.split_first() else {
            return Ok(Transformed::new(require(input, "chain")?.clone()));
        };

        let mut output = first.transform(input)?;
        for stage in rest {
            let next = stage.transform(Some(&output.value))?;
            output.value = next.value;
            output.diagnostics.extend(next.diagnostics);
        }
        Ok(output)
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("stages", &self.names()).finish()
    }
}
