//! Hierarchical YAML documents.

use std::path::{Path, PathBuf};

use crate::error::SourceResult;
use crate::model::Value;

use super::{decode_content, InputSource};

/// Reads a YAML document. Numbers and booleans become scalar strings and
/// `null` becomes the empty string.
#[derive(Debug, Clone)]
pub struct YamlSource {
    path: PathBuf,
}

impl YamlSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl InputSource for YamlSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, bytes: &[u8]) -> SourceResult<Value> {
        let doc: serde_yaml::Value = serde_yaml::from_str(&decode_content(bytes))?;
        Ok(Value::from(doc))
    }
}
