//! Error types for the featgen pipeline.
//!
//! Errors are layered the same way the pipeline is:
//!
//! - [`SourceError`] - reading and decoding input files
//! - [`TransformError`] - operator failures (shape and missing-input errors)
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Conversion between layers is automatic via `From`, so `?` works across
//! boundaries. Expand bookkeeping (unmatched and unused keys) is not an error;
//! see [`crate::transform::Diagnostic`].

use std::path::PathBuf;

use thiserror::Error;

use crate::model::Shape;

// =============================================================================
// Source Errors
// =============================================================================

/// Errors raised by the format adapters.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read the file from disk.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed delimited text.
    #[error("Invalid CSV at line {line}: {message}")]
    Csv { line: u64, message: String },

    /// Delimited text without a header row.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// Malformed properties file.
    #[error("Invalid properties at line {line}: {message}")]
    Properties { line: usize, message: String },

    /// Malformed YAML document.
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Parse failure attributed to a specific file.
    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<SourceError>,
    },
}

impl SourceError {
    /// Attach the file path to a parse error.
    ///
    /// Read errors already carry their path and are returned unchanged.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            err @ (SourceError::Read { .. } | SourceError::InFile { .. }) => err,
            err => SourceError::InFile {
                path: path.into(),
                source: Box::new(err),
            },
        }
    }
}

impl From<csv::Error> for SourceError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        SourceError::Csv {
            line,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors raised by the transformer operators.
///
/// All variants are fatal to the stage that raised them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The operator received a value of the wrong shape.
    #[error("{operator}: expected {expected}, got {actual}")]
    InvalidShape {
        operator: &'static str,
        expected: String,
        actual: String,
    },

    /// Expand and the other operators received no input at all.
    #[error("{operator}: input is nil")]
    NilInput { operator: &'static str },

    /// Rename received no input at all.
    #[error("{operator}: input is empty")]
    EmptyInput { operator: &'static str },

    /// A regex predicate could not be compiled.
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl TransformError {
    /// Shape mismatch where the actual value's shape is all there is to say.
    pub fn shape(operator: &'static str, expected: impl Into<String>, actual: Shape) -> Self {
        TransformError::InvalidShape {
            operator,
            expected: expected.into(),
            actual: actual.to_string(),
        }
    }
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run_pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An input file could not be read or parsed.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// An operator failed.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// A required option was not supplied.
    #[error("Missing option: {0}")]
    MissingOption(&'static str),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for adapter operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for operator calls.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let source_err = SourceError::NoHeaders;
        let pipeline_err: PipelineError = source_err.into();
        assert!(pipeline_err.to_string().contains("No headers"));

        let transform_err = TransformError::NilInput { operator: "expand" };
        let pipeline_err: PipelineError = transform_err.into();
        assert!(pipeline_err.to_string().contains("expand"));
    }

    #[test]
    fn test_invalid_shape_format() {
        let err = TransformError::shape("filter", "a sequence of records", Shape::Scalar);
        let msg = err.to_string();
        assert!(msg.contains("filter"));
        assert!(msg.contains("a sequence of records"));
        assert!(msg.contains("scalar"));
    }

    #[test]
    fn test_in_file_keeps_read_errors() {
        let err = SourceError::Read {
            path: PathBuf::from("a.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let wrapped = err.in_file("b.txt");
        assert!(wrapped.to_string().contains("a.txt"));

        let wrapped = SourceError::NoHeaders.in_file("c.csv");
        let msg = wrapped.to_string();
        assert!(msg.starts_with("c.csv"));
        assert!(msg.contains("No headers"));
    }
}
