//! # Featgen - feature-configuration transformation toolkit
//!
//! Featgen reads heterogeneous text inputs (line lists, property files, CSV,
//! YAML), turns them into one dynamic record model, and runs them through a
//! small set of composable operators to produce ordered feature sets.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Input files │────▶│   Sources   │────▶│  Operators  │────▶│ Feature sets│
//! │ txt/yaml/...│     │  (auto-enc) │     │ (chainable) │     │   (JSON)    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use featgen::{run_pipeline, PipelineOptions};
//!
//! fn main() -> Result<(), featgen::PipelineError> {
//!     let options = PipelineOptions::new("conf", "features.txt", "mapping.properties");
//!     let output = run_pipeline(&options)?;
//!     println!("{}", output.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`model`] - The dynamic `Value` model
//! - [`source`] - File adapters with encoding detection
//! - [`transform`] - Operators, chains and the pipeline recipe
//! - [`properties`] - Layered key-value lookup
//! - [`logs`] - Broadcast logging

// Core modules
pub mod error;
pub mod model;

// Input
pub mod source;

// Transformation
pub mod transform;

// Lookup
pub mod properties;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    PipelineError,
    PipelineResult,
    SourceError,
    SourceResult,
    TransformError,
    TransformResult,
};

// =============================================================================
// Re-exports - Model
// =============================================================================

pub use model::{Record, Shape, Value};

// =============================================================================
// Re-exports - Sources
// =============================================================================

pub use source::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    parse_properties,
    CsvSource,
    InputSource,
    LineSource,
    PropertiesSource,
    YamlSource,
};

// =============================================================================
// Re-exports - Operators
// =============================================================================

pub use transform::{
    field_equals,
    field_key,
    field_mapper,
    field_matches,
    identity_key,
    identity_mapper,
    scalar_key,
    Chain,
    Diagnostic,
    Expand,
    Expansion,
    ExpansionTable,
    Filter,
    Rename,
    Sort,
    ToMap,
    Transformed,
    Transformer,
    NAME_FIELD,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    read_inputs,
    run_pipeline,
    run_recipe,
    FeatureGroup,
    PipelineInputs,
    PipelineOptions,
    PipelineOutput,
};

// =============================================================================
// Re-exports - Properties
// =============================================================================

pub use properties::{PropertyChain, PropertyLayer};
