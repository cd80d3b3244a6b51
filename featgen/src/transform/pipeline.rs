//! The feature pipeline: the fixed recipe wiring sources and operators.
//!
//! 1. Read the feature list (one name per line, `#` comments)
//! 2. Read the feature mapping (properties) and rename features through it
//! 3. Read the configuration (YAML, or CSV keyed by a column)
//! 4. Expand feature names into configuration records
//! 5. Read the property files into a [`PropertyChain`]
//! 6. Per feature set: filter on the group field, sort on the sort field
//!
//! # Example
//!
//! ```rust,ignore
//! use featgen::{run_pipeline, PipelineOptions};
//!
//! let options = PipelineOptions::new("conf", "features.txt", "mapping.properties")
//!     .with_feature_sets(["core"]);
//! let output = run_pipeline(&options)?;
//! for group in &output.groups {
//!     println!("{}: {} features", group.name, group.features.len());
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{PipelineError, PipelineResult, TransformError};
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::model::Value;
use crate::properties::{PropertyChain, PropertyLayer};
use crate::source::{CsvSource, InputSource, LineSource, PropertiesSource, YamlSource};

use super::{
    field_equals, field_key, field_mapper, identity_mapper, Chain, Diagnostic, Expand,
    ExpansionTable, Filter, Rename, Sort, ToMap,
};

/// Options for a pipeline run. Paths are relative to `config_dir`.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOptions {
    pub config_dir: PathBuf,

    /// Feature list, one name per line
    pub feature_file: PathBuf,

    /// Properties file renaming features (old name = new name)
    pub feature_mapping_file: PathBuf,

    /// Feature configuration, YAML or CSV
    pub config_file: PathBuf,

    /// Feature sets to produce; empty means every set found in the config
    pub feature_sets: Vec<String>,

    /// Property files, highest priority first
    pub property_files: Vec<PathBuf>,

    /// Record field naming the feature set
    pub group_field: String,

    /// Record field the features of a set are ordered by
    pub sort_field: String,

    /// Column holding the feature name in a CSV configuration
    pub key_field: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("."),
            feature_file: PathBuf::new(),
            feature_mapping_file: PathBuf::new(),
            config_file: PathBuf::from("config.yaml"),
            feature_sets: Vec::new(),
            property_files: Vec::new(),
            group_field: "feature-set".to_string(),
            sort_field: "priority".to_string(),
            key_field: "name".to_string(),
        }
    }
}

impl PipelineOptions {
    pub fn new(
        config_dir: impl Into<PathBuf>,
        feature_file: impl Into<PathBuf>,
        feature_mapping_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config_dir: config_dir.into(),
            feature_file: feature_file.into(),
            feature_mapping_file: feature_mapping_file.into(),
            ..Self::default()
        }
    }

    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = path.into();
        self
    }

    pub fn with_feature_sets<I, S>(mut self, sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feature_sets = sets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_property_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.property_files = files.into_iter().map(Into::into).collect();
        self
    }

    fn validate(&self) -> PipelineResult<()> {
        if self.feature_file.as_os_str().is_empty() {
            return Err(PipelineError::MissingOption("feature_file"));
        }
        if self.feature_mapping_file.as_os_str().is_empty() {
            return Err(PipelineError::MissingOption("feature_mapping_file"));
        }
        if self.config_file.as_os_str().is_empty() {
            return Err(PipelineError::MissingOption("config_file"));
        }
        Ok(())
    }
}

/// Everything the recipe consumes, already parsed.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    /// Sequence of raw feature names
    pub features: Value,
    /// Mapping of old name to new name
    pub feature_mapping: Value,
    pub config: ExpansionTable,
    pub properties: PropertyChain,
}

/// The ordered features of one feature set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureGroup {
    pub name: String,
    pub features: Vec<Value>,
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    /// All expanded features, in feature-file order
    pub features: Vec<Value>,

    /// One group per feature set
    pub groups: Vec<FeatureGroup>,

    /// Unmatched feature names and unused configuration entries
    pub diagnostics: Vec<Diagnostic>,

    pub properties: PropertyChain,
}

impl PipelineOutput {
    pub fn group(&self, name: &str) -> Option<&FeatureGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn summary(&self) -> String {
        format!(
            "Expanded: {} features, {} groups, {} diagnostics",
            self.features.len(),
            self.groups.len(),
            self.diagnostics.len()
        )
    }
}

/// Read every input named by `options` and run the recipe.
pub fn run_pipeline(options: &PipelineOptions) -> PipelineResult<PipelineOutput> {
    let inputs = read_inputs(options)?;
    run_recipe(inputs, options)
}

/// Read the input files. Any read or parse failure aborts the run.
pub fn read_inputs(options: &PipelineOptions) -> PipelineResult<PipelineInputs> {
    options.validate()?;
    let root = options.config_dir.as_path();

    log_info(format!("📖 Reading features from {}", options.feature_file.display()));
    let features = LineSource::new(&options.feature_file)
        .ignore_comment(true)
        .trim(true)
        .provide(root)?;

    log_info(format!(
        "🗺️  Reading feature mapping from {}",
        options.feature_mapping_file.display()
    ));
    let feature_mapping = PropertiesSource::new(&options.feature_mapping_file).provide(root)?;

    log_info(format!("📋 Reading config from {}", options.config_file.display()));
    let config = read_config(root, &options.config_file, &options.key_field)?;
    log_success(format!("{} configured features", config.len()));

    let properties = read_properties(root, &options.property_files)?;

    Ok(PipelineInputs {
        features,
        feature_mapping,
        config,
        properties,
    })
}

/// Run the operators over already-parsed inputs.
pub fn run_recipe(
    inputs: PipelineInputs,
    options: &PipelineOptions,
) -> PipelineResult<PipelineOutput> {
    log_info("⚙️  Renaming features...");
    let rename = Rename::from_value(&inputs.feature_mapping)?;
    let renamed = Value::sequence(rename.apply(Some(&inputs.features))?);

    log_info("⚙️  Expanding features by config...");
    let expansion = Expand::new(inputs.config)
        .retain_key(true)
        .apply(Some(&renamed))?;
    log_success(format!("Expanded {} features", expansion.records.len()));
    if !expansion.diagnostics.is_empty() {
        log_warning(format!(
            "{} unmatched features, {} unused config entries",
            expansion.unmatched().count(),
            expansion.unused().count()
        ));
    }

    let features = Value::Sequence(expansion.records);
    let sets = if options.feature_sets.is_empty() {
        discover_sets(&features, &options.group_field)
    } else {
        options.feature_sets.clone()
    };

    let mut groups = Vec::with_capacity(sets.len());
    for set in sets {
        let chain = Chain::new()
            .stage(Filter::new(field_equals(options.group_field.clone(), set.clone())))
            .stage(Sort::new(field_key(options.sort_field.clone())));
        let records = match chain.run(Some(&features))?.value {
            Value::Sequence(records) => records,
            other => return Err(TransformError::shape(Sort::NAME, "a sequence", other.shape()).into()),
        };

        if records.is_empty() {
            log_warning(format!("Feature set '{}' is empty", set));
        } else {
            log_info_indent(format!("{}: {} features", set, records.len()), 1);
        }
        groups.push(FeatureGroup {
            name: set,
            features: records,
        });
    }

    let features = match features {
        Value::Sequence(records) => records,
        other => vec![other],
    };
    let output = PipelineOutput {
        features,
        groups,
        diagnostics: expansion.diagnostics,
        properties: inputs.properties,
    };
    log_success(output.summary());
    Ok(output)
}

/// YAML configs are used directly; CSV configs are keyed by `key_field`.
fn read_config(root: &Path, config_file: &Path, key_field: &str) -> PipelineResult<ExpansionTable> {
    let is_csv = config_file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        let rows = CsvSource::new(config_file).provide(root)?;
        let keyed = ToMap::new(field_mapper(key_field.to_string()), identity_mapper).apply(&rows)?;
        Ok(ExpansionTable::new(keyed))
    } else {
        match YamlSource::new(config_file).provide(root)? {
            // An empty document is an empty table.
            Value::Scalar(s) if s.is_empty() => Ok(ExpansionTable::default()),
            doc => Ok(ExpansionTable::from_value(doc)?),
        }
    }
}

fn read_properties(root: &Path, files: &[PathBuf]) -> PipelineResult<PropertyChain> {
    let mut layers = Vec::with_capacity(files.len());
    for file in files {
        log_info(format!("🔑 Reading properties from {}", file.display()));
        let value = PropertiesSource::new(file).provide(root)?;
        layers.push(PropertyLayer::from_value(&value)?);
    }
    Ok(PropertyChain::new(layers))
}

/// Distinct group values in first-appearance order.
fn discover_sets(features: &Value, group_field: &str) -> Vec<String> {
    let mut sets: Vec<String> = Vec::new();
    for feature in features.as_sequence().unwrap_or_default() {
        match feature.field_str(group_field) {
            Some(set) if !sets.iter().any(|s| s == set) => sets.push(set.to_string()),
            Some(_) => {}
            None => log_warning(format!(
                "Feature '{}' has no '{}'",
                feature.field_str(super::NAME_FIELD).unwrap_or("?"),
                group_field
            )),
        }
    }
    sets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> PipelineInputs {
        PipelineInputs {
            features: Value::sequence(["b", "a", "c"]),
            feature_mapping: Value::mapping([("a", "Alpha")]),
            config: ExpansionTable::new([
                ("Alpha", Value::mapping([("priority", "2"), ("feature-set", "core")])),
                ("b", Value::mapping([("priority", "1"), ("feature-set", "core")])),
                ("x", Value::mapping([("priority", "0"), ("feature-set", "extra")])),
            ]),
            properties: PropertyChain::default(),
        }
    }

    #[test]
    fn test_default_options() {
        let opts = PipelineOptions::default();
        assert_eq!(opts.config_file, PathBuf::from("config.yaml"));
        assert_eq!(opts.group_field, "feature-set");
        assert_eq!(opts.sort_field, "priority");
        assert!(opts.feature_sets.is_empty());
    }

    #[test]
    fn test_missing_options() {
        let err = read_inputs(&PipelineOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingOption("feature_file")));
    }

    #[test]
    fn test_recipe_groups_and_diagnostics() {
        let options = PipelineOptions::default().with_feature_sets(["core", "extra"]);
        let output = run_recipe(inputs(), &options).unwrap();

        assert_eq!(output.features.len(), 2);
        assert_eq!(
            output.diagnostics,
            vec![
                Diagnostic::UnmatchedKey("c".into()),
                Diagnostic::UnusedEntry("x".into()),
            ]
        );

        let core = output.group("core").unwrap();
        let names: Vec<_> = core.features.iter().filter_map(|f| f.field_str("Name")).collect();
        assert_eq!(names, vec!["b", "Alpha"]);

        assert!(output.group("extra").unwrap().features.is_empty());
    }

    #[test]
    fn test_recipe_discovers_sets() {
        let mut inputs = inputs();
        inputs.features = Value::sequence(["x", "a", "b"]);
        let output = run_recipe(inputs, &PipelineOptions::default()).unwrap();

        let names: Vec<_> = output.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["extra", "core"]);
    }

    #[test]
    fn test_discover_sets_warns_on_missing_group() {
        let mut rx = crate::logs::LOG_BROADCASTER.subscribe();
        let features = Value::Sequence(vec![
            Value::mapping([("Name", "a"), ("feature-set", "core")]),
            Value::mapping([("Name", "lonely")]),
            Value::mapping([("Name", "b"), ("feature-set", "core")]),
        ]);

        assert_eq!(discover_sets(&features, "feature-set"), vec!["core"]);

        let warned = crate::logs::drain(&mut rx).into_iter().any(|entry| {
            entry.level == crate::logs::LogLevel::Warning
                && entry.message == "Feature 'lonely' has no 'feature-set'"
        });
        assert!(warned);
    }

    #[test]
    fn test_empty_yaml_config_is_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.yaml"), "").unwrap();

        let table = read_config(dir.path(), Path::new("config.yaml"), "name").unwrap();
        assert!(table.is_empty());

        std::fs::write(dir.path().join("config.yaml"), "- a\n").unwrap();
        assert!(read_config(dir.path(), Path::new("config.yaml"), "name").is_err());
    }

    #[test]
    fn test_recipe_sort_error_halts() {
        let mut inputs = inputs();
        inputs.config = ExpansionTable::new([("b", Value::mapping([("feature-set", "core")]))]);
        let options = PipelineOptions::default().with_feature_sets(["core"]);

        let err = run_recipe(inputs, &options).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Transform(TransformError::InvalidShape { operator: "sort", .. })
        ));
    }

    #[test]
    fn test_output_serializes() {
        let options = PipelineOptions::default().with_feature_sets(["core"]);
        let output = run_recipe(inputs(), &options).unwrap();
        let json = serde_json::to_value(&output).unwrap();

        assert_eq!(json["groups"][0]["name"], "core");
        assert_eq!(json["groups"][0]["features"][0]["Name"], "b");
        assert_eq!(json["diagnostics"][0]["kind"], "unmatched_key");
    }
}
