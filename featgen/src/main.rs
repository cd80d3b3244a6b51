//! Featgen CLI - expand feature lists into ordered feature sets
//!
//! # Main Command
//!
//! ```bash
//! featgen run conf/ --feature-file features.txt --feature-mapping-file mapping.properties
//! featgen run conf/ ... --feature-set core --property-file local.properties -o out.json
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! featgen lines features.txt --ignore-comment --trim   # Line list as JSON
//! featgen properties mapping.properties                # Properties as JSON
//! featgen csv config.csv --delimiter ';'               # CSV records as JSON
//! featgen yaml config.yaml                             # YAML document as JSON
//! featgen lookup db.url --property-file a.properties   # First-match lookup
//! ```

use clap::{Parser, Subcommand};
use featgen::logs::LOG_BROADCASTER;
use featgen::{
    run_pipeline, CsvSource, InputSource, LineSource, PipelineOptions, PropertiesSource,
    PropertyChain, PropertyLayer, Value, YamlSource,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "featgen")]
#[command(about = "Expand feature lists into ordered feature sets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: rename, expand by config, group and sort
    Run {
        /// Directory every input path is relative to
        #[arg(env = "FEATGEN_CONFIG_DIR")]
        config_dir: PathBuf,

        /// Feature list, one name per line
        #[arg(long, env = "FEATGEN_FEATURE_FILE")]
        feature_file: PathBuf,

        /// Properties file renaming features
        #[arg(long, env = "FEATGEN_FEATURE_MAPPING_FILE")]
        feature_mapping_file: PathBuf,

        /// Feature configuration (YAML, or CSV when it ends in .csv)
        #[arg(long, env = "FEATGEN_CONFIG_FILE", default_value = "config.yaml")]
        config_file: PathBuf,

        /// Feature set to produce (repeatable; default: all sets in the config)
        #[arg(long = "feature-set", env = "FEATGEN_FEATURE_SETS", value_delimiter = ',')]
        feature_sets: Vec<String>,

        /// Property file, highest priority first (repeatable)
        #[arg(long = "property-file", env = "FEATGEN_PROPERTY_FILES", value_delimiter = ',')]
        property_files: Vec<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not echo progress to stderr
        #[arg(short, long)]
        quiet: bool,
    },

    /// Read a line list and output JSON
    Lines {
        input: PathBuf,

        /// Drop everything after '#'
        #[arg(long)]
        ignore_comment: bool,

        /// Trim surrounding whitespace
        #[arg(long)]
        trim: bool,
    },

    /// Read a properties file and output JSON
    Properties { input: PathBuf },

    /// Read a CSV file and output JSON
    Csv {
        input: PathBuf,

        /// Column names; the first row is then data
        #[arg(long, value_delimiter = ',')]
        headers: Option<Vec<String>>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Read a YAML document and output JSON
    Yaml { input: PathBuf },

    /// Look a key up through layered property files
    Lookup {
        key: String,

        /// Property file, highest priority first (repeatable)
        #[arg(long = "property-file", env = "FEATGEN_PROPERTY_FILES", value_delimiter = ',', required = true)]
        property_files: Vec<PathBuf>,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config_dir,
            feature_file,
            feature_mapping_file,
            config_file,
            feature_sets,
            property_files,
            output,
            quiet,
        } => {
            let options = PipelineOptions::new(config_dir, feature_file, feature_mapping_file)
                .with_config_file(config_file)
                .with_feature_sets(feature_sets)
                .with_property_files(property_files);
            cmd_run(&options, output.as_deref(), quiet)
        }

        Commands::Lines {
            input,
            ignore_comment,
            trim,
        } => {
            let source = LineSource::new(input).ignore_comment(ignore_comment).trim(trim);
            cmd_print(&source)
        }

        Commands::Properties { input } => cmd_print(&PropertiesSource::new(input)),

        Commands::Csv {
            input,
            headers,
            delimiter,
        } => cmd_csv(input, headers, delimiter),

        Commands::Yaml { input } => cmd_print(&YamlSource::new(input)),

        Commands::Lookup { key, property_files } => cmd_lookup(&key, &property_files),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_run(
    options: &PipelineOptions,
    output: Option<&Path>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if quiet {
        LOG_BROADCASTER.set_echo(false);
    }
    eprintln!("📄 Processing: {}", options.config_dir.display());

    let result = run_pipeline(options)?;

    if !quiet {
        for diagnostic in &result.diagnostics {
            eprintln!("   ⚠️  {}", diagnostic);
        }
        for group in &result.groups {
            eprintln!("   📦 {}: {} features", group.name, group.features.len());
        }
    }

    let json = serde_json::to_string_pretty(&result)?;
    write_output(&json, output)?;

    if !quiet {
        eprintln!("\n✨ Done!");
    }
    Ok(())
}

fn cmd_print(source: &dyn InputSource) -> Result<(), Box<dyn std::error::Error>> {
    let value = source.provide(Path::new(""))?;
    print_json(&value)
}

fn cmd_csv(
    input: PathBuf,
    headers: Option<Vec<String>>,
    delimiter: Option<char>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut source = CsvSource::new(input);
    if let Some(headers) = headers {
        source = source.with_headers(headers);
    }
    if let Some(d) = delimiter {
        let byte = u8::try_from(d).map_err(|_| format!("Delimiter must be ASCII: '{}'", d))?;
        source = source.with_delimiter(byte);
    }
    cmd_print(&source)
}

fn cmd_lookup(key: &str, files: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let mut layers = Vec::with_capacity(files.len());
    for file in files {
        let value = PropertiesSource::new(file).provide(Path::new(""))?;
        layers.push(PropertyLayer::from_value(&value)?);
    }
    let chain = PropertyChain::new(layers);

    match chain.get(key) {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => Err(format!("Property not found: {}", key).into()),
    }
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(value)?;
    write_output(&json, None)
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
