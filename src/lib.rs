//! Detparse: format registry and parsers for object detection annotation
//! datasets.
//!
//! Detparse maps a short format token (`coco`, `voc`, `openimages`, `air`)
//! to a parser instance behind one capability trait, forwarding the caller's
//! configuration bag to the selected parser's constructor. Constructing a
//! parser only validates configuration; file reading happens when the parser
//! is asked to parse, and every parser decodes into the same normalized
//! dataset model.
//!
//! # Modules
//!
//! - [`factory`]: token resolution and parser construction
//! - [`format`]: the closed set of supported formats
//! - [`parser`]: the capability trait and the per-format variants
//! - [`model`]: normalized dataset records every parser produces
//! - [`error`]: error types for detparse operations
//!
//! # Example
//!
//! ```no_run
//! use detparse::create_parser;
//! use serde_json::json;
//!
//! let bag = json!({"root": "/data/coco", "split": "val2017"})
//!     .as_object()
//!     .cloned()
//!     .unwrap();
//! let parser = create_parser("coco", bag)?;
//! let dataset = parser.parse()?;
//! println!("{} annotations", dataset.annotations.len());
//! # Ok::<(), detparse::DetparseError>(())
//! ```

pub mod error;
pub mod factory;
pub mod format;
pub mod model;
pub mod parser;

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

pub use error::DetparseError;
pub use factory::{build_parser, create_parser, ConfigBag};
pub use format::Format;
pub use parser::{AnnotationParser, ParserOptions};

/// The detparse CLI application.
#[derive(Parser)]
#[command(name = "detparse")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Parse an annotation source and print the result.
    Parse(ParseArgs),

    /// List the supported annotation formats.
    Formats,
}

/// Arguments for the parse subcommand.
#[derive(clap::Args)]
struct ParseArgs {
    /// Annotation format ('coco', 'voc', 'openimages', or 'air').
    #[arg(long)]
    format: String,

    /// Config file (YAML or JSON) providing parser options.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Single parser option as KEY=VALUE; repeatable. Values are read as
    /// JSON, so 'min_image_size=32' is a number and unquoted text a string.
    /// Overrides values from --config.
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    options: Vec<String>,

    /// Output format for the parsed dataset ('summary' or 'json').
    #[arg(long, default_value = "summary")]
    output: String,
}

/// Run the detparse CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), DetparseError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Parse(args)) => run_parse(args),
        Some(Commands::Formats) => {
            run_formats();
            Ok(())
        }
        None => {
            // No subcommand: print a hint and exit successfully
            println!("detparse {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Format registry and parsers for object detection annotation datasets.");
            println!();
            println!("Run 'detparse --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the formats subcommand.
fn run_formats() {
    for format in Format::ALL {
        println!("{:<12} {}", format.token(), format.summary());
    }
}

/// Execute the parse subcommand.
fn run_parse(args: ParseArgs) -> Result<(), DetparseError> {
    let bag = assemble_bag(args.config.as_deref(), &args.options)?;
    let parser = create_parser(&args.format, bag)?;
    let dataset = parser.parse()?;

    match args.output.as_str() {
        "json" => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, &dataset).map_err(std::io::Error::from)?;
            writeln!(handle)?;
        }
        _ => {
            // Default summary output
            println!("format:      {}", parser.format());
            if let Some(name) = &dataset.info.name {
                println!("name:        {name}");
            }
            println!("images:      {}", dataset.images.len());
            println!("categories:  {}", dataset.categories.len());
            println!("annotations: {}", dataset.annotations.len());
        }
    }

    Ok(())
}

/// Builds the option bag from an optional config file plus `-o` overrides.
fn assemble_bag(config: Option<&Path>, options: &[String]) -> Result<ConfigBag, DetparseError> {
    let mut bag = match config {
        Some(path) => load_config_bag(path)?,
        None => ConfigBag::new(),
    };

    for raw in options {
        let (key, value) = parse_option_pair(raw)?;
        bag.insert(key, value);
    }

    Ok(bag)
}

/// Loads a config file as an option bag. YAML or JSON by extension.
fn load_config_bag(path: &Path) -> Result<ConfigBag, DetparseError> {
    let file_err = |message: String| DetparseError::ConfigFile {
        path: path.to_path_buf(),
        message,
    };
    let contents = fs::read_to_string(path).map_err(|error| file_err(error.to_string()))?;

    let value: serde_json::Value = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&contents).map_err(|error| file_err(error.to_string()))?
        }
        _ => serde_json::from_str(&contents).map_err(|error| file_err(error.to_string()))?,
    };

    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(file_err("expected a mapping at the top level".to_string())),
    }
}

/// Splits a `KEY=VALUE` option pair.
///
/// The value is read as JSON so booleans, numbers, and lists come through
/// typed; anything that does not parse stays a plain string.
fn parse_option_pair(raw: &str) -> Result<(String, serde_json::Value), DetparseError> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(DetparseError::OptionSyntax {
            raw: raw.to_string(),
        });
    };

    let key = key.trim();
    if key.is_empty() {
        return Err(DetparseError::OptionSyntax {
            raw: raw.to_string(),
        });
    }

    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn option_values_parse_as_json_scalars() {
        assert_eq!(
            parse_option_pair("has_labels=false").unwrap(),
            ("has_labels".to_string(), Value::Bool(false))
        );
        assert_eq!(
            parse_option_pair("min_image_size=32").unwrap(),
            ("min_image_size".to_string(), json!(32))
        );
        assert_eq!(
            parse_option_pair("classes=[\"cat\",\"dog\"]").unwrap(),
            ("classes".to_string(), json!(["cat", "dog"]))
        );
    }

    #[test]
    fn unparseable_option_values_stay_strings() {
        assert_eq!(
            parse_option_pair("root=/data/coco").unwrap(),
            ("root".to_string(), json!("/data/coco"))
        );
        assert_eq!(
            parse_option_pair("split=train").unwrap(),
            ("split".to_string(), json!("train"))
        );
    }

    #[test]
    fn equals_in_value_is_preserved() {
        assert_eq!(
            parse_option_pair("split=a=b").unwrap(),
            ("split".to_string(), json!("a=b"))
        );
    }

    #[test]
    fn malformed_pairs_are_rejected() {
        assert!(matches!(
            parse_option_pair("no-equals-here"),
            Err(DetparseError::OptionSyntax { .. })
        ));
        assert!(matches!(
            parse_option_pair("=value"),
            Err(DetparseError::OptionSyntax { .. })
        ));
    }

    #[test]
    fn overrides_win_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"split": "train", "root": "/data"}"#).unwrap();

        let bag = assemble_bag(Some(&path), &["split=val".to_string()]).unwrap();
        assert_eq!(bag.get("split"), Some(&json!("val")));
        assert_eq!(bag.get("root"), Some(&json!("/data")));
    }

    #[test]
    fn yaml_config_files_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "split: val2017\nhas_labels: false\n").unwrap();

        let bag = load_config_bag(&path).unwrap();
        assert_eq!(bag.get("split"), Some(&json!("val2017")));
        assert_eq!(bag.get("has_labels"), Some(&json!(false)));
    }

    #[test]
    fn non_mapping_config_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(matches!(
            load_config_bag(&path),
            Err(DetparseError::ConfigFile { .. })
        ));
    }

    #[test]
    fn missing_config_file_reports_the_path() {
        let err = load_config_bag(Path::new("no_such_config.yaml")).unwrap_err();

        match err {
            DetparseError::ConfigFile { path, message } => {
                assert_eq!(path, Path::new("no_such_config.yaml"));
                assert!(!message.is_empty());
            }
            other => panic!("expected ConfigFile, got {other:?}"),
        }
    }
}
