use std::path::PathBuf;
use thiserror::Error;

use crate::format::Format;

/// The main error type for detparse operations.
#[derive(Debug, Error)]
pub enum DetparseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The registry's single failure mode: the supplied token matched none of
    /// the known formats. Raised before any construction work happens.
    #[error("Unsupported annotation format '{token}' (supported: {})", Format::supported_tokens())]
    UnsupportedFormat { token: String },

    /// The configuration bag did not deserialize into the selected variant's
    /// config struct (unknown option name or mismatched value type).
    #[error("Invalid configuration for '{format}' parser: {source}")]
    Config {
        format: Format,
        #[source]
        source: serde_json::Error,
    },

    /// The bag deserialized but the resulting config fails the variant's
    /// semantic checks (empty split name, duplicate classes, and so on).
    #[error("Invalid configuration for '{format}' parser: {message}")]
    InvalidConfig { format: Format, message: String },

    #[error("Failed to parse COCO JSON from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse VOC XML from {path}: {message}")]
    VocXmlParse { path: PathBuf, message: String },

    #[error("Failed to parse CSV from {path}: {source}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A directory-based dataset is missing the files or subdirectories its
    /// layout convention requires.
    #[error("Invalid dataset layout at {path}: {message}")]
    LayoutInvalid { path: PathBuf, message: String },

    /// The source decoded fine but its contents are inconsistent (unknown
    /// class name, conflicting image dimensions, and similar).
    #[error("Invalid annotation data in {path}: {message}")]
    InvalidData { path: PathBuf, message: String },

    #[error("Invalid option '{raw}': expected KEY=VALUE")]
    OptionSyntax { raw: String },

    #[error("Failed to load config file {path}: {message}")]
    ConfigFile { path: PathBuf, message: String },
}
