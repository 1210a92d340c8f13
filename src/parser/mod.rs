//! Format-specific annotation parsers behind one capability trait.
//!
//! Each supported format lives in its own module with two types: a config
//! struct deserialized from the caller's option bag, and a parser that holds
//! the validated config. Constructing a parser never touches the filesystem;
//! [`AnnotationParser::parse`] does all the reading.

pub mod air;
pub mod coco;
pub mod open_images;
mod options;
pub mod voc;

pub use options::ParserOptions;

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::DetparseError;
use crate::format::Format;
use crate::model::Dataset;

/// The capability every format variant provides.
///
/// Implementations are cheap to construct and hold no open resources, so a
/// caller can build one per dataset split and keep it around. Parsers are
/// `Send + Sync`; `parse` takes `&self` and returns a fresh dataset each call.
pub trait AnnotationParser: fmt::Debug + Send + Sync {
    /// The format this parser decodes.
    fn format(&self) -> Format;

    /// The shared options this parser was constructed with.
    fn options(&self) -> ParserOptions;

    /// Reads the configured annotation source into a normalized dataset.
    fn parse(&self) -> Result<Dataset, DetparseError>;
}

/// Reads every row of a CSV file into typed records.
///
/// A missing file is a layout error (it names the conventional file the
/// caller is expected to have); a row that fails to decode is a CSV error
/// carrying the path.
pub(crate) fn csv_rows<T: DeserializeOwned>(
    path: &Path,
    has_headers: bool,
) -> Result<Vec<T>, DetparseError> {
    if !path.is_file() {
        return Err(DetparseError::LayoutInvalid {
            path: path.to_path_buf(),
            message: "annotation CSV not found".to_string(),
        });
    }

    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .from_reader(BufReader::new(file));

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        rows.push(result.map_err(|source| DetparseError::CsvParse {
            path: path.to_path_buf(),
            source,
        })?);
    }
    Ok(rows)
}
