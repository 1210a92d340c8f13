//! Construction-time selection of annotation parsers.
//!
//! The factory is the one place a format token turns into a live parser.
//! Resolution reads only the const token table in [`crate::format`], and the
//! caller's option bag is handed to the selected variant whole: the factory
//! never inspects, renames, or defaults any option. All option checking
//! happens inside the variant's own config deserialization and validation.
//!
//! Construction performs no I/O and keeps no state, so it is safe to call
//! from any number of threads, and every call returns a fresh instance.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DetparseError;
use crate::format::Format;
use crate::parser::air::AirParser;
use crate::parser::coco::CocoParser;
use crate::parser::open_images::OpenImagesParser;
use crate::parser::voc::VocParser;
use crate::parser::AnnotationParser;

/// The caller-supplied option map, forwarded verbatim to the selected
/// variant.
///
/// Keys and value types are defined by each variant's config struct; the
/// factory treats the bag as opaque.
pub type ConfigBag = serde_json::Map<String, Value>;

/// Resolves `token` against the supported set and constructs the matching
/// parser with `config`.
///
/// # Errors
///
/// [`DetparseError::UnsupportedFormat`] when the token is not in the
/// supported set (nothing is constructed in that case), or the selected
/// variant's construction error when the config is rejected.
///
/// # Example
///
/// ```
/// use detparse::create_parser;
/// use serde_json::json;
///
/// let bag = json!({"root": "/data/coco"}).as_object().cloned().unwrap();
/// let parser = create_parser("coco", bag)?;
/// assert_eq!(parser.format().token(), "coco");
/// # Ok::<(), detparse::DetparseError>(())
/// ```
pub fn create_parser(
    token: &str,
    config: ConfigBag,
) -> Result<Box<dyn AnnotationParser>, DetparseError> {
    let format = token.parse::<Format>()?;
    build_parser(format, config)
}

/// Constructs the parser for an already-resolved format.
///
/// The match is exhaustive on purpose: a new `Format` variant refuses to
/// compile until it gets a constructor arm here.
pub fn build_parser(
    format: Format,
    config: ConfigBag,
) -> Result<Box<dyn AnnotationParser>, DetparseError> {
    match format {
        Format::Coco => Ok(Box::new(CocoParser::from_config(config)?)),
        Format::Voc => Ok(Box::new(VocParser::from_config(config)?)),
        Format::OpenImages => Ok(Box::new(OpenImagesParser::from_config(config)?)),
        Format::Air => Ok(Box::new(AirParser::from_config(config)?)),
    }
}

/// Deserializes a whole bag into a variant's config struct.
///
/// Called by every variant's `from_config`. Unknown option names and
/// mismatched value types surface as [`DetparseError::Config`] naming the
/// format.
pub(crate) fn decode_config<C: DeserializeOwned>(
    format: Format,
    bag: ConfigBag,
) -> Result<C, DetparseError> {
    serde_json::from_value(Value::Object(bag))
        .map_err(|source| DetparseError::Config { format, source })
}
