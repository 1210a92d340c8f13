//! The closed set of annotation formats detparse understands.
//!
//! Every format is a variant of [`Format`], and every variant has exactly one
//! string token used to select it from CLI arguments and library calls. The
//! token table is the single source of truth for resolution: adding a format
//! means adding a variant, a table row, and a `match` arm, and the compiler
//! flags every site that needs updating.

use std::fmt;
use std::str::FromStr;

use crate::error::DetparseError;

/// An annotation source format with a registered parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// COCO object detection JSON (`instances_*.json`).
    Coco,
    /// Pascal VOC XML annotations with image-set splits.
    Voc,
    /// Open Images V5+ CSV annotations.
    OpenImages,
    /// AIR airplane detection dataset (single-class CSV).
    Air,
}

/// Token table mapping selector strings to formats.
///
/// Lookup is exact and case-sensitive. Order here is the order formats are
/// listed in help output and error messages.
const TOKENS: [(&str, Format); 4] = [
    ("coco", Format::Coco),
    ("voc", Format::Voc),
    ("openimages", Format::OpenImages),
    ("air", Format::Air),
];

impl Format {
    /// All supported formats, in token-table order.
    pub const ALL: [Format; 4] = [Format::Coco, Format::Voc, Format::OpenImages, Format::Air];

    /// The canonical selector token for this format.
    pub fn token(&self) -> &'static str {
        match self {
            Format::Coco => "coco",
            Format::Voc => "voc",
            Format::OpenImages => "openimages",
            Format::Air => "air",
        }
    }

    /// One-line description shown by `detparse formats`.
    pub fn summary(&self) -> &'static str {
        match self {
            Format::Coco => "COCO instances JSON (images, annotations, categories)",
            Format::Voc => "Pascal VOC XML annotations plus ImageSets splits",
            Format::OpenImages => "Open Images CSV (boxes, image sizes, class descriptions)",
            Format::Air => "AIR single-class CSV (filename, size, box per row)",
        }
    }

    /// Resolve a selector token to a format.
    ///
    /// Returns `None` for anything not in the token table, including
    /// case variants like `"COCO"`.
    pub fn from_token(token: &str) -> Option<Format> {
        TOKENS
            .iter()
            .find(|(candidate, _)| *candidate == token)
            .map(|(_, format)| *format)
    }

    /// The supported tokens joined for error messages and help text.
    pub fn supported_tokens() -> String {
        let tokens: Vec<&str> = TOKENS.iter().map(|(token, _)| *token).collect();
        tokens.join(", ")
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Format {
    type Err = DetparseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::from_token(s).ok_or_else(|| DetparseError::UnsupportedFormat {
            token: s.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_table_and_all_agree() {
        assert_eq!(TOKENS.len(), Format::ALL.len());
        for (token, format) in TOKENS {
            assert_eq!(format.token(), token);
            assert!(Format::ALL.contains(&format));
        }
    }

    #[test]
    fn from_token_resolves_every_format() {
        assert_eq!(Format::from_token("coco"), Some(Format::Coco));
        assert_eq!(Format::from_token("voc"), Some(Format::Voc));
        assert_eq!(Format::from_token("openimages"), Some(Format::OpenImages));
        assert_eq!(Format::from_token("air"), Some(Format::Air));
    }

    #[test]
    fn from_token_is_case_sensitive() {
        assert_eq!(Format::from_token("COCO"), None);
        assert_eq!(Format::from_token("Voc"), None);
        assert_eq!(Format::from_token("OpenImages"), None);
    }

    #[test]
    fn from_token_rejects_unknown_and_empty() {
        assert_eq!(Format::from_token("kitti"), None);
        assert_eq!(Format::from_token(""), None);
        assert_eq!(Format::from_token("coco "), None);
    }

    #[test]
    fn from_str_error_carries_token() {
        let err = "kitti".parse::<Format>().unwrap_err();
        match err {
            DetparseError::UnsupportedFormat { token } => assert_eq!(token, "kitti"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn display_matches_token() {
        for format in Format::ALL {
            assert_eq!(format.to_string(), format.token());
        }
    }

    #[test]
    fn supported_tokens_lists_everything_in_order() {
        assert_eq!(Format::supported_tokens(), "coco, voc, openimages, air");
    }
}
