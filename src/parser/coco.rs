//! COCO instances JSON parser.
//!
//! Reads the standard `instances_{split}.json` layout where boxes are stored
//! as `[x, y, width, height]` with `(x, y)` the top-left corner in pixel
//! coordinates. Decoding converts to the canonical XYXY model. IDs are taken
//! from the file as-is since COCO already assigns them.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::DetparseError;
use crate::factory::{decode_config, ConfigBag};
use crate::format::Format;
use crate::model::{Annotation, BBox, Category, Dataset, DatasetInfo, Image, Pixel};
use crate::parser::{AnnotationParser, ParserOptions};

/// Configuration for [`CocoParser`].
///
/// An empty bag is valid: every field has a default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CocoConfig {
    /// Dataset root directory.
    pub root: PathBuf,

    /// Split name used to derive the annotation filename.
    pub split: String,

    /// Explicit annotation file, overriding the derived
    /// `{root}/annotations/instances_{split}.json`.
    pub ann_file: Option<PathBuf>,

    pub has_labels: bool,
    pub min_image_size: u32,
    pub skip_empty_images: bool,
}

impl Default for CocoConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            split: "train2017".to_string(),
            ann_file: None,
            has_labels: true,
            min_image_size: 0,
            skip_empty_images: false,
        }
    }
}

impl CocoConfig {
    pub fn options(&self) -> ParserOptions {
        ParserOptions {
            has_labels: self.has_labels,
            min_image_size: self.min_image_size,
            skip_empty_images: self.skip_empty_images,
        }
    }
}

/// Parser for COCO instances JSON.
#[derive(Debug)]
pub struct CocoParser {
    config: CocoConfig,
}

impl CocoParser {
    /// Builds the parser from a raw option bag.
    pub fn from_config(bag: ConfigBag) -> Result<Self, DetparseError> {
        Self::new(decode_config(Format::Coco, bag)?)
    }

    /// Builds the parser from an already-typed config.
    pub fn new(config: CocoConfig) -> Result<Self, DetparseError> {
        if config.split.is_empty() {
            return Err(DetparseError::InvalidConfig {
                format: Format::Coco,
                message: "split must not be empty".to_string(),
            });
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &CocoConfig {
        &self.config
    }

    /// The annotation file this parser will read.
    pub fn annotation_path(&self) -> PathBuf {
        match &self.config.ann_file {
            Some(path) => path.clone(),
            None => self
                .config
                .root
                .join("annotations")
                .join(format!("instances_{}.json", self.config.split)),
        }
    }
}

impl AnnotationParser for CocoParser {
    fn format(&self) -> Format {
        Format::Coco
    }

    fn options(&self) -> ParserOptions {
        self.config.options()
    }

    fn parse(&self) -> Result<Dataset, DetparseError> {
        let path = self.annotation_path();
        let file = File::open(&path)?;
        let reader = BufReader::new(file);

        let raw: CocoFile =
            serde_json::from_reader(reader).map_err(|source| DetparseError::CocoJsonParse {
                path: path.clone(),
                source,
            })?;

        let mut dataset = decode(raw, self.config.has_labels);
        self.config.options().apply(&mut dataset);
        Ok(dataset)
    }
}

// ============================================================================
// COCO schema types (internal to this module)
// ============================================================================

#[derive(Debug, Deserialize)]
struct CocoFile {
    #[serde(default)]
    info: Option<CocoInfo>,

    images: Vec<CocoImage>,

    // Absent in unlabeled exports; tolerated when has_labels is false.
    #[serde(default)]
    annotations: Vec<CocoAnnotation>,

    #[serde(default)]
    categories: Vec<CocoCategory>,
}

#[derive(Debug, Default, Deserialize)]
struct CocoInfo {
    #[serde(default)]
    year: Option<u32>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    contributor: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CocoImage {
    id: u64,
    width: u32,
    height: u32,
    file_name: String,
}

#[derive(Debug, Deserialize)]
struct CocoCategory {
    id: u64,
    name: String,
    #[serde(default)]
    supercategory: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CocoAnnotation {
    id: u64,
    image_id: u64,
    category_id: u64,

    /// COCO layout: [x, y, width, height] with (x, y) as the top-left corner.
    bbox: [f64; 4],

    #[serde(default)]
    iscrowd: Option<u8>,
}

// ============================================================================
// Decoding
// ============================================================================

fn decode(raw: CocoFile, has_labels: bool) -> Dataset {
    let info = match raw.info {
        Some(coco_info) => DatasetInfo {
            name: None,
            version: coco_info.version,
            description: coco_info.description,
            url: coco_info.url,
            year: coco_info.year,
            contributor: coco_info.contributor,
        },
        None => DatasetInfo::default(),
    };

    let images: Vec<Image> = raw
        .images
        .into_iter()
        .map(|image| Image::new(image.id, image.file_name, image.width, image.height))
        .collect();

    if !has_labels {
        return Dataset {
            info,
            images,
            categories: vec![],
            annotations: vec![],
        };
    }

    let categories: Vec<Category> = raw
        .categories
        .into_iter()
        .map(|category| match category.supercategory {
            Some(supercategory) => {
                Category::with_supercategory(category.id, category.name, supercategory)
            }
            None => Category::new(category.id, category.name),
        })
        .collect();

    let annotations: Vec<Annotation> = raw
        .annotations
        .into_iter()
        .map(|ann| {
            let [x, y, width, height] = ann.bbox;
            let mut annotation = Annotation::new(
                ann.id,
                ann.image_id,
                ann.category_id,
                BBox::<Pixel>::from_xywh(x, y, width, height),
            );
            if ann.iscrowd == Some(1) {
                annotation = annotation.with_attribute("iscrowd", "1");
            }
            annotation
        })
        .collect();

    Dataset {
        info,
        images,
        categories,
        annotations,
    }
}

/// Decodes COCO JSON from a UTF-8 string without touching the filesystem.
///
/// Labels are always decoded; useful for tests.
pub fn from_coco_json_str(json: &str) -> Result<Dataset, serde_json::Error> {
    from_coco_json_slice(json.as_bytes())
}

/// Decodes COCO JSON from bytes.
///
/// Useful for fuzzing raw input without UTF-8 validation upfront.
pub fn from_coco_json_slice(bytes: &[u8]) -> Result<Dataset, serde_json::Error> {
    let raw: CocoFile = serde_json::from_slice(bytes)?;
    Ok(decode(raw, true))
}
