//! Open Images CSV parser.
//!
//! Open Images ships annotations as a CSV triple per split:
//!
//! - `class-descriptions-boxable.csv`: headerless `MID,DisplayName` rows
//!   defining the label taxonomy (MIDs look like `/m/0pcr`).
//! - `{split}-image-sizes.csv`: `ImageID,Width,Height` rows. Box coordinates
//!   in the box file are normalized, and this file supplies the pixel sizes
//!   to scale them by, so no image file is ever opened.
//! - `{split}-annotations-bbox.csv`: one box per row with normalized
//!   `XMin,XMax,YMin,YMax` plus the `IsOccluded`/`IsTruncated`/`IsGroupOf`
//!   flags.
//!
//! Category IDs follow description-file order, image IDs lexicographic
//! `ImageID` order, annotation IDs box-file row order. A box row whose
//! `ImageID` has no size entry is skipped with a warning (the official size
//! files lag the box files for some splits); an unknown `LabelName` is a data
//! error.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::DetparseError;
use crate::factory::{decode_config, ConfigBag};
use crate::format::Format;
use crate::model::{
    Annotation, AnnotationId, BBox, Category, CategoryId, Dataset, DatasetInfo, Image, ImageId,
    Norm,
};
use crate::parser::{csv_rows, AnnotationParser, ParserOptions};

/// Configuration for [`OpenImagesParser`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpenImagesConfig {
    /// Dataset root directory.
    pub root: PathBuf,

    /// Split name used to derive the per-split CSV filenames.
    pub split: String,

    /// Explicit class-descriptions file, overriding
    /// `{root}/annotations/class-descriptions-boxable.csv`.
    pub categories_file: Option<PathBuf>,

    /// Explicit image-sizes file, overriding
    /// `{root}/annotations/{split}-image-sizes.csv`.
    pub image_sizes_file: Option<PathBuf>,

    /// Explicit box-annotations file, overriding
    /// `{root}/annotations/{split}-annotations-bbox.csv`.
    pub bbox_file: Option<PathBuf>,

    pub has_labels: bool,
    pub min_image_size: u32,
    pub skip_empty_images: bool,
}

impl Default for OpenImagesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            split: "train".to_string(),
            categories_file: None,
            image_sizes_file: None,
            bbox_file: None,
            has_labels: true,
            min_image_size: 0,
            skip_empty_images: false,
        }
    }
}

impl OpenImagesConfig {
    pub fn options(&self) -> ParserOptions {
        ParserOptions {
            has_labels: self.has_labels,
            min_image_size: self.min_image_size,
            skip_empty_images: self.skip_empty_images,
        }
    }
}

/// Parser for Open Images CSV annotation triples.
#[derive(Debug)]
pub struct OpenImagesParser {
    config: OpenImagesConfig,
}

impl OpenImagesParser {
    /// Builds the parser from a raw option bag.
    pub fn from_config(bag: ConfigBag) -> Result<Self, DetparseError> {
        Self::new(decode_config(Format::OpenImages, bag)?)
    }

    /// Builds the parser from an already-typed config.
    pub fn new(config: OpenImagesConfig) -> Result<Self, DetparseError> {
        if config.split.is_empty() {
            return Err(DetparseError::InvalidConfig {
                format: Format::OpenImages,
                message: "split must not be empty".to_string(),
            });
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &OpenImagesConfig {
        &self.config
    }

    pub fn categories_path(&self) -> PathBuf {
        match &self.config.categories_file {
            Some(path) => path.clone(),
            None => self
                .config
                .root
                .join("annotations")
                .join("class-descriptions-boxable.csv"),
        }
    }

    pub fn image_sizes_path(&self) -> PathBuf {
        match &self.config.image_sizes_file {
            Some(path) => path.clone(),
            None => self
                .config
                .root
                .join("annotations")
                .join(format!("{}-image-sizes.csv", self.config.split)),
        }
    }

    pub fn bbox_path(&self) -> PathBuf {
        match &self.config.bbox_file {
            Some(path) => path.clone(),
            None => self
                .config
                .root
                .join("annotations")
                .join(format!("{}-annotations-bbox.csv", self.config.split)),
        }
    }
}

impl AnnotationParser for OpenImagesParser {
    fn format(&self) -> Format {
        Format::OpenImages
    }

    fn options(&self) -> ParserOptions {
        self.config.options()
    }

    fn parse(&self) -> Result<Dataset, DetparseError> {
        let sizes_path = self.image_sizes_path();
        let size_rows: Vec<SizeRow> = csv_rows(&sizes_path, true)?;

        let mut dims: BTreeMap<String, (u32, u32)> = BTreeMap::new();
        for row in size_rows {
            if let Some(&(width, height)) = dims.get(&row.image_id) {
                if width != row.width || height != row.height {
                    return Err(DetparseError::InvalidData {
                        path: sizes_path.clone(),
                        message: format!(
                            "inconsistent dimensions for '{}': ({}, {}) vs ({}, {})",
                            row.image_id, width, height, row.width, row.height
                        ),
                    });
                }
            } else {
                dims.insert(row.image_id, (row.width, row.height));
            }
        }

        let mut images = Vec::with_capacity(dims.len());
        let mut image_lookup: BTreeMap<String, (ImageId, u32, u32)> = BTreeMap::new();
        for (index, (key, &(width, height))) in dims.iter().enumerate() {
            let id = ImageId::new((index + 1) as u64);
            images.push(Image::new(id, format!("{key}.jpg"), width, height));
            image_lookup.insert(key.clone(), (id, width, height));
        }

        if !self.config.has_labels {
            let mut dataset = Dataset {
                info: DatasetInfo::default(),
                images,
                categories: vec![],
                annotations: vec![],
            };
            self.config.options().apply(&mut dataset);
            return Ok(dataset);
        }

        let categories_path = self.categories_path();
        let description_rows: Vec<(String, String)> = csv_rows(&categories_path, false)?;

        let mut categories = Vec::with_capacity(description_rows.len());
        let mut category_id_by_mid: BTreeMap<String, CategoryId> = BTreeMap::new();
        for (index, (mid, display_name)) in description_rows.into_iter().enumerate() {
            let id = CategoryId::new((index + 1) as u64);
            if category_id_by_mid.insert(mid.clone(), id).is_some() {
                return Err(DetparseError::InvalidData {
                    path: categories_path.clone(),
                    message: format!("duplicate label '{mid}' in class descriptions"),
                });
            }
            categories.push(Category::new(id, display_name));
        }

        let bbox_path = self.bbox_path();
        let box_rows: Vec<BoxRow> = csv_rows(&bbox_path, true)?;

        let mut annotations = Vec::with_capacity(box_rows.len());
        let mut skipped_unknown_image = 0usize;
        for row in box_rows {
            let Some(&(image_id, width, height)) = image_lookup.get(&row.image_id) else {
                skipped_unknown_image += 1;
                continue;
            };

            let category_id = category_id_by_mid
                .get(&row.label_name)
                .copied()
                .ok_or_else(|| DetparseError::InvalidData {
                    path: bbox_path.clone(),
                    message: format!(
                        "unknown label '{}' (not in class descriptions)",
                        row.label_name
                    ),
                })?;

            let bbox = BBox::<Norm>::from_xyxy(row.xmin, row.ymin, row.xmax, row.ymax)
                .to_pixel(width as f64, height as f64);

            let mut annotation = Annotation::new(
                AnnotationId::new((annotations.len() + 1) as u64),
                image_id,
                category_id,
                bbox,
            );
            for (flag, key) in [
                (&row.is_occluded, "occluded"),
                (&row.is_truncated, "truncated"),
                (&row.is_group_of, "group_of"),
            ] {
                if flag == "1" {
                    annotation = annotation.with_attribute(key, "1");
                }
            }
            annotations.push(annotation);
        }

        if skipped_unknown_image > 0 {
            eprintln!(
                "Warning: skipped {skipped_unknown_image} box row(s) whose ImageID has no size entry in {}",
                sizes_path.display()
            );
        }

        let mut dataset = Dataset {
            info: DatasetInfo::default(),
            images,
            categories,
            annotations,
        };
        self.config.options().apply(&mut dataset);
        Ok(dataset)
    }
}

// ============================================================================
// CSV row types (internal to this module)
// ============================================================================

#[derive(Debug, Deserialize)]
struct SizeRow {
    #[serde(rename = "ImageID")]
    image_id: String,
    #[serde(rename = "Width")]
    width: u32,
    #[serde(rename = "Height")]
    height: u32,
}

/// One row of `{split}-annotations-bbox.csv`.
///
/// The official files carry more columns (`Source`, `Confidence`,
/// `IsDepiction`, `IsInside`); anything not named here is ignored. The flag
/// columns default to empty so trimmed-down files still decode.
#[derive(Debug, Deserialize)]
struct BoxRow {
    #[serde(rename = "ImageID")]
    image_id: String,
    #[serde(rename = "LabelName")]
    label_name: String,
    #[serde(rename = "XMin")]
    xmin: f64,
    #[serde(rename = "XMax")]
    xmax: f64,
    #[serde(rename = "YMin")]
    ymin: f64,
    #[serde(rename = "YMax")]
    ymax: f64,
    #[serde(rename = "IsOccluded", default)]
    is_occluded: String,
    #[serde(rename = "IsTruncated", default)]
    is_truncated: String,
    #[serde(rename = "IsGroupOf", default)]
    is_group_of: String,
}
