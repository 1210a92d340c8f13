//! AIR tabular CSV parser.
//!
//! The AIR airplane detection dataset ships one CSV per split with columns
//! `filename,width,height,class,xmin,ymin,xmax,ymax`, where the box
//! coordinates are normalized (0.0 to 1.0) and scale by the row's own
//! `width`/`height`. In practice every row's class is `airplane`, but the
//! decoder handles any class set.
//!
//! # ID assignment (for determinism)
//!
//! - Images: lexicographic filename order (1, 2, 3, ...)
//! - Categories: lexicographic class-name order
//! - Annotations: file row order
//!
//! The same filename appearing with different dimensions is a data error.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::DetparseError;
use crate::factory::{decode_config, ConfigBag};
use crate::format::Format;
use crate::model::{
    Annotation, AnnotationId, BBox, Category, CategoryId, Dataset, DatasetInfo, Image, ImageId,
    Norm,
};
use crate::parser::{csv_rows, AnnotationParser, ParserOptions};

/// Configuration for [`AirParser`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AirConfig {
    /// Dataset root directory.
    pub root: PathBuf,

    /// Split name used to derive the CSV filename.
    pub split: String,

    /// Explicit annotation file, overriding the derived `{root}/{split}.csv`.
    pub ann_file: Option<PathBuf>,

    pub has_labels: bool,
    pub min_image_size: u32,
    pub skip_empty_images: bool,
}

impl Default for AirConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            split: "train".to_string(),
            ann_file: None,
            has_labels: true,
            min_image_size: 0,
            skip_empty_images: false,
        }
    }
}

impl AirConfig {
    pub fn options(&self) -> ParserOptions {
        ParserOptions {
            has_labels: self.has_labels,
            min_image_size: self.min_image_size,
            skip_empty_images: self.skip_empty_images,
        }
    }
}

/// Parser for AIR split CSVs.
#[derive(Debug)]
pub struct AirParser {
    config: AirConfig,
}

impl AirParser {
    /// Builds the parser from a raw option bag.
    pub fn from_config(bag: ConfigBag) -> Result<Self, DetparseError> {
        Self::new(decode_config(Format::Air, bag)?)
    }

    /// Builds the parser from an already-typed config.
    pub fn new(config: AirConfig) -> Result<Self, DetparseError> {
        if config.split.is_empty() {
            return Err(DetparseError::InvalidConfig {
                format: Format::Air,
                message: "split must not be empty".to_string(),
            });
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &AirConfig {
        &self.config
    }

    /// The annotation file this parser will read.
    pub fn annotation_path(&self) -> PathBuf {
        match &self.config.ann_file {
            Some(path) => path.clone(),
            None => self.config.root.join(format!("{}.csv", self.config.split)),
        }
    }
}

impl AnnotationParser for AirParser {
    fn format(&self) -> Format {
        Format::Air
    }

    fn options(&self) -> ParserOptions {
        self.config.options()
    }

    fn parse(&self) -> Result<Dataset, DetparseError> {
        let path = self.annotation_path();
        let rows: Vec<AirRow> = csv_rows(&path, true)?;

        let mut dataset = decode(rows, &path, self.config.has_labels)?;
        self.config.options().apply(&mut dataset);
        Ok(dataset)
    }
}

// ============================================================================
// CSV decoding
// ============================================================================

#[derive(Debug, Deserialize)]
struct AirRow {
    filename: String,
    width: u32,
    height: u32,
    #[serde(rename = "class")]
    class_name: String,
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
}

fn decode(rows: Vec<AirRow>, path: &Path, has_labels: bool) -> Result<Dataset, DetparseError> {
    let mut dims: BTreeMap<String, (u32, u32)> = BTreeMap::new();
    let mut class_names: BTreeSet<String> = BTreeSet::new();

    for row in &rows {
        match dims.get(&row.filename) {
            Some(&(width, height)) if width != row.width || height != row.height => {
                return Err(DetparseError::InvalidData {
                    path: path.to_path_buf(),
                    message: format!(
                        "inconsistent dimensions for '{}': ({}, {}) vs ({}, {})",
                        row.filename, width, height, row.width, row.height
                    ),
                });
            }
            Some(_) => {}
            None => {
                dims.insert(row.filename.clone(), (row.width, row.height));
            }
        }
        class_names.insert(row.class_name.clone());
    }

    let mut images = Vec::with_capacity(dims.len());
    let mut image_id_by_name: BTreeMap<String, ImageId> = BTreeMap::new();
    for (index, (filename, &(width, height))) in dims.iter().enumerate() {
        let id = ImageId::new((index + 1) as u64);
        images.push(Image::new(id, filename.clone(), width, height));
        image_id_by_name.insert(filename.clone(), id);
    }

    if !has_labels {
        return Ok(Dataset {
            info: DatasetInfo::default(),
            images,
            categories: vec![],
            annotations: vec![],
        });
    }

    let mut categories = Vec::with_capacity(class_names.len());
    let mut category_id_by_name: BTreeMap<String, CategoryId> = BTreeMap::new();
    for (index, name) in class_names.into_iter().enumerate() {
        let id = CategoryId::new((index + 1) as u64);
        categories.push(Category::new(id, name.clone()));
        category_id_by_name.insert(name, id);
    }

    let annotations: Vec<Annotation> = rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let bbox = BBox::<Norm>::from_xyxy(row.xmin, row.ymin, row.xmax, row.ymax)
                .to_pixel(row.width as f64, row.height as f64);
            Annotation::new(
                AnnotationId::new((index + 1) as u64),
                image_id_by_name[&row.filename],
                category_id_by_name[&row.class_name],
                bbox,
            )
        })
        .collect();

    Ok(Dataset {
        info: DatasetInfo::default(),
        images,
        categories,
        annotations,
    })
}

/// Decodes AIR CSV from a UTF-8 string without touching the filesystem.
///
/// Labels are always decoded; useful for tests.
pub fn from_air_csv_str(csv_str: &str) -> Result<Dataset, DetparseError> {
    from_air_csv_slice(csv_str.as_bytes())
}

/// Decodes AIR CSV from bytes.
///
/// Useful for fuzzing raw input without requiring UTF-8 upfront.
pub fn from_air_csv_slice(bytes: &[u8]) -> Result<Dataset, DetparseError> {
    let path = Path::new("<memory>");
    let mut reader = csv::Reader::from_reader(bytes);

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: AirRow = result.map_err(|source| DetparseError::CsvParse {
            path: path.to_path_buf(),
            source,
        })?;
        rows.push(row);
    }

    decode(rows, path, true)
}
