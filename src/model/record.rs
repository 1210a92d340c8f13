//! The normalized record types every parser produces.
//!
//! Each format-specific parser decodes its source into this one shape, so
//! downstream code handles a single representation regardless of where the
//! annotations came from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::bbox::{BBox, Pixel};
use super::ids::{AnnotationId, CategoryId, ImageId};

/// A complete object detection dataset in normalized form.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Dataset {
    /// Metadata about the dataset (name, version, year, and so on).
    #[serde(default)]
    pub info: DatasetInfo,

    /// All images in the dataset.
    pub images: Vec<Image>,

    /// All category definitions.
    pub categories: Vec<Category>,

    /// All annotations (bounding boxes with labels).
    pub annotations: Vec<Annotation>,
}

impl Dataset {
    /// Groups annotations by owning image, preserving annotation order within
    /// each group.
    ///
    /// Images without annotations are absent from the map.
    pub fn annotations_by_image(&self) -> BTreeMap<ImageId, Vec<&Annotation>> {
        let mut grouped: BTreeMap<ImageId, Vec<&Annotation>> = BTreeMap::new();
        for annotation in &self.annotations {
            grouped.entry(annotation.image_id).or_default().push(annotation);
        }
        grouped
    }
}

/// Metadata about a dataset.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DatasetInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor: Option<String>,
}

/// An image in the dataset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Image {
    /// Unique identifier for this image.
    pub id: ImageId,

    /// Filename or relative path of the image.
    pub file_name: String,

    /// Width of the image in pixels.
    pub width: u32,

    /// Height of the image in pixels.
    pub height: u32,
}

impl Image {
    pub fn new(
        id: impl Into<ImageId>,
        file_name: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
        }
    }
}

/// A category (class label) in the dataset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier for this category.
    pub id: CategoryId,

    /// Name of the category (e.g. "person", "car", "aeroplane").
    pub name: String,

    /// Optional supercategory for hierarchical taxonomies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supercategory: Option<String>,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            supercategory: None,
        }
    }

    pub fn with_supercategory(
        id: impl Into<CategoryId>,
        name: impl Into<String>,
        supercategory: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            supercategory: Some(supercategory.into()),
        }
    }
}

/// A single labeled bounding box.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique identifier for this annotation.
    pub id: AnnotationId,

    /// ID of the image this annotation belongs to.
    pub image_id: ImageId,

    /// ID of the category (class) for this annotation.
    pub category_id: CategoryId,

    /// Bounding box in pixel coordinates, XYXY order.
    pub bbox: BBox<Pixel>,

    /// Source-specific flags (e.g. "difficult", "iscrowd", "IsGroupOf").
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Annotation {
    pub fn new(
        id: impl Into<AnnotationId>,
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
        bbox: BBox<Pixel>,
    ) -> Self {
        Self {
            id: id.into(),
            image_id: image_id.into(),
            category_id: category_id.into(),
            bbox,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}
