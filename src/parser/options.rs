//! Options honored by every parser variant.

use std::collections::BTreeSet;

use crate::model::{Dataset, ImageId};

/// The cross-format option subset.
///
/// Every variant config declares these three fields at the top level of its
/// bag, so `{"has_labels": false}` means the same thing regardless of format.
/// `has_labels` changes what a variant decodes; the other two run as a shared
/// post-parse filter via [`ParserOptions::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// When false, only image metadata is decoded. No categories or
    /// annotations appear in the output.
    pub has_labels: bool,

    /// Images whose shorter side is below this many pixels are dropped after
    /// decoding, along with their annotations. Zero disables the filter.
    pub min_image_size: u32,

    /// Drop images that end up with no annotations.
    pub skip_empty_images: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            has_labels: true,
            min_image_size: 0,
            skip_empty_images: false,
        }
    }
}

impl ParserOptions {
    /// Runs the post-parse filters on a freshly decoded dataset.
    ///
    /// The category taxonomy is never filtered, only images and annotations.
    pub fn apply(&self, dataset: &mut Dataset) {
        if self.min_image_size > 0 {
            let keep: BTreeSet<ImageId> = dataset
                .images
                .iter()
                .filter(|image| image.width.min(image.height) >= self.min_image_size)
                .map(|image| image.id)
                .collect();
            dataset.images.retain(|image| keep.contains(&image.id));
            dataset
                .annotations
                .retain(|annotation| keep.contains(&annotation.image_id));
        }

        if self.skip_empty_images {
            let populated: BTreeSet<ImageId> = dataset
                .annotations
                .iter()
                .map(|annotation| annotation.image_id)
                .collect();
            dataset.images.retain(|image| populated.contains(&image.id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Annotation, BBox, Category, Image};

    fn sample_dataset() -> Dataset {
        Dataset {
            images: vec![
                Image::new(1u64, "small.jpg", 100, 50),
                Image::new(2u64, "wide.jpg", 800, 600),
                Image::new(3u64, "empty.jpg", 640, 480),
            ],
            categories: vec![Category::new(1u64, "person")],
            annotations: vec![
                Annotation::new(1u64, 1u64, 1u64, BBox::from_xyxy(0.0, 0.0, 10.0, 10.0)),
                Annotation::new(2u64, 2u64, 1u64, BBox::from_xyxy(0.0, 0.0, 20.0, 20.0)),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn defaults_are_pass_through() {
        let mut dataset = sample_dataset();
        ParserOptions::default().apply(&mut dataset);
        assert_eq!(dataset.images.len(), 3);
        assert_eq!(dataset.annotations.len(), 2);
    }

    #[test]
    fn min_image_size_drops_image_and_its_annotations() {
        let mut dataset = sample_dataset();
        let options = ParserOptions {
            min_image_size: 100,
            ..Default::default()
        };
        options.apply(&mut dataset);

        // small.jpg has a 50px short side and goes, taking annotation 1 along.
        assert_eq!(dataset.images.len(), 2);
        assert_eq!(dataset.annotations.len(), 1);
        assert_eq!(dataset.annotations[0].id.as_u64(), 2);
    }

    #[test]
    fn skip_empty_images_drops_unannotated_images() {
        let mut dataset = sample_dataset();
        let options = ParserOptions {
            skip_empty_images: true,
            ..Default::default()
        };
        options.apply(&mut dataset);

        assert_eq!(dataset.images.len(), 2);
        assert!(dataset.images.iter().all(|img| img.file_name != "empty.jpg"));
    }

    #[test]
    fn filters_compose_and_keep_categories() {
        let mut dataset = sample_dataset();
        let options = ParserOptions {
            min_image_size: 100,
            skip_empty_images: true,
            ..Default::default()
        };
        options.apply(&mut dataset);

        assert_eq!(dataset.images.len(), 1);
        assert_eq!(dataset.images[0].file_name, "wide.jpg");
        assert_eq!(dataset.categories.len(), 1);
    }
}
