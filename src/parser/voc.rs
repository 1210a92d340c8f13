//! Pascal VOC XML parser.
//!
//! Reads the VOCdevkit layout: one XML document per image under
//! `Annotations/`, with the image set for a split listed in
//! `ImageSets/Main/{split}.txt`. When the split file is absent the parser
//! falls back to a flat scan of `Annotations/`. Coordinates are read raw,
//! without any origin adjustment.
//!
//! Unlike the other formats, VOC has a fixed class taxonomy. The parser
//! builds it at construction time (the 20 challenge classes unless the config
//! supplies its own list), so category IDs are known before any file is read
//! and an XML object naming an unlisted class is a data error.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Node;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::DetparseError;
use crate::factory::{decode_config, ConfigBag};
use crate::format::Format;
use crate::model::{
    Annotation, AnnotationId, BBox, Category, CategoryId, Dataset, DatasetInfo, Image, ImageId,
    Pixel,
};
use crate::parser::{AnnotationParser, ParserOptions};

/// The 20 object classes of the VOC2007-VOC2012 challenges, in canonical
/// order.
pub const VOC_CLASSES: [&str; 20] = [
    "aeroplane",
    "bicycle",
    "bird",
    "boat",
    "bottle",
    "bus",
    "car",
    "cat",
    "chair",
    "cow",
    "diningtable",
    "dog",
    "horse",
    "motorbike",
    "person",
    "pottedplant",
    "sheep",
    "sofa",
    "train",
    "tvmonitor",
];

/// Configuration for [`VocParser`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VocConfig {
    /// Dataset root. Either the directory containing `VOC{year}/` or that
    /// subtree itself.
    pub root: PathBuf,

    /// Challenge year selecting the `VOC{year}/` subtree.
    pub year: String,

    /// Split name resolved to `ImageSets/Main/{split}.txt`.
    pub split: String,

    /// Keep objects flagged `<difficult>1</difficult>`. When false they are
    /// dropped during decoding.
    pub keep_difficult: bool,

    /// Class taxonomy override. `None` means the 20 challenge classes.
    pub classes: Option<Vec<String>>,

    pub has_labels: bool,
    pub min_image_size: u32,
    pub skip_empty_images: bool,
}

impl Default for VocConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            year: "2012".to_string(),
            split: "train".to_string(),
            keep_difficult: true,
            classes: None,
            has_labels: true,
            min_image_size: 0,
            skip_empty_images: false,
        }
    }
}

impl VocConfig {
    pub fn options(&self) -> ParserOptions {
        ParserOptions {
            has_labels: self.has_labels,
            min_image_size: self.min_image_size,
            skip_empty_images: self.skip_empty_images,
        }
    }
}

/// Parser for Pascal VOC XML directories.
#[derive(Debug)]
pub struct VocParser {
    config: VocConfig,
    categories: Vec<Category>,
    category_id_by_name: BTreeMap<String, CategoryId>,
}

impl VocParser {
    /// Builds the parser from a raw option bag.
    pub fn from_config(bag: ConfigBag) -> Result<Self, DetparseError> {
        Self::new(decode_config(Format::Voc, bag)?)
    }

    /// Builds the parser from an already-typed config, validating the class
    /// list and fixing the category taxonomy (IDs 1..=N in list order).
    pub fn new(config: VocConfig) -> Result<Self, DetparseError> {
        let invalid = |message: String| DetparseError::InvalidConfig {
            format: Format::Voc,
            message,
        };

        if config.year.is_empty() {
            return Err(invalid("year must not be empty".to_string()));
        }
        if config.split.is_empty() {
            return Err(invalid("split must not be empty".to_string()));
        }

        let class_names: Vec<String> = match &config.classes {
            Some(classes) => classes.clone(),
            None => VOC_CLASSES.iter().map(|name| name.to_string()).collect(),
        };
        if class_names.is_empty() {
            return Err(invalid("classes must not be empty".to_string()));
        }

        let mut categories = Vec::with_capacity(class_names.len());
        let mut category_id_by_name = BTreeMap::new();
        for (index, name) in class_names.into_iter().enumerate() {
            if name.is_empty() {
                return Err(invalid("class names must not be empty".to_string()));
            }
            let id = CategoryId::new((index + 1) as u64);
            if category_id_by_name.insert(name.clone(), id).is_some() {
                return Err(invalid(format!("duplicate class '{name}' in classes")));
            }
            categories.push(Category::new(id, name));
        }

        Ok(Self {
            config,
            categories,
            category_id_by_name,
        })
    }

    pub fn config(&self) -> &VocConfig {
        &self.config
    }

    /// The fixed category taxonomy this parser decodes against.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// The `VOC{year}/` subtree when it exists under `root`, otherwise `root`
    /// itself (the caller already pointed at the subtree).
    pub fn devkit_root(&self) -> PathBuf {
        let candidate = self.config.root.join(format!("VOC{}", self.config.year));
        if candidate.is_dir() {
            candidate
        } else {
            self.config.root.clone()
        }
    }
}

impl AnnotationParser for VocParser {
    fn format(&self) -> Format {
        Format::Voc
    }

    fn options(&self) -> ParserOptions {
        self.config.options()
    }

    fn parse(&self) -> Result<Dataset, DetparseError> {
        let devkit = self.devkit_root();
        let annotations_dir = devkit.join("Annotations");
        if !annotations_dir.is_dir() {
            return Err(DetparseError::LayoutInvalid {
                path: devkit,
                message: "expected an Annotations/ directory under the dataset root".to_string(),
            });
        }

        let split_path = devkit
            .join("ImageSets")
            .join("Main")
            .join(format!("{}.txt", self.config.split));
        let stems = if split_path.is_file() {
            read_split_stems(&split_path)?
        } else {
            scan_annotation_stems(&annotations_dir)?
        };

        let mut images = Vec::with_capacity(stems.len());
        let mut annotations = Vec::new();
        let mut next_annotation_id: u64 = 1;

        for (index, stem) in stems.iter().enumerate() {
            let xml_path = annotations_dir.join(format!("{stem}.xml"));
            let xml = fs::read_to_string(&xml_path)?;
            let document = parse_voc_document(&xml, &xml_path)?;

            let image_id = ImageId::new((index + 1) as u64);
            images.push(Image::new(
                image_id,
                document.filename,
                document.width,
                document.height,
            ));

            if !self.config.has_labels {
                continue;
            }

            for object in document.objects {
                let difficult = object.attrs.get("difficult").is_some_and(|v| v == "1");
                if difficult && !self.config.keep_difficult {
                    continue;
                }

                let category_id = self
                    .category_id_by_name
                    .get(&object.name)
                    .copied()
                    .ok_or_else(|| DetparseError::InvalidData {
                        path: xml_path.clone(),
                        message: format!(
                            "unknown class '{}' (not in the configured class list)",
                            object.name
                        ),
                    })?;

                let mut annotation = Annotation::new(
                    AnnotationId::new(next_annotation_id),
                    image_id,
                    category_id,
                    object.bbox,
                );
                annotation.attributes = object.attrs;
                annotations.push(annotation);
                next_annotation_id += 1;
            }
        }

        let categories = if self.config.has_labels {
            self.categories.clone()
        } else {
            vec![]
        };

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
// Image set and directory discovery
// ============================================================================

/// Reads image stems from an `ImageSets/Main/{split}.txt` file.
///
/// Only the first whitespace-separated token per line is taken, so the
/// two-column per-class variants of these files also work. Stems are sorted
/// and deduplicated for deterministic image IDs.
fn read_split_stems(path: &Path) -> Result<Vec<String>, DetparseError> {
    let contents = fs::read_to_string(path)?;
    let mut stems: Vec<String> = contents
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(ToOwned::to_owned)
        .collect();
    stems.sort();
    stems.dedup();
    Ok(stems)
}

/// Collects annotation stems from a flat scan of `Annotations/`.
fn scan_annotation_stems(dir: &Path) -> Result<Vec<String>, DetparseError> {
    let mut stems = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_xml_extension(&path) {
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                stems.push(stem.to_string());
            }
        }
    }
    stems.sort();
    stems.dedup();

    // The scan is flat on purpose. Nested XML usually means the caller
    // pointed at the wrong directory, so report it instead of silently
    // reading extra files.
    let mut nested = 0usize;
    let mut sample = None;
    for entry in WalkDir::new(dir).follow_links(true).min_depth(2) {
        let entry = entry.map_err(|source| DetparseError::LayoutInvalid {
            path: dir.to_path_buf(),
            message: format!("failed while traversing annotations directory: {source}"),
        })?;
        if entry.file_type().is_file() && has_xml_extension(entry.path()) {
            if sample.is_none() {
                sample = Some(entry.path().to_path_buf());
            }
            nested += 1;
        }
    }
    if let Some(sample) = sample {
        eprintln!(
            "Warning: annotation scan is flat (non-recursive); skipping {} nested .xml file(s), e.g. {}",
            nested,
            sample.display()
        );
    }

    Ok(stems)
}

fn has_xml_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

// ============================================================================
// XML decoding
// ============================================================================

#[derive(Debug)]
struct VocDocument {
    filename: String,
    width: u32,
    height: u32,
    objects: Vec<VocObject>,
}

#[derive(Debug)]
struct VocObject {
    name: String,
    bbox: BBox<Pixel>,
    attrs: BTreeMap<String, String>,
}

/// Error-reporting context for one XML document.
struct Xml<'p> {
    path: &'p Path,
}

impl Xml<'_> {
    fn err(&self, message: String) -> DetparseError {
        DetparseError::VocXmlParse {
            path: self.path.to_path_buf(),
            message,
        }
    }

    fn child<'a, 'input>(&self, node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
        node.children()
            .find(|child| child.is_element() && child.tag_name().name() == tag)
    }

    fn text(&self, node: Node<'_, '_>, tag: &str) -> Option<String> {
        self.child(node, tag)
            .and_then(|child| child.text())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(ToOwned::to_owned)
    }

    fn required_text(
        &self,
        node: Node<'_, '_>,
        tag: &str,
        context: &str,
    ) -> Result<String, DetparseError> {
        self.text(node, tag)
            .ok_or_else(|| self.err(format!("missing <{tag}> in {context}")))
    }

    fn number<T: std::str::FromStr>(
        &self,
        node: Node<'_, '_>,
        tag: &str,
        context: &str,
    ) -> Result<T, DetparseError> {
        let raw = self.required_text(node, tag, context)?;
        raw.parse::<T>()
            .map_err(|_| self.err(format!("invalid <{tag}> value '{raw}' in {context}")))
    }
}

fn parse_voc_document(xml: &str, path: &Path) -> Result<VocDocument, DetparseError> {
    let ctx = Xml { path };
    let document = roxmltree::Document::parse(xml).map_err(|source| ctx.err(source.to_string()))?;

    let root = document.root_element();
    if root.tag_name().name() != "annotation" {
        return Err(ctx.err("missing <annotation> root element".to_string()));
    }

    let filename = ctx.required_text(root, "filename", "<annotation>")?;
    let size = ctx
        .child(root, "size")
        .ok_or_else(|| ctx.err("missing <size> in <annotation>".to_string()))?;
    let width: u32 = ctx.number(size, "width", "<size>")?;
    let height: u32 = ctx.number(size, "height", "<size>")?;

    let mut objects = Vec::new();
    for object in root
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "object")
    {
        let name = ctx.required_text(object, "name", "<object>")?;
        let bndbox = ctx
            .child(object, "bndbox")
            .ok_or_else(|| ctx.err("missing <bndbox> in <object>".to_string()))?;

        let xmin: f64 = ctx.number(bndbox, "xmin", "<bndbox>")?;
        let ymin: f64 = ctx.number(bndbox, "ymin", "<bndbox>")?;
        let xmax: f64 = ctx.number(bndbox, "xmax", "<bndbox>")?;
        let ymax: f64 = ctx.number(bndbox, "ymax", "<bndbox>")?;

        let mut attrs = BTreeMap::new();
        for key in ["pose", "truncated", "difficult", "occluded"] {
            if let Some(value) = ctx.text(object, key) {
                attrs.insert(key.to_string(), value);
            }
        }

        objects.push(VocObject {
            name,
            bbox: BBox::from_xyxy(xmin, ymin, xmax, ymax),
            attrs,
        });
    }

    Ok(VocDocument {
        filename,
        width,
        height,
        objects,
    })
}

/// Checks that a single VOC annotation document parses from a UTF-8 string.
pub fn from_voc_xml_str(xml: &str) -> Result<(), DetparseError> {
    parse_voc_document(xml, Path::new("<memory>")).map(|_| ())
}

/// Checks that a single VOC annotation document parses from bytes.
///
/// The input must be valid UTF-8.
pub fn from_voc_xml_slice(bytes: &[u8]) -> Result<(), DetparseError> {
    let xml = std::str::from_utf8(bytes).map_err(|source| DetparseError::VocXmlParse {
        path: PathBuf::from("<memory>"),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    from_voc_xml_str(xml)
}
