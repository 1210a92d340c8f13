//! End-to-end tests for the VOC parser against on-disk devkit layouts.

use std::path::Path;

use serde_json::json;

use detparse::parser::voc::{VocConfig, VocParser};
use detparse::{create_parser, AnnotationParser, DetparseError};

mod common;
use common::{bag, write_file};

fn voc_xml(filename: &str, objects: &[(&str, &str)]) -> String {
    let mut xml = format!(
        "<annotation>\n  <filename>{filename}</filename>\n  \
         <size><width>500</width><height>375</height><depth>3</depth></size>\n"
    );
    for (name, difficult) in objects {
        xml.push_str(&format!(
            "  <object>\n    <name>{name}</name>\n    <difficult>{difficult}</difficult>\n    \
             <bndbox><xmin>10</xmin><ymin>20</ymin><xmax>110</xmax><ymax>220</ymax></bndbox>\n  \
             </object>\n"
        ));
    }
    xml.push_str("</annotation>\n");
    xml
}

/// Writes a minimal VOC2012 devkit under `root` with three annotated images
/// and a train split listing two of them.
fn write_devkit(root: &Path) {
    let devkit = root.join("VOC2012");
    write_file(
        &devkit.join("Annotations/2012_000001.xml"),
        &voc_xml("2012_000001.jpg", &[("dog", "0"), ("person", "1")]),
    );
    write_file(
        &devkit.join("Annotations/2012_000002.xml"),
        &voc_xml("2012_000002.jpg", &[("cat", "0")]),
    );
    write_file(
        &devkit.join("Annotations/2012_000003.xml"),
        &voc_xml("2012_000003.jpg", &[("car", "0")]),
    );
    write_file(
        &devkit.join("ImageSets/Main/train.txt"),
        "2012_000002\n2012_000001\n",
    );
}

#[test]
fn split_file_selects_and_orders_images() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_devkit(temp.path());

    let parser = VocParser::new(VocConfig {
        root: temp.path().to_path_buf(),
        ..Default::default()
    })
    .expect("build parser");
    let dataset = parser.parse().expect("parse devkit");

    // 2012_000003 is not in the split. Stems are sorted, so IDs are stable
    // regardless of the order in train.txt.
    assert_eq!(dataset.images.len(), 2);
    assert_eq!(dataset.images[0].file_name, "2012_000001.jpg");
    assert_eq!(dataset.images[0].id.as_u64(), 1);
    assert_eq!(dataset.images[1].file_name, "2012_000002.jpg");
    assert_eq!(dataset.images[1].id.as_u64(), 2);

    assert_eq!(dataset.categories.len(), 20);
    assert_eq!(dataset.annotations.len(), 3);
    assert_eq!(dataset.annotations[0].id.as_u64(), 1);
    assert_eq!(dataset.annotations[2].id.as_u64(), 3);

    // dog is class 12 in the canonical ordering.
    assert_eq!(dataset.annotations[0].category_id.as_u64(), 12);
}

#[test]
fn root_may_point_at_the_voc_subtree_directly() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_devkit(temp.path());

    let config = bag(json!({
        "root": temp.path().join("VOC2012").to_str().unwrap(),
    }));
    let parser = create_parser("voc", config).expect("build parser");
    let dataset = parser.parse().expect("parse devkit");

    assert_eq!(dataset.images.len(), 2);
}

#[test]
fn missing_split_file_falls_back_to_directory_scan() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_devkit(temp.path());

    let parser = VocParser::new(VocConfig {
        root: temp.path().to_path_buf(),
        split: "val".to_string(), // no val.txt in the fixture
        ..Default::default()
    })
    .expect("build parser");
    let dataset = parser.parse().expect("parse devkit");

    // The scan picks up all three annotation documents.
    assert_eq!(dataset.images.len(), 3);
    assert_eq!(dataset.images[2].file_name, "2012_000003.jpg");
}

#[test]
fn difficult_objects_drop_when_not_kept() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_devkit(temp.path());

    let config = bag(json!({
        "root": temp.path().to_str().unwrap(),
        "keep_difficult": false,
    }));
    let parser = create_parser("voc", config).expect("build parser");
    let dataset = parser.parse().expect("parse devkit");

    // The difficult person in 2012_000001 is gone; dog and cat remain.
    assert_eq!(dataset.annotations.len(), 2);
    assert!(dataset
        .annotations
        .iter()
        .all(|ann| ann.attributes.get("difficult") != Some(&"1".to_string())));
}

#[test]
fn object_attributes_are_captured() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_devkit(temp.path());

    let parser = VocParser::new(VocConfig {
        root: temp.path().to_path_buf(),
        ..Default::default()
    })
    .expect("build parser");
    let dataset = parser.parse().expect("parse devkit");

    let person = &dataset.annotations[1];
    assert_eq!(person.attributes.get("difficult"), Some(&"1".to_string()));
}

#[test]
fn unknown_class_is_a_data_error_naming_the_class() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_devkit(temp.path());

    let config = bag(json!({
        "root": temp.path().to_str().unwrap(),
        "classes": ["dog", "person"],
    }));
    let parser = create_parser("voc", config).expect("build parser");

    // 2012_000002 contains a cat, which the custom taxonomy lacks.
    let err = parser.parse().expect_err("cat is not configured");
    match err {
        DetparseError::InvalidData { path, message } => {
            assert!(path.to_string_lossy().contains("2012_000002.xml"));
            assert!(message.contains("'cat'"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unlabeled_mode_keeps_images_only() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_devkit(temp.path());

    let config = bag(json!({
        "root": temp.path().to_str().unwrap(),
        "has_labels": false,
    }));
    let parser = create_parser("voc", config).expect("build parser");
    let dataset = parser.parse().expect("parse devkit");

    assert_eq!(dataset.images.len(), 2);
    assert!(dataset.categories.is_empty());
    assert!(dataset.annotations.is_empty());
}

#[test]
fn missing_annotations_directory_is_a_layout_error() {
    let temp = tempfile::tempdir().expect("create temp dir");

    let parser = VocParser::new(VocConfig {
        root: temp.path().to_path_buf(),
        ..Default::default()
    })
    .expect("build parser");

    assert!(matches!(
        parser.parse(),
        Err(DetparseError::LayoutInvalid { .. })
    ));
}

#[test]
fn malformed_document_reports_its_path() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let devkit = temp.path().join("VOC2012");
    write_file(&devkit.join("Annotations/broken.xml"), "<annotation><filename>");

    let parser = VocParser::new(VocConfig {
        root: temp.path().to_path_buf(),
        ..Default::default()
    })
    .expect("build parser");

    let err = parser.parse().expect_err("broken xml");
    assert!(matches!(err, DetparseError::VocXmlParse { .. }));
    assert!(err.to_string().contains("broken.xml"));
}
