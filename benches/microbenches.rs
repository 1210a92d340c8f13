//! Criterion microbenches for detparse construction and decoding.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure:
//! - parser construction through the format registry
//! - COCO JSON decoding (from_coco_json_str)
//! - AIR CSV decoding (from_air_csv_str)

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use detparse::parser::air::from_air_csv_str;
use detparse::parser::coco::from_coco_json_str;
use detparse::{create_parser, ConfigBag};

// Inline fixtures so the benchmarks do no file I/O.
const COCO_FIXTURE: &str = r#"{
    "info": {"description": "bench set", "year": 2017},
    "images": [
        {"id": 1, "width": 640, "height": 480, "file_name": "img001.jpg"},
        {"id": 2, "width": 800, "height": 600, "file_name": "img002.jpg"},
        {"id": 3, "width": 1024, "height": 768, "file_name": "img003.jpg"}
    ],
    "annotations": [
        {"id": 1, "image_id": 1, "category_id": 1, "bbox": [64.0, 96.0, 256.0, 288.0]},
        {"id": 2, "image_id": 1, "category_id": 2, "bbox": [192.0, 48.0, 256.0, 144.0]},
        {"id": 3, "image_id": 2, "category_id": 3, "bbox": [160.0, 180.0, 320.0, 360.0]},
        {"id": 4, "image_id": 2, "category_id": 4, "bbox": [80.0, 60.0, 240.0, 240.0]},
        {"id": 5, "image_id": 3, "category_id": 1, "bbox": [0.0, 0.0, 307.0, 461.0], "iscrowd": 1}
    ],
    "categories": [
        {"id": 1, "name": "person", "supercategory": "person"},
        {"id": 2, "name": "car", "supercategory": "vehicle"},
        {"id": 3, "name": "dog", "supercategory": "animal"},
        {"id": 4, "name": "cat", "supercategory": "animal"}
    ]
}"#;

const AIR_FIXTURE: &str = "filename,width,height,class,xmin,ymin,xmax,ymax
image001.jpg,640,480,airplane,0.1,0.2,0.5,0.8
image001.jpg,640,480,airplane,0.3,0.1,0.7,0.4
image002.jpg,800,600,airplane,0.2,0.3,0.6,0.9
image002.jpg,800,600,airplane,0.1,0.1,0.4,0.5
image003.jpg,640,480,airplane,0.0,0.0,0.3,0.6
";

/// Benchmark parser construction through the registry.
fn bench_registry_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");

    group.bench_function("create_parser_empty_bag", |b| {
        b.iter(|| {
            let parser = create_parser(black_box("coco"), ConfigBag::new()).unwrap();
            black_box(parser)
        })
    });

    let bag: ConfigBag = serde_json::from_str(
        r#"{"root": "/data/voc", "year": "2012", "split": "train", "keep_difficult": false}"#,
    )
    .unwrap();
    group.bench_function("create_parser_typed_options", |b| {
        b.iter(|| {
            let parser = create_parser(black_box("voc"), bag.clone()).unwrap();
            black_box(parser)
        })
    });

    group.bench_function("create_parser_unsupported", |b| {
        b.iter(|| {
            let err = create_parser(black_box("kitti"), ConfigBag::new()).unwrap_err();
            black_box(err)
        })
    });

    group.finish();
}

/// Benchmark COCO JSON decoding from string.
fn bench_coco_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("coco_decode");
    group.throughput(Throughput::Bytes(COCO_FIXTURE.len() as u64));

    group.bench_function("from_coco_json_str", |b| {
        b.iter(|| {
            let ds = from_coco_json_str(black_box(COCO_FIXTURE)).unwrap();
            black_box(ds)
        })
    });

    group.finish();
}

/// Benchmark AIR CSV decoding from string.
fn bench_air_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("air_decode");
    group.throughput(Throughput::Bytes(AIR_FIXTURE.len() as u64));

    group.bench_function("from_air_csv_str", |b| {
        b.iter(|| {
            let ds = from_air_csv_str(black_box(AIR_FIXTURE)).unwrap();
            black_box(ds)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_registry_construction,
    bench_coco_decode,
    bench_air_decode,
);
criterion_main!(benches);
