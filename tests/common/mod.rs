#![allow(dead_code)]

use std::fs;
use std::path::Path;

use detparse::ConfigBag;

/// Writes `contents` to `path`, creating parent directories as needed.
pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write fixture file");
}

/// Turns a `json!({...})` literal into an option bag.
pub fn bag(value: serde_json::Value) -> ConfigBag {
    value
        .as_object()
        .cloned()
        .expect("fixture bag must be a JSON object")
}
