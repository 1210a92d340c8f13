//! Fuzz target for COCO JSON decoding.
//!
//! Feeds arbitrary byte sequences to the COCO decoder, checking for panics,
//! crashes, or hangs.
//!
//! Run with:
//!   cargo +nightly fuzz run coco_json_parse

#![no_main]

use detparse::parser::coco::from_coco_json_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid OOM on very large inputs.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_coco_json_slice(data);
});
