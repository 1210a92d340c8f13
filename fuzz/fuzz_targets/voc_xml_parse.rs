//! Fuzz target for VOC XML decoding.
//!
//! Feeds arbitrary byte sequences to the VOC document decoder, checking for
//! panics, crashes, or hangs.

#![no_main]

use detparse::parser::voc::from_voc_xml_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid excessive memory usage.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_voc_xml_slice(data);
});
