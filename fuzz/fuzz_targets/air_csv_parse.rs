//! Fuzz target for AIR CSV decoding.
//!
//! Feeds arbitrary byte sequences to the AIR decoder, checking for panics,
//! crashes, or hangs.

#![no_main]

use detparse::parser::air::from_air_csv_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid excessive memory usage.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_air_csv_slice(data);
});
