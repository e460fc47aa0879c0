//! Fuzzing placeholder for the dlis-core decoder
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_records

use bytes::Bytes;

pub fn fuzz_records(data: &[u8]) {
    use dlis_core::{DecodeOptions, LogicalRecords};

    // Walking arbitrary bytes must never panic
    let records =
        LogicalRecords::without_label(Bytes::copy_from_slice(data), DecodeOptions::default());
    for _ in records {}
}

pub fn fuzz_eflr(data: &[u8]) {
    // Parsing arbitrary bytes as a set must never panic
    let mut warnings = Vec::new();
    let _ = dlis_core::eflr::parse_eflr(data, &mut warnings);
}

pub fn fuzz_catalog(data: &[u8]) {
    use dlis_core::{Catalog, DecodeOptions};

    // Indexing arbitrary bytes must never panic
    let _ = Catalog::build(Bytes::copy_from_slice(data), DecodeOptions::default());
}
