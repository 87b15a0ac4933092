//! Benchmark suite for the record codec
//!
//! Measures encoding and decoding of complete cash letters and the trailer check
//! over decoded records, using the divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//! ```
//!
//! Each benchmark runs over files of 100, 1,000 and 10,000 items of $10.00 in
//! bundles of 300.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::sync::Arc;
use x9_cashletter::codec::{Charset, Framing, Record, RecordReader, RecordWriter};
use x9_cashletter::config::{FileHeaderDefaults, WriterConfig};
use x9_cashletter::core::trailer::verify;
use x9_cashletter::core::Generator;
use x9_cashletter::types::CheckItem;

const SIZES: &[usize] = &[100, 1_000, 10_000];

fn main() {
    divan::main();
}

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .expect("Invalid date")
}

fn records(items: usize) -> Vec<Record> {
    let config = WriterConfig {
        max_items_per_bundle: Some(300),
        ..WriterConfig::default()
    };
    let generator = Generator::new(Arc::new(config), FileHeaderDefaults::default());
    let input = (0..items).map(|i| {
        Ok(CheckItem::new(
            "011000015",
            &format!("12345678/{}", 1000 + i),
            Decimal::new(1000, 2),
        ))
    });
    generator
        .write(Vec::new(), input, now())
        .expect("Generation failed")
        .0
}

fn encode(records: &[Record], charset: Charset) -> Vec<u8> {
    let mut writer = RecordWriter::new(Vec::new(), charset, Framing::LengthPrefixed);
    for record in records {
        writer.write_record(record).expect("Encoding failed");
    }
    writer.into_inner()
}

/// Encode a whole file in ASCII
#[divan::bench(args = SIZES)]
fn encode_ascii(bencher: divan::Bencher, items: usize) {
    let records = records(items);
    bencher.bench(|| encode(&records, Charset::Ascii));
}

/// Encode a whole file in EBCDIC
#[divan::bench(args = SIZES)]
fn encode_ebcdic(bencher: divan::Bencher, items: usize) {
    let records = records(items);
    bencher.bench(|| encode(&records, Charset::Ebcdic));
}

/// Detect the format and decode a whole EBCDIC file
#[divan::bench(args = SIZES)]
fn decode_ebcdic(bencher: divan::Bencher, items: usize) {
    let bytes = encode(&records(items), Charset::Ebcdic);
    bencher.bench(|| {
        RecordReader::detect(bytes.as_slice())
            .expect("Detection failed")
            .collect::<Result<Vec<_>, _>>()
            .expect("Decoding failed")
    });
}

/// Recompute every trailer of a decoded file
#[divan::bench(args = SIZES)]
fn verify_trailers(bencher: divan::Bencher, items: usize) {
    let records = records(items);
    bencher.bench(|| verify(&records).expect("Verification failed"));
}
