//! I/O module
//!
//! Handles CSV input, listings and output files.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (row conversion, listing serialization)
//! - `sync_reader` - Synchronous CSV readers with iterator interfaces
//! - `atomic` - Output files committed by rename

pub mod atomic;
pub mod csv_format;
pub mod sync_reader;

pub use atomic::AtomicOutput;
pub use csv_format::{
    convert_ach_row, convert_item_record, write_diagnostics_csv, write_listing, ItemCsvRecord,
    ACH_COLUMNS,
};
pub use sync_reader::{read_ach_transactions, read_items, AchReader, ItemReader};
