//! Core exchange-file logic
//!
//! This module contains the file hierarchy components:
//! - `traits` - Record sink abstraction shared by file and in-memory output
//! - `trailer` - Running totals and trailer reconciliation
//! - `writer` - Hierarchy state machine writing headers, items and trailers
//! - `reader` - Streaming reader and item reconstruction
//! - `generator` - Complete files from check item input
//! - `operations` - Whole-file verify, repair, listing and ACH conversion

pub mod generator;
pub mod operations;
pub mod reader;
pub mod trailer;
pub mod traits;
pub mod writer;

pub use generator::Generator;
pub use reader::{check_item_from_record, collect_items, X9Reader};
pub use trailer::{Accumulators, Level, Totals, TrailerValues};
pub use traits::RecordSink;
pub use writer::{WriteSummary, WriterState, X9Writer};
