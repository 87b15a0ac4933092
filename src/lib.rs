//! X9.37 Image Cash Letter Library
//! # Overview
//!
//! This library reads and writes X9.37 image cash letter files, reconciles their trailer
//! totals, attaches and repairs TIFF check images, and assembles NACHA ACH files from
//! check details.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`codec`] - Record layouts, field formatting, ASCII/EBCDIC and record framing
//! - [`core`] - Business logic components:
//!   - [`core::writer`] - Hierarchy state machine (file → cash letter → bundle → item)
//!   - [`core::trailer`] - Per-level accumulators, trailer repair and verification
//!   - [`core::reader`] - Streaming reader and item reconstruction
//!   - [`core::generator`] - Complete files from item CSVs
//!   - [`core::operations`] - Whole-file verify, repair and convert operations
//! - [`image`] - Image size checks, TIFF inspection and repair
//! - [`ach`] - ACH batching, trace numbers, control totals and 94-character records
//! - [`io`] - CSV input, listings and atomic output files
//! - [`strategy`] - Sequential or parallel processing of many files
//! - [`config`] - TOML settings resolved into immutable writer and ACH configuration
//! - [`types`] - Headers, items, diagnostics and errors
//! - [`cli`] - CLI arguments parsing
//!
//! # File Hierarchy
//!
//! ```text
//! 01 File Header
//!   10 Cash Letter Header
//!     20 Bundle Header
//!       25 Check Detail (+ 26/28 endorsements, 50/52 image pairs)
//!     70 Bundle Control
//!   90 Cash Letter Control
//! 99 File Control
//! ```
//!
//! Every control record carries totals over the items it encloses. The writer
//! computes them while items are written and either fills them in or checks the
//! supplied values at close.

// Module declarations
pub mod ach;
pub mod cli;
pub mod codec;
pub mod config;
pub mod core;
pub mod image;
pub mod io;
pub mod strategy;
pub mod types;

pub use ach::{AchAssembler, AchFile, AchTransaction};
pub use codec::{Charset, Framing, Record, RecordReader, RecordType, RecordWriter};
pub use config::{AchConfig, ImageRequirements, Settings, WriterConfig};
pub use self::core::{Generator, Totals, WriteSummary, X9Reader, X9Writer};
pub use types::{
    BundleHeader, CashLetterHeader, CheckItem, Diagnostic, Diagnostics, FileHeader, ItemImage,
    Resolution, X9Error,
};
