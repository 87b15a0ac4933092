//! ACH batch files
//!
//! Builds NACHA-format ACH files from payment transactions, either read from the
//! 9-column transaction CSV or converted from the check details of an exchange file.
//!
//! # Modules
//!
//! - `transaction`: input transactions and debit/credit classification
//! - `entry_class`: identification and name rules per standard entry class
//! - `record`: 94-character record lines
//! - `assembler`: batching, trace numbers and control totals

pub mod assembler;
pub mod entry_class;
pub mod record;
pub mod transaction;

pub use assembler::{next_trace_sequence, AchAssembler, AchFile, BatchSummary, MAX_TRACE_SEQUENCE};
pub use entry_class::{populate, rule_for, PopulationRule};
pub use record::ControlTotals;
pub use transaction::{AchTransaction, EntryDirection};
