//! Core traits for record output
//!
//! The hierarchy writer emits finished records into a `RecordSink`. A sink can be an
//! encoded byte stream (`RecordWriter`) or an in-memory list, so the same writer logic
//! serves file output and tests.

use crate::codec::{Record, RecordWriter};
use crate::types::X9Error;
use std::io::Write;

/// Destination for finished records
pub trait RecordSink {
    /// Accept one record
    fn emit(&mut self, record: &Record) -> Result<(), X9Error>;

    /// Push buffered output to its destination
    fn flush(&mut self) -> Result<(), X9Error> {
        Ok(())
    }
}

impl<W: Write> RecordSink for RecordWriter<W> {
    fn emit(&mut self, record: &Record) -> Result<(), X9Error> {
        self.write_record(record)
    }

    fn flush(&mut self) -> Result<(), X9Error> {
        RecordWriter::flush(self)
    }
}

impl RecordSink for Vec<Record> {
    fn emit(&mut self, record: &Record) -> Result<(), X9Error> {
        self.push(record.clone());
        Ok(())
    }
}
