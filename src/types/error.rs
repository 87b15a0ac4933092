//! Error types for the X9.37 cash-letter toolkit
//!
//! This module defines all error kinds that can occur while encoding, decoding,
//! writing, reconciling, or converting exchange files. Errors are designed to be
//! descriptive and user-friendly for CLI output.
//!
//! # Error Categories
//!
//! - **Fatal structural errors**: `FieldOverflow`, `MalformedRecord`, `IllegalSequence`,
//!   `InvalidInputRecord`. These abort the whole file operation because a partially
//!   written exchange file cannot be posted downstream.
//! - **Recoverable conditions**: `TrailerMismatch`, `ImageSizeMismatch`,
//!   `ImageNotRepairable`. These are collected into a diagnostics report instead of
//!   being returned, and the file still completes.
//! - **Ambient errors**: file not found, I/O, CSV parsing, configuration, image decoding.

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the toolkit
///
/// Each variant includes the context needed to locate the offending record,
/// field, or input row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum X9Error {
    /// A value does not fit its fixed-width destination field
    ///
    /// Fixed-format files cannot tolerate truncation, so the whole file aborts.
    #[error("Field overflow in record type {record_type} field '{field}': value '{value}' exceeds {width} characters")]
    FieldOverflow {
        /// Two-digit record type the field belongs to
        record_type: String,
        /// Field name from the record layout
        field: String,
        /// The value that was rejected
        value: String,
        /// Allotted field width
        width: usize,
    },

    /// A byte sequence is inconsistent with every known record layout
    #[error("Malformed record{}: {message}", offset.map(|o| format!(" at byte offset {}", o)).unwrap_or_default())]
    MalformedRecord {
        /// Byte offset of the record within the file (if known)
        offset: Option<u64>,
        /// Description of the inconsistency
        message: String,
    },

    /// A hierarchy transition violated nesting rules
    #[error("Illegal sequence: cannot {operation} while {state}")]
    IllegalSequence {
        /// Operation that was attempted
        operation: String,
        /// Writer state at the time of the attempt
        state: String,
    },

    /// A caller-supplied or recorded trailer disagrees with the computed totals
    ///
    /// Recoverable: logged, surfaced as a diagnostic, and the file still completes.
    #[error("Trailer mismatch in {trailer} field '{field}': recorded {recorded}, computed {computed}")]
    TrailerMismatch {
        /// Trailer that disagreed (bundle, cash letter, file)
        trailer: String,
        /// Trailer field name
        field: String,
        /// Value recorded in (or supplied for) the trailer
        recorded: String,
        /// Value computed from the accumulators
        computed: String,
    },

    /// A CSV or other source row is malformed
    ///
    /// Fail-fast: partial ACH or X9 files are not useful for downstream posting.
    #[error("Invalid input record{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    InvalidInputRecord {
        /// Line number of the offending row (if available)
        line: Option<u64>,
        /// Description of the problem
        message: String,
    },

    /// Declared image size does not equal the attached payload length
    #[error("Image size mismatch for item {item_sequence}: declared {declared} bytes, payload has {actual} bytes")]
    ImageSizeMismatch {
        /// ECE item sequence number of the owning item
        item_sequence: String,
        /// Size declared in the image view detail
        declared: usize,
        /// Actual payload length
        actual: usize,
    },

    /// An image failed validation and could not be corrected
    ///
    /// The original payload is still written through as a fallback.
    #[error("Image not repairable for item {item_sequence}: {reason}")]
    ImageNotRepairable {
        /// ECE item sequence number of the owning item
        item_sequence: String,
        /// Why the repair failed
        reason: String,
    },

    /// An image payload could not be decoded or encoded
    #[error("Image error: {message}")]
    ImageDecode {
        /// Description of the decode failure
        message: String,
    },

    /// An amount is not representable in the exchange format
    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
        /// Why it was rejected
        reason: String,
    },

    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },
}

impl X9Error {
    /// Whether the error is recoverable and belongs in a diagnostics report
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            X9Error::TrailerMismatch { .. }
                | X9Error::ImageSizeMismatch { .. }
                | X9Error::ImageNotRepairable { .. }
        )
    }
}

// Conversion from io::Error to X9Error
impl From<std::io::Error> for X9Error {
    fn from(error: std::io::Error) -> Self {
        X9Error::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to X9Error
impl From<csv::Error> for X9Error {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        X9Error::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl From<tiff::TiffError> for X9Error {
    fn from(error: tiff::TiffError) -> Self {
        X9Error::ImageDecode {
            message: error.to_string(),
        }
    }
}

impl From<image::ImageError> for X9Error {
    fn from(error: image::ImageError) -> Self {
        X9Error::ImageDecode {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl X9Error {
    /// Create a FieldOverflow error
    pub fn field_overflow(record_type: &str, field: &str, value: &str, width: usize) -> Self {
        X9Error::FieldOverflow {
            record_type: record_type.to_string(),
            field: field.to_string(),
            value: value.to_string(),
            width,
        }
    }

    /// Create a MalformedRecord error without an offset
    pub fn malformed(message: impl Into<String>) -> Self {
        X9Error::MalformedRecord {
            offset: None,
            message: message.into(),
        }
    }

    /// Create a MalformedRecord error at a known byte offset
    pub fn malformed_at(offset: u64, message: impl Into<String>) -> Self {
        X9Error::MalformedRecord {
            offset: Some(offset),
            message: message.into(),
        }
    }

    /// Create an IllegalSequence error
    pub fn illegal_sequence(operation: &str, state: &str) -> Self {
        X9Error::IllegalSequence {
            operation: operation.to_string(),
            state: state.to_string(),
        }
    }

    /// Create a TrailerMismatch error
    pub fn trailer_mismatch(
        trailer: &str,
        field: &str,
        recorded: impl ToString,
        computed: impl ToString,
    ) -> Self {
        X9Error::TrailerMismatch {
            trailer: trailer.to_string(),
            field: field.to_string(),
            recorded: recorded.to_string(),
            computed: computed.to_string(),
        }
    }

    /// Create an InvalidInputRecord error
    pub fn invalid_input(line: Option<u64>, message: impl Into<String>) -> Self {
        X9Error::InvalidInputRecord {
            line,
            message: message.into(),
        }
    }

    /// Create an ImageSizeMismatch error
    pub fn image_size_mismatch(item_sequence: &str, declared: usize, actual: usize) -> Self {
        X9Error::ImageSizeMismatch {
            item_sequence: item_sequence.to_string(),
            declared,
            actual,
        }
    }

    /// Create an ImageNotRepairable error
    pub fn image_not_repairable(item_sequence: &str, reason: impl Into<String>) -> Self {
        X9Error::ImageNotRepairable {
            item_sequence: item_sequence.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal, reason: &str) -> Self {
        X9Error::InvalidAmount {
            amount,
            reason: reason.to_string(),
        }
    }

    /// Create a ConfigError error
    pub fn config(message: impl Into<String>) -> Self {
        X9Error::ConfigError {
            message: message.into(),
        }
    }
}
