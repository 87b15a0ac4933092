//! Record codec
//!
//! Translates typed records to fixed-width positional bytes and back.
//!
//! # Components
//!
//! - `charset` - ASCII / EBCDIC transcoding of text fields
//! - `field` - field justification, padding, and amount conversion
//! - `layout` - static field tables keyed by record type
//! - `record` - the single tagged `Record` type
//! - `framing` - record streams with or without length prefixes
//!
//! `encode` and `decode` are pure: they never touch I/O, so every layout can be tested
//! in memory.

pub mod charset;
pub mod field;
pub mod framing;
pub mod layout;
pub mod record;

pub use charset::Charset;
pub use field::{FieldKind, FieldSpec};
pub use framing::{Framing, RecordReader, RecordWriter};
pub use layout::{RecordType, FIXED_RECORD_LENGTH};
pub use record::{Record, VariableData};

use crate::types::X9Error;

/// Widths of the length fields that precede each variable section of a type 52 record
const KEY_LENGTH_WIDTH: usize = 4;
const SIGNATURE_LENGTH_WIDTH: usize = 5;
const IMAGE_LENGTH_WIDTH: usize = 7;

/// Encode a record into file bytes
///
/// # Errors
///
/// Returns `FieldOverflow` when a variable section is too long for its length field.
/// Fixed fields are already validated when they are set.
pub fn encode(record: &Record, charset: Charset) -> Result<Vec<u8>, X9Error> {
    let mut bytes = Vec::with_capacity(record.encoded_len());
    for value in record.values() {
        bytes.extend(charset.encode(value));
    }

    if let Some(variable) = record.variable() {
        let code = record.record_type().code();
        let key_len = length_field(
            code,
            "LengthOfImageReferenceKey",
            variable.image_reference_key.len(),
            KEY_LENGTH_WIDTH,
        )?;
        bytes.extend(charset.encode(&key_len));
        bytes.extend(charset.encode(&variable.image_reference_key));

        let sig_len = length_field(
            code,
            "LengthOfDigitalSignature",
            variable.digital_signature.len(),
            SIGNATURE_LENGTH_WIDTH,
        )?;
        bytes.extend(charset.encode(&sig_len));
        bytes.extend_from_slice(&variable.digital_signature);

        let data_len = length_field(
            code,
            "LengthOfImageData",
            variable.image_data.len(),
            IMAGE_LENGTH_WIDTH,
        )?;
        bytes.extend(charset.encode(&data_len));
        bytes.extend_from_slice(&variable.image_data);
    }

    Ok(bytes)
}

fn length_field(record_type: &str, name: &str, len: usize, width: usize) -> Result<String, X9Error> {
    let text = format!("{:0>width$}", len, width = width);
    if text.len() > width {
        return Err(X9Error::field_overflow(record_type, name, &len.to_string(), width));
    }
    Ok(text)
}

/// Decode one record (without framing) from file bytes
///
/// Dispatches on the two-digit record type, then slices fields positionally.
///
/// # Errors
///
/// Returns `MalformedRecord` for an unknown record type, a length that does not match
/// the layout, or corrupt variable-section length fields.
pub fn decode(bytes: &[u8], charset: Charset) -> Result<Record, X9Error> {
    if bytes.len() < 2 {
        return Err(X9Error::malformed(format!(
            "record of {} bytes is too short to carry a record type",
            bytes.len()
        )));
    }
    let record_type = RecordType::from_code(&charset.decode(&bytes[..2]))?;
    let fixed_length = record_type.fixed_length();

    if !record_type.is_variable() && bytes.len() != fixed_length {
        return Err(X9Error::malformed(format!(
            "{} record must be {} bytes, got {}",
            record_type.name(),
            fixed_length,
            bytes.len()
        )));
    }
    if bytes.len() < fixed_length {
        return Err(X9Error::malformed(format!(
            "{} record must be at least {} bytes, got {}",
            record_type.name(),
            fixed_length,
            bytes.len()
        )));
    }

    let mut values = Vec::with_capacity(record_type.layout().len());
    let mut offset = 0;
    for spec in record_type.layout() {
        values.push(charset.decode(&bytes[offset..offset + spec.width]));
        offset += spec.width;
    }

    let variable = if record_type.is_variable() {
        let mut cursor = VariableCursor {
            bytes,
            offset,
            charset,
        };
        let key_len = cursor.length(KEY_LENGTH_WIDTH, "image reference key")?;
        let image_reference_key = charset.decode(cursor.take(key_len, "image reference key")?);
        let sig_len = cursor.length(SIGNATURE_LENGTH_WIDTH, "digital signature")?;
        let digital_signature = cursor.take(sig_len, "digital signature")?.to_vec();
        let data_len = cursor.length(IMAGE_LENGTH_WIDTH, "image data")?;
        let image_data = cursor.take(data_len, "image data")?.to_vec();

        if cursor.offset != bytes.len() {
            return Err(X9Error::malformed(format!(
                "{} record has {} trailing bytes",
                record_type.name(),
                bytes.len() - cursor.offset
            )));
        }

        Some(VariableData {
            image_reference_key,
            digital_signature,
            image_data,
        })
    } else {
        None
    };

    Ok(Record::from_parts(record_type, values, variable))
}

/// Walks the variable sections of a type 52 record
struct VariableCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
    charset: Charset,
}

impl<'a> VariableCursor<'a> {
    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], X9Error> {
        let end = self.offset.checked_add(len).filter(|&end| end <= self.bytes.len());
        match end {
            Some(end) => {
                let slice = &self.bytes[self.offset..end];
                self.offset = end;
                Ok(slice)
            }
            None => Err(X9Error::malformed(format!(
                "{} of {} bytes runs past the end of the record",
                what, len
            ))),
        }
    }

    fn length(&mut self, width: usize, what: &str) -> Result<usize, X9Error> {
        let charset = self.charset;
        let text = charset.decode(self.take(width, what)?);
        parse_length(&text, what)
    }
}

/// Parse a zero-filled decimal length field
pub(crate) fn parse_length(text: &str, what: &str) -> Result<usize, X9Error> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(X9Error::malformed(format!(
            "length of {} is not numeric: '{}'",
            what, text
        )));
    }
    text.parse::<usize>()
        .map_err(|_| X9Error::malformed(format!("length of {} is out of range: '{}'", what, text)))
}
