//! The single tagged record type
//!
//! A `Record` is a record-type discriminant plus the positional field values of that
//! type's layout. Values are always held at their full, formatted width, so a decoded
//! record re-encodes to exactly the bytes it came from.

use super::field::{from_cents, to_cents};
use super::layout::RecordType;
use crate::types::X9Error;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

/// Variable-length sections of an image view data record (type 52)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariableData {
    /// Image reference key (text, up to 9999 characters)
    pub image_reference_key: String,
    /// Digital signature (binary, up to 99999 bytes)
    pub digital_signature: Vec<u8>,
    /// Image data (binary TIFF, up to 9,999,999 bytes)
    pub image_data: Vec<u8>,
}

/// One exchange-file record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    record_type: RecordType,
    values: Vec<String>,
    variable: Option<VariableData>,
}

impl Record {
    /// Create a record with every field blank and the record type filled in
    pub fn new(record_type: RecordType) -> Self {
        let mut values: Vec<String> = record_type.layout().iter().map(|f| f.blank()).collect();
        values[0] = record_type.code().to_string();
        let variable = record_type.is_variable().then(VariableData::default);
        Record {
            record_type,
            values,
            variable,
        }
    }

    /// Build a record from already-formatted values (used by the decoder)
    pub(crate) fn from_parts(
        record_type: RecordType,
        values: Vec<String>,
        variable: Option<VariableData>,
    ) -> Self {
        Record {
            record_type,
            values,
            variable,
        }
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    /// Field values in layout order, at full width
    pub fn values(&self) -> &[String] {
        &self.values
    }

    fn index(&self, name: &str) -> Result<usize, X9Error> {
        self.record_type.field_index(name).ok_or_else(|| {
            X9Error::malformed(format!(
                "record type {} has no field '{}'",
                self.record_type.code(),
                name
            ))
        })
    }

    /// Set a field, justifying and padding it to its width
    pub fn set(&mut self, name: &str, value: impl AsRef<str>) -> Result<&mut Self, X9Error> {
        let index = self.index(name)?;
        let spec = self.record_type.layout()[index];
        self.values[index] = spec.format(self.record_type.code(), value.as_ref())?;
        Ok(self)
    }

    /// Builder-style `set`
    pub fn with(mut self, name: &str, value: impl AsRef<str>) -> Result<Self, X9Error> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Set a numeric field from an integer
    pub fn set_number(&mut self, name: &str, value: u64) -> Result<&mut Self, X9Error> {
        self.set(name, value.to_string())
    }

    /// Set an amount field, stored as whole cents
    pub fn set_amount(&mut self, name: &str, amount: Decimal) -> Result<&mut Self, X9Error> {
        let cents = to_cents(amount)?;
        self.set_number(name, cents)
    }

    /// Set a date field as `YYYYMMDD`
    pub fn set_date(&mut self, name: &str, date: NaiveDate) -> Result<&mut Self, X9Error> {
        self.set(name, date.format("%Y%m%d").to_string())
    }

    /// Set a time field as `HHMM`
    pub fn set_time(&mut self, name: &str, time: NaiveTime) -> Result<&mut Self, X9Error> {
        self.set(name, time.format("%H%M").to_string())
    }

    /// Raw, full-width field value
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.record_type
            .field_index(name)
            .map(|i| self.values[i].as_str())
    }

    /// Field value with padding removed; empty for unknown fields
    pub fn text(&self, name: &str) -> &str {
        self.raw(name).map(str::trim).unwrap_or("")
    }

    /// Numeric field value; blank fields read as zero
    pub fn number(&self, name: &str) -> Result<u64, X9Error> {
        let raw = self.raw(name).ok_or_else(|| {
            X9Error::malformed(format!(
                "record type {} has no field '{}'",
                self.record_type.code(),
                name
            ))
        })?;
        let digits = raw.trim();
        if digits.is_empty() {
            return Ok(0);
        }
        digits.parse::<u64>().map_err(|_| {
            X9Error::malformed(format!(
                "field '{}' of record type {} is not numeric: '{}'",
                name,
                self.record_type.code(),
                raw
            ))
        })
    }

    /// Amount field value (stored as cents)
    pub fn amount(&self, name: &str) -> Result<Decimal, X9Error> {
        self.number(name).map(from_cents)
    }

    /// Date field value; `None` when blank or zero-filled
    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.text(name), "%Y%m%d").ok()
    }

    /// Variable sections (type 52 only)
    pub fn variable(&self) -> Option<&VariableData> {
        self.variable.as_ref()
    }

    /// Replace the variable sections of a type 52 record
    pub fn set_variable(&mut self, variable: VariableData) -> Result<&mut Self, X9Error> {
        if !self.record_type.is_variable() {
            return Err(X9Error::malformed(format!(
                "record type {} has no variable sections",
                self.record_type.code()
            )));
        }
        self.variable = Some(variable);
        Ok(self)
    }

    /// Total encoded length in bytes, excluding any framing
    pub fn encoded_len(&self) -> usize {
        let fixed = self.record_type.fixed_length();
        match &self.variable {
            Some(v) => {
                fixed
                    + 4
                    + v.image_reference_key.len()
                    + 5
                    + v.digital_signature.len()
                    + 7
                    + v.image_data.len()
            }
            None => fixed,
        }
    }
}
