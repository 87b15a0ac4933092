//! Fixed-width field formatting
//!
//! Every record is a sequence of positional fields. Each field has a width and a kind
//! that decides its justification and fill character:
//!
//! | Kind           | Justification | Fill  |
//! |----------------|---------------|-------|
//! | `Numeric`      | right         | `0`   |
//! | `Alphanumeric` | left          | space |
//! | `Micr`         | right         | space |
//!
//! Values never get truncated: a value wider than its field is a `FieldOverflow`.

use crate::types::X9Error;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Justification and fill rules of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Alphanumeric,
    Micr,
}

/// Position-independent description of one field; offsets follow from table order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub width: usize,
    pub kind: FieldKind,
}

pub(crate) const fn numeric(name: &'static str, width: usize) -> FieldSpec {
    FieldSpec {
        name,
        width,
        kind: FieldKind::Numeric,
    }
}

pub(crate) const fn alpha(name: &'static str, width: usize) -> FieldSpec {
    FieldSpec {
        name,
        width,
        kind: FieldKind::Alphanumeric,
    }
}

pub(crate) const fn micr(name: &'static str, width: usize) -> FieldSpec {
    FieldSpec {
        name,
        width,
        kind: FieldKind::Micr,
    }
}

impl FieldSpec {
    /// The value a freshly created record holds in this field
    pub fn blank(&self) -> String {
        match self.kind {
            FieldKind::Numeric => "0".repeat(self.width),
            FieldKind::Alphanumeric | FieldKind::Micr => " ".repeat(self.width),
        }
    }

    /// Justify and pad a value to the field width
    ///
    /// # Errors
    ///
    /// - `FieldOverflow` if the value is wider than the field
    /// - `InvalidInputRecord` if a numeric field receives non-digits, or any field
    ///   receives characters outside printable ASCII
    pub fn format(&self, record_type: &str, value: &str) -> Result<String, X9Error> {
        if let Some(bad) = value.chars().find(|c| !(' '..='~').contains(c)) {
            return Err(X9Error::invalid_input(
                None,
                format!(
                    "field '{}' of record type {} contains unsupported character {:?}",
                    self.name, record_type, bad
                ),
            ));
        }

        let formatted = match self.kind {
            FieldKind::Numeric => {
                let digits = value.trim();
                if !digits.chars().all(|c| c.is_ascii_digit()) {
                    return Err(X9Error::invalid_input(
                        None,
                        format!(
                            "field '{}' of record type {} must be numeric, got '{}'",
                            self.name, record_type, value
                        ),
                    ));
                }
                format!("{:0>width$}", digits, width = self.width)
            }
            FieldKind::Alphanumeric => {
                format!("{:<width$}", value.trim_end(), width = self.width)
            }
            FieldKind::Micr => format!("{:>width$}", value.trim(), width = self.width),
        };

        if formatted.len() > self.width {
            return Err(X9Error::field_overflow(
                record_type,
                self.name,
                value,
                self.width,
            ));
        }

        Ok(formatted)
    }
}

/// Convert a dollar amount into whole cents
///
/// # Errors
///
/// Returns `InvalidAmount` for negative amounts or amounts with sub-cent precision.
pub fn to_cents(amount: Decimal) -> Result<u64, X9Error> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(X9Error::invalid_amount(amount, "amounts must not be negative"));
    }
    let cents = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| X9Error::invalid_amount(amount, "amount is too large"))?;
    if cents.fract() != Decimal::ZERO {
        return Err(X9Error::invalid_amount(
            amount,
            "amounts must have at most two decimal places",
        ));
    }
    cents
        .to_u64()
        .ok_or_else(|| X9Error::invalid_amount(amount, "amount is too large"))
}

/// Convert whole cents into a dollar amount with two decimal places
pub fn from_cents(cents: u64) -> Decimal {
    Decimal::from(cents) / Decimal::ONE_HUNDRED
}
