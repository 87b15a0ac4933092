//! 94-character ACH record lines
//!
//! ACH records reuse the positional field rules of the exchange-file codec: numeric
//! fields are zero-filled and right-justified, alphanumeric fields are space-filled and
//! left-justified, and an oversize value is a `FieldOverflow` rather than a silent
//! truncation.

use crate::codec::field::{alpha, numeric};
use crate::codec::FieldSpec;
use crate::types::X9Error;

/// Length of every ACH record
pub const RECORD_LENGTH: usize = 94;
/// Records per block
pub const BLOCKING_FACTOR: usize = 10;

/// Builds one record line field by field
#[derive(Debug)]
pub struct LineBuilder {
    record_type: &'static str,
    line: String,
}

impl LineBuilder {
    pub fn new(record_type: &'static str) -> Self {
        let mut line = String::with_capacity(RECORD_LENGTH);
        line.push_str(record_type);
        Self { record_type, line }
    }

    /// Append a formatted field
    pub fn field(mut self, spec: FieldSpec, value: &str) -> Result<Self, X9Error> {
        let formatted = spec.format(self.record_type, value)?;
        self.line.push_str(&formatted);
        Ok(self)
    }

    /// Append a numeric field from an integer
    pub fn number(self, spec: FieldSpec, value: u64) -> Result<Self, X9Error> {
        self.field(spec, &value.to_string())
    }

    /// Append a literal constant
    pub fn literal(mut self, value: &str) -> Self {
        self.line.push_str(value);
        self
    }

    /// Finish the line
    ///
    /// # Errors
    ///
    /// Returns `MalformedRecord` when the fields do not add up to 94 characters.
    pub fn build(self) -> Result<String, X9Error> {
        if self.line.len() != RECORD_LENGTH {
            return Err(X9Error::malformed(format!(
                "ACH record type {} is {} characters, expected {}",
                self.record_type,
                self.line.len(),
                RECORD_LENGTH
            )));
        }
        Ok(self.line)
    }
}

/// File header (type 1) contents
#[derive(Debug, Clone)]
pub struct FileHeaderLine<'a> {
    pub immediate_destination: &'a str,
    pub immediate_origin: &'a str,
    /// YYMMDD
    pub creation_date: &'a str,
    /// HHMM
    pub creation_time: &'a str,
    pub file_id_modifier: &'a str,
    pub destination_name: &'a str,
    pub origin_name: &'a str,
}

pub fn file_header(header: &FileHeaderLine<'_>) -> Result<String, X9Error> {
    LineBuilder::new("1")
        .literal("01")
        .field(alpha("ImmediateDestination", 10), &format!(" {}", header.immediate_destination.trim()))?
        .field(alpha("ImmediateOrigin", 10), &format!(" {}", header.immediate_origin.trim()))?
        .field(numeric("FileCreationDate", 6), header.creation_date)?
        .field(numeric("FileCreationTime", 4), header.creation_time)?
        .field(alpha("FileIdModifier", 1), header.file_id_modifier)?
        .literal("094")
        .literal("10")
        .literal("1")
        .field(alpha("ImmediateDestinationName", 23), header.destination_name)?
        .field(alpha("ImmediateOriginName", 23), header.origin_name)?
        .field(alpha("ReferenceCode", 8), "")?
        .build()
}

/// Fields shared by the batch header (type 5) and batch control (type 8)
#[derive(Debug, Clone)]
pub struct BatchIdentity<'a> {
    pub service_class: &'a str,
    pub company_name: &'a str,
    pub company_id: &'a str,
    pub entry_class: &'a str,
    pub entry_description: &'a str,
    /// YYMMDD
    pub effective_date: &'a str,
    pub originating_dfi: &'a str,
    pub batch_number: u64,
}

pub fn batch_header(batch: &BatchIdentity<'_>) -> Result<String, X9Error> {
    LineBuilder::new("5")
        .field(numeric("ServiceClassCode", 3), batch.service_class)?
        .field(alpha("CompanyName", 16), batch.company_name)?
        .field(alpha("CompanyDiscretionaryData", 20), "")?
        .field(alpha("CompanyIdentification", 10), batch.company_id)?
        .field(alpha("StandardEntryClass", 3), batch.entry_class)?
        .field(alpha("CompanyEntryDescription", 10), batch.entry_description)?
        .field(alpha("CompanyDescriptiveDate", 6), "")?
        .field(numeric("EffectiveEntryDate", 6), batch.effective_date)?
        .field(alpha("SettlementDate", 3), "")?
        .literal("1")
        .field(numeric("OriginatingDfi", 8), batch.originating_dfi)?
        .number(numeric("BatchNumber", 7), batch.batch_number)?
        .build()
}

/// Entry detail (type 6) contents
#[derive(Debug, Clone)]
pub struct EntryLine<'a> {
    pub transaction_code: &'a str,
    pub receiving_dfi: &'a str,
    pub check_digit: &'a str,
    pub account: &'a str,
    pub amount_cents: u64,
    pub identification: &'a str,
    pub name: &'a str,
    pub discretionary_data: &'a str,
    pub has_addenda: bool,
    pub trace_number: &'a str,
}

pub fn entry_detail(entry: &EntryLine<'_>) -> Result<String, X9Error> {
    LineBuilder::new("6")
        .field(numeric("TransactionCode", 2), entry.transaction_code)?
        .field(numeric("ReceivingDfi", 8), entry.receiving_dfi)?
        .field(alpha("CheckDigit", 1), entry.check_digit)?
        .field(alpha("DfiAccountNumber", 17), entry.account)?
        .number(numeric("Amount", 10), entry.amount_cents)?
        .field(alpha("IdentificationNumber", 15), entry.identification)?
        .field(alpha("IndividualName", 22), entry.name)?
        .field(alpha("DiscretionaryData", 2), entry.discretionary_data)?
        .literal(if entry.has_addenda { "1" } else { "0" })
        .field(numeric("TraceNumber", 15), entry.trace_number)?
        .build()
}

pub fn addenda(information: &str, addenda_sequence: u64, entry_sequence: &str) -> Result<String, X9Error> {
    LineBuilder::new("7")
        .literal("05")
        .field(alpha("PaymentRelatedInformation", 80), information)?
        .number(numeric("AddendaSequenceNumber", 4), addenda_sequence)?
        .field(numeric("EntryDetailSequenceNumber", 7), entry_sequence)?
        .build()
}

/// Totals carried by batch and file controls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlTotals {
    /// Entries plus addenda
    pub entry_addenda_count: u64,
    pub entry_hash: u64,
    pub debit_cents: u64,
    pub credit_cents: u64,
}

impl ControlTotals {
    /// Roll another set of totals into this one
    ///
    /// # Errors
    ///
    /// Returns `InvalidInputRecord` when a count or amount sum overflows.
    pub fn add(&mut self, other: &ControlTotals) -> Result<(), X9Error> {
        let overflow = || X9Error::invalid_input(None, "ACH control totals overflowed");
        self.entry_addenda_count = self
            .entry_addenda_count
            .checked_add(other.entry_addenda_count)
            .ok_or_else(overflow)?;
        self.entry_hash = (self.entry_hash + other.entry_hash) % ENTRY_HASH_MODULUS;
        self.debit_cents = self
            .debit_cents
            .checked_add(other.debit_cents)
            .ok_or_else(overflow)?;
        self.credit_cents = self
            .credit_cents
            .checked_add(other.credit_cents)
            .ok_or_else(overflow)?;
        Ok(())
    }
}

/// Entry hashes keep their low-order 10 digits
pub const ENTRY_HASH_MODULUS: u64 = 10_000_000_000;

pub fn batch_control(batch: &BatchIdentity<'_>, totals: &ControlTotals) -> Result<String, X9Error> {
    LineBuilder::new("8")
        .field(numeric("ServiceClassCode", 3), batch.service_class)?
        .number(numeric("EntryAddendaCount", 6), totals.entry_addenda_count)?
        .number(numeric("EntryHash", 10), totals.entry_hash)?
        .number(numeric("TotalDebitAmount", 12), totals.debit_cents)?
        .number(numeric("TotalCreditAmount", 12), totals.credit_cents)?
        .field(alpha("CompanyIdentification", 10), batch.company_id)?
        .field(alpha("MessageAuthenticationCode", 19), "")?
        .field(alpha("Reserved", 6), "")?
        .field(numeric("OriginatingDfi", 8), batch.originating_dfi)?
        .number(numeric("BatchNumber", 7), batch.batch_number)?
        .build()
}

pub fn file_control(batch_count: u64, block_count: u64, totals: &ControlTotals) -> Result<String, X9Error> {
    LineBuilder::new("9")
        .number(numeric("BatchCount", 6), batch_count)?
        .number(numeric("BlockCount", 6), block_count)?
        .number(numeric("EntryAddendaCount", 8), totals.entry_addenda_count)?
        .number(numeric("EntryHash", 10), totals.entry_hash)?
        .number(numeric("TotalDebitAmount", 12), totals.debit_cents)?
        .number(numeric("TotalCreditAmount", 12), totals.credit_cents)?
        .field(alpha("Reserved", 39), "")?
        .build()
}

/// Block padding line
pub fn filler() -> String {
    "9".repeat(RECORD_LENGTH)
}
