//! CSV format handling for input rows and record listings
//!
//! This module centralizes all CSV format concerns, providing:
//! - `ItemCsvRecord` for check item input and its conversion to `CheckItem`
//! - The 9-column ACH transaction row and its conversion to `AchTransaction`
//! - Record listing and diagnostics output
//!
//! Conversions are pure apart from loading image files referenced by item rows.

use crate::ach::transaction::AchTransaction;
use crate::codec::Record;
use crate::types::{split_on_us, CheckItem, Diagnostics, ImageSide, ItemImage, X9Error};
use csv::StringRecord;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Column order of the ACH transaction CSV
pub const ACH_COLUMNS: [&str; 9] = [
    "transaction_code",
    "routing",
    "account",
    "amount",
    "identification",
    "name",
    "discretionary_data",
    "trace_number",
    "addenda",
];

/// CSV record structure for check item input
///
/// Columns: routing, on_us, auxiliary_on_us, epc, amount, item_sequence, front_image,
/// back_image. Image columns hold paths relative to the CSV file and may be blank.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct ItemCsvRecord {
    pub routing: String,
    pub on_us: String,
    #[serde(default)]
    pub auxiliary_on_us: String,
    #[serde(default)]
    pub epc: String,
    pub amount: String,
    #[serde(default)]
    pub item_sequence: Option<String>,
    #[serde(default)]
    pub front_image: Option<String>,
    #[serde(default)]
    pub back_image: Option<String>,
}

fn parse_amount(value: &str, line: Option<u64>) -> Result<Decimal, X9Error> {
    Decimal::from_str(value.trim())
        .map_err(|_| X9Error::invalid_input(line, format!("invalid amount '{}'", value)))
}

fn load_image(side: ImageSide, path: &str, base_dir: &Path) -> Result<ItemImage, X9Error> {
    let full = base_dir.join(path.trim());
    if !full.exists() {
        return Err(X9Error::FileNotFound {
            path: full.display().to_string(),
        });
    }
    Ok(ItemImage::new(side, std::fs::read(&full)?))
}

/// Convert an ItemCsvRecord to a CheckItem
///
/// # Arguments
///
/// * `row` - The deserialized CSV row
/// * `line` - Line number of the row, for error messages
/// * `base_dir` - Directory relative image paths are resolved against
///
/// # Errors
///
/// - `InvalidInputRecord` for a blank routing number, unparsable amount or sequence
/// - `FileNotFound` / `IoError` when a referenced image cannot be read
pub fn convert_item_record(
    row: ItemCsvRecord,
    line: Option<u64>,
    base_dir: &Path,
) -> Result<CheckItem, X9Error> {
    if row.routing.trim().is_empty() {
        return Err(X9Error::invalid_input(line, "routing number is required"));
    }
    let mut item = CheckItem::new(row.routing.trim(), row.on_us.trim(), parse_amount(&row.amount, line)?);
    item.auxiliary_on_us = row.auxiliary_on_us.trim().to_string();
    item.epc = row.epc.trim().to_string();

    item.item_sequence = match row.item_sequence.as_deref().map(str::trim) {
        Some(sequence) if !sequence.is_empty() => Some(sequence.parse().map_err(|_| {
            X9Error::invalid_input(line, format!("invalid item sequence '{}'", sequence))
        })?),
        _ => None,
    };

    for (side, path) in [(ImageSide::Front, &row.front_image), (ImageSide::Back, &row.back_image)] {
        if let Some(path) = path.as_deref().filter(|p| !p.trim().is_empty()) {
            item.images.push(load_image(side, path, base_dir)?);
        }
    }
    Ok(item)
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Convert one ACH CSV row to an AchTransaction
///
/// The account column may carry `account/process-control`; the trace number column
/// carries the source item sequence.
///
/// # Errors
///
/// Returns `InvalidInputRecord` when the row does not have exactly 9 fields or the
/// amount does not parse.
pub fn convert_ach_row(row: &StringRecord, line: Option<u64>) -> Result<AchTransaction, X9Error> {
    if row.len() != ACH_COLUMNS.len() {
        return Err(X9Error::invalid_input(
            line,
            format!("expected {} fields, found {}", ACH_COLUMNS.len(), row.len()),
        ));
    }
    let field = |i: usize| row.get(i).unwrap_or("").trim();
    let (account, process_control) = split_on_us(field(2));

    Ok(AchTransaction {
        source_record_type: field(0).to_string(),
        routing: field(1).to_string(),
        account,
        process_control,
        amount: parse_amount(field(3), line)?,
        identification: field(4).to_string(),
        name: field(5).to_string(),
        discretionary_data: field(6).to_string(),
        sequence: field(7).to_string(),
        addenda: optional(field(8)),
        entry_class: None,
    })
}

/// Write a record listing in CSV format
///
/// Columns: record, type, name, length, fields. Fields are the fixed-part values
/// separated by `|` with trailing padding removed.
pub fn write_listing<'r>(
    records: impl IntoIterator<Item = &'r Record>,
    output: &mut dyn Write,
) -> Result<(), X9Error> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(["record", "type", "name", "length", "fields"])?;

    for (index, record) in records.into_iter().enumerate() {
        let record_type = record.record_type();
        let fields = record
            .values()
            .iter()
            .map(|v| v.trim_end())
            .collect::<Vec<_>>()
            .join("|");
        writer.write_record(&[
            (index + 1).to_string(),
            record_type.code().to_string(),
            record_type.name().to_string(),
            record.encoded_len().to_string(),
            fields,
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write diagnostics in CSV format with columns: resolution, recoverable, message
pub fn write_diagnostics_csv(diagnostics: &Diagnostics, output: &mut dyn Write) -> Result<(), X9Error> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(["resolution", "recoverable", "message"])?;
    for diagnostic in diagnostics.iter() {
        writer.write_record(&[
            format!("{:?}", diagnostic.resolution),
            diagnostic.error.is_recoverable().to_string(),
            diagnostic.error.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
