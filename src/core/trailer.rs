//! Trailer reconciliation
//!
//! Every hierarchy level keeps an accumulator of what was written beneath it. When the
//! level closes, its trailer (type 70, 90 or 99) is filled from the accumulator or
//! checked against values the caller supplied, and the accumulator rolls up into the
//! enclosing level.
//!
//! # Reconciliation Rules
//!
//! | Mode   | Caller supplied a value        | Caller supplied nothing |
//! |--------|--------------------------------|-------------------------|
//! | repair | computed value written; a differing supplied value is reported as repaired | computed value written |
//! | verify | supplied value written; a differing value is reported as a mismatch | computed value written |
//!
//! Mismatches never abort the file: they become diagnostics.
//!
//! The same rules drive `verify` and `repair_trailers`, which recompute totals over an
//! already decoded file.

use crate::codec::{Record, RecordType};
use crate::types::{Diagnostics, Resolution, X9Error};
use rust_decimal::Decimal;
use std::fmt;
use tracing::debug;

/// Hierarchy level that owns a trailer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Bundle,
    CashLetter,
    File,
}

/// A total carried in a trailer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailerField {
    ItemCount,
    ImageCount,
    Amount,
    MicrValidAmount,
    BundleCount,
    CashLetterCount,
    RecordCount,
}

/// Value of one trailer total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailerValue {
    Count(u64),
    Amount(Decimal),
}

impl fmt::Display for TrailerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrailerValue::Count(count) => write!(f, "{}", count),
            TrailerValue::Amount(amount) => write!(f, "{:.2}", amount),
        }
    }
}

const BUNDLE_FIELDS: &[(TrailerField, &str)] = &[
    (TrailerField::ItemCount, "ItemsWithinBundleCount"),
    (TrailerField::Amount, "BundleTotalAmount"),
    (TrailerField::MicrValidAmount, "MicrValidTotalAmount"),
    (TrailerField::ImageCount, "ImagesWithinBundleCount"),
];

const CASH_LETTER_FIELDS: &[(TrailerField, &str)] = &[
    (TrailerField::BundleCount, "BundleCount"),
    (TrailerField::ItemCount, "ItemsWithinCashLetterCount"),
    (TrailerField::Amount, "CashLetterTotalAmount"),
    (TrailerField::ImageCount, "ImagesWithinCashLetterCount"),
];

const FILE_FIELDS: &[(TrailerField, &str)] = &[
    (TrailerField::CashLetterCount, "CashLetterCount"),
    (TrailerField::RecordCount, "TotalRecordCount"),
    (TrailerField::ItemCount, "TotalItemCount"),
    (TrailerField::Amount, "FileTotalAmount"),
];

impl Level {
    pub fn name(self) -> &'static str {
        match self {
            Level::Bundle => "bundle",
            Level::CashLetter => "cash letter",
            Level::File => "file",
        }
    }

    /// Record type of the trailer that closes this level
    pub fn trailer_type(self) -> RecordType {
        match self {
            Level::Bundle => RecordType::BundleControl,
            Level::CashLetter => RecordType::CashLetterControl,
            Level::File => RecordType::FileControl,
        }
    }

    /// Totals carried by the trailer, with their field names
    pub fn fields(self) -> &'static [(TrailerField, &'static str)] {
        match self {
            Level::Bundle => BUNDLE_FIELDS,
            Level::CashLetter => CASH_LETTER_FIELDS,
            Level::File => FILE_FIELDS,
        }
    }
}

/// Running totals of one hierarchy level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Totals {
    pub item_count: u64,
    pub image_count: u64,
    pub amount: Decimal,
    /// Sum of the amounts of items whose MICR line read successfully
    pub micr_valid_amount: Decimal,
    pub bundle_count: u64,
    pub cash_letter_count: u64,
    /// Records written, including the trailer itself (file level only)
    pub record_count: u64,
}

fn checked_sum(a: Decimal, b: Decimal) -> Result<Decimal, X9Error> {
    a.checked_add(b)
        .ok_or_else(|| X9Error::invalid_amount(b, "running total overflowed"))
}

impl Totals {
    pub fn value(&self, field: TrailerField) -> TrailerValue {
        match field {
            TrailerField::ItemCount => TrailerValue::Count(self.item_count),
            TrailerField::ImageCount => TrailerValue::Count(self.image_count),
            TrailerField::Amount => TrailerValue::Amount(self.amount),
            TrailerField::MicrValidAmount => TrailerValue::Amount(self.micr_valid_amount),
            TrailerField::BundleCount => TrailerValue::Count(self.bundle_count),
            TrailerField::CashLetterCount => TrailerValue::Count(self.cash_letter_count),
            TrailerField::RecordCount => TrailerValue::Count(self.record_count),
        }
    }

    /// Count one item
    pub fn add_item(&mut self, amount: Decimal, micr_valid: bool) -> Result<(), X9Error> {
        self.amount = checked_sum(self.amount, amount)?;
        if micr_valid {
            self.micr_valid_amount = checked_sum(self.micr_valid_amount, amount)?;
        }
        self.item_count += 1;
        Ok(())
    }

    pub fn add_image(&mut self) {
        self.image_count += 1;
    }

    /// Add a closed child level's totals
    fn absorb(&mut self, child: &Totals) -> Result<(), X9Error> {
        self.amount = checked_sum(self.amount, child.amount)?;
        self.micr_valid_amount = checked_sum(self.micr_valid_amount, child.micr_valid_amount)?;
        self.item_count += child.item_count;
        self.image_count += child.image_count;
        self.bundle_count += child.bundle_count;
        Ok(())
    }
}

/// Accumulators for the three levels of one file
///
/// Roll-up is strictly additive: a closed bundle adds into its cash letter, a closed
/// cash letter adds into the file.
#[derive(Debug, Clone, Default)]
pub struct Accumulators {
    bundle: Totals,
    cash_letter: Totals,
    file: Totals,
}

impl Accumulators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_bundle(&mut self) {
        self.bundle = Totals::default();
    }

    pub fn open_cash_letter(&mut self) {
        self.cash_letter = Totals::default();
    }

    pub fn add_item(&mut self, amount: Decimal, micr_valid: bool) -> Result<(), X9Error> {
        self.bundle.add_item(amount, micr_valid)
    }

    pub fn add_image(&mut self) {
        self.bundle.add_image();
    }

    /// Count one emitted record towards the file's total record count
    pub fn add_record(&mut self) {
        self.file.record_count += 1;
    }

    pub fn bundle(&self) -> &Totals {
        &self.bundle
    }

    pub fn cash_letter(&self) -> &Totals {
        &self.cash_letter
    }

    pub fn file(&self) -> &Totals {
        &self.file
    }

    /// Roll the open bundle into its cash letter and return its totals
    pub fn close_bundle(&mut self) -> Result<Totals, X9Error> {
        let bundle = std::mem::take(&mut self.bundle);
        self.cash_letter.absorb(&bundle)?;
        self.cash_letter.bundle_count += 1;
        Ok(bundle)
    }

    /// Roll the open cash letter into the file and return its totals
    pub fn close_cash_letter(&mut self) -> Result<Totals, X9Error> {
        let cash_letter = std::mem::take(&mut self.cash_letter);
        self.file.absorb(&cash_letter)?;
        self.file.cash_letter_count += 1;
        Ok(cash_letter)
    }
}

/// Trailer values supplied by the caller, or read back from a decoded trailer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrailerValues {
    pub item_count: Option<u64>,
    pub image_count: Option<u64>,
    pub amount: Option<Decimal>,
    pub micr_valid_amount: Option<Decimal>,
    pub bundle_count: Option<u64>,
    pub cash_letter_count: Option<u64>,
    pub record_count: Option<u64>,
}

impl TrailerValues {
    pub fn get(&self, field: TrailerField) -> Option<TrailerValue> {
        match field {
            TrailerField::ItemCount => self.item_count.map(TrailerValue::Count),
            TrailerField::ImageCount => self.image_count.map(TrailerValue::Count),
            TrailerField::Amount => self.amount.map(TrailerValue::Amount),
            TrailerField::MicrValidAmount => self.micr_valid_amount.map(TrailerValue::Amount),
            TrailerField::BundleCount => self.bundle_count.map(TrailerValue::Count),
            TrailerField::CashLetterCount => self.cash_letter_count.map(TrailerValue::Count),
            TrailerField::RecordCount => self.record_count.map(TrailerValue::Count),
        }
    }

    fn set(&mut self, field: TrailerField, value: TrailerValue) {
        match (field, value) {
            (TrailerField::ItemCount, TrailerValue::Count(v)) => self.item_count = Some(v),
            (TrailerField::ImageCount, TrailerValue::Count(v)) => self.image_count = Some(v),
            (TrailerField::BundleCount, TrailerValue::Count(v)) => self.bundle_count = Some(v),
            (TrailerField::CashLetterCount, TrailerValue::Count(v)) => {
                self.cash_letter_count = Some(v)
            }
            (TrailerField::RecordCount, TrailerValue::Count(v)) => self.record_count = Some(v),
            (TrailerField::Amount, TrailerValue::Amount(v)) => self.amount = Some(v),
            (TrailerField::MicrValidAmount, TrailerValue::Amount(v)) => {
                self.micr_valid_amount = Some(v)
            }
            _ => {}
        }
    }

    /// Read the totals recorded in a decoded trailer
    pub fn from_record(level: Level, record: &Record) -> Result<Self, X9Error> {
        let mut values = TrailerValues::default();
        for &(field, name) in level.fields() {
            let value = match field {
                TrailerField::Amount | TrailerField::MicrValidAmount => {
                    TrailerValue::Amount(record.amount(name)?)
                }
                _ => TrailerValue::Count(record.number(name)?),
            };
            values.set(field, value);
        }
        Ok(values)
    }
}

/// Decide the values a trailer will carry
///
/// # Arguments
///
/// * `level` - Level being closed
/// * `computed` - Accumulated totals of that level
/// * `supplied` - Values the caller supplied (or the trailer recorded)
/// * `repair` - Whether computed values win over supplied ones
/// * `diagnostics` - Receives one `TrailerMismatch` per disagreeing field
///
/// # Returns
///
/// The values to write, one per trailer field of the level
pub fn reconcile(
    level: Level,
    computed: &Totals,
    supplied: &TrailerValues,
    repair: bool,
    diagnostics: &mut Diagnostics,
) -> TrailerValues {
    let mut written = TrailerValues::default();
    for &(field, name) in level.fields() {
        let expected = computed.value(field);
        let value = match supplied.get(field) {
            Some(recorded) if recorded != expected => {
                let error = X9Error::trailer_mismatch(level.name(), name, recorded, expected);
                if repair {
                    diagnostics.push(error, Resolution::Repaired);
                    expected
                } else {
                    diagnostics.push(error, Resolution::Reported);
                    recorded
                }
            }
            Some(recorded) => recorded,
            None => expected,
        };
        written.set(field, value);
    }
    written
}

/// Write trailer totals into a trailer record, leaving its other fields untouched
///
/// # Errors
///
/// Returns `FieldOverflow` when a total does not fit its field.
pub fn fill_trailer(level: Level, values: &TrailerValues, record: &mut Record) -> Result<(), X9Error> {
    for &(field, name) in level.fields() {
        match values.get(field) {
            Some(TrailerValue::Count(count)) => {
                record.set_number(name, count)?;
            }
            Some(TrailerValue::Amount(amount)) => {
                record.set_amount(name, amount)?;
            }
            None => {}
        }
    }
    Ok(())
}

/// Build a fresh trailer record carrying the given totals
pub fn build_trailer(level: Level, values: &TrailerValues) -> Result<Record, X9Error> {
    let mut record = Record::new(level.trailer_type());
    fill_trailer(level, values, &mut record)?;
    Ok(record)
}

/// Recompute every trailer of a decoded file and report disagreements
///
/// # Errors
///
/// Returns `MalformedRecord` when a header, item or trailer is out of place in the
/// file → cash letter → bundle nesting, and propagates non-numeric total fields.
pub fn verify(records: &[Record]) -> Result<Diagnostics, X9Error> {
    let mut records = records.to_vec();
    walk(&mut records, false)
}

/// Rewrite every trailer of a decoded file from recomputed totals
///
/// # Returns
///
/// The records with corrected trailers and a report of every field that changed
pub fn repair_trailers(mut records: Vec<Record>) -> Result<(Vec<Record>, Diagnostics), X9Error> {
    let diagnostics = walk(&mut records, true)?;
    Ok((records, diagnostics))
}

fn out_of_place(index: usize, what: &str, reason: &str) -> X9Error {
    X9Error::malformed(format!("{} at record {} {}", what, index + 1, reason))
}

fn walk(records: &mut [Record], repair: bool) -> Result<Diagnostics, X9Error> {
    let mut accumulators = Accumulators::new();
    let mut diagnostics = Diagnostics::new();
    let mut bundle_open = false;
    let mut cash_letter_open = false;

    for (index, record) in records.iter_mut().enumerate() {
        accumulators.add_record();
        let record_type = record.record_type();
        let level = match record_type {
            RecordType::FileHeader => {
                if cash_letter_open || bundle_open {
                    return Err(out_of_place(index, "file header", "starts inside a cash letter"));
                }
                accumulators = Accumulators::new();
                accumulators.add_record();
                None
            }
            RecordType::CashLetterHeader => {
                if cash_letter_open {
                    return Err(out_of_place(
                        index,
                        "cash letter header",
                        "starts before the previous cash letter closed",
                    ));
                }
                accumulators.open_cash_letter();
                cash_letter_open = true;
                None
            }
            RecordType::BundleHeader => {
                if !cash_letter_open || bundle_open {
                    return Err(out_of_place(
                        index,
                        "bundle header",
                        "is not directly inside an open cash letter",
                    ));
                }
                accumulators.open_bundle();
                bundle_open = true;
                None
            }
            RecordType::CheckDetail
            | RecordType::CheckDetailAddendumA
            | RecordType::CheckDetailAddendumC
            | RecordType::ImageViewDetail
            | RecordType::ImageViewData
                if !bundle_open =>
            {
                return Err(out_of_place(index, record_type.name(), "is outside any bundle"));
            }
            RecordType::CheckDetail => {
                let micr_valid = record.text("MicrValidIndicator") == "1";
                accumulators.add_item(record.amount("ItemAmount")?, micr_valid)?;
                None
            }
            RecordType::ImageViewDetail => {
                accumulators.add_image();
                None
            }
            RecordType::BundleControl => Some(Level::Bundle),
            RecordType::CashLetterControl => Some(Level::CashLetter),
            RecordType::FileControl => Some(Level::File),
            _ => None,
        };

        let Some(level) = level else {
            continue;
        };
        let computed = match level {
            Level::Bundle if !bundle_open => {
                return Err(X9Error::malformed(format!(
                    "bundle control at record {} has no bundle header",
                    index + 1
                )))
            }
            Level::CashLetter if !cash_letter_open || bundle_open => {
                return Err(X9Error::malformed(format!(
                    "cash letter control at record {} does not close a cash letter",
                    index + 1
                )))
            }
            Level::File if cash_letter_open || bundle_open => {
                return Err(out_of_place(
                    index,
                    "file control",
                    "arrives before every cash letter closed",
                ))
            }
            Level::Bundle => {
                bundle_open = false;
                accumulators.close_bundle()?
            }
            Level::CashLetter => {
                cash_letter_open = false;
                accumulators.close_cash_letter()?
            }
            Level::File => accumulators.file().clone(),
        };

        let recorded = TrailerValues::from_record(level, record)?;
        let written = reconcile(level, &computed, &recorded, repair, &mut diagnostics);
        if repair && written != recorded {
            fill_trailer(level, &written, record)?;
            debug!(level = level.name(), record = index + 1, "Trailer rewritten");
        }
    }

    Ok(diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn item(amount: i64) -> Record {
        let mut record = Record::new(RecordType::CheckDetail);
        record
            .set_amount("ItemAmount", Decimal::new(amount, 2))
            .unwrap()
            .set("MicrValidIndicator", "1")
            .unwrap();
        record
    }

    /// A file with one cash letter holding the given bundles, trailers left blank
    fn file_with_bundles(bundles: &[&[i64]]) -> Vec<Record> {
        let mut records = vec![
            Record::new(RecordType::FileHeader),
            Record::new(RecordType::CashLetterHeader),
        ];
        for amounts in bundles {
            records.push(Record::new(RecordType::BundleHeader));
            records.extend(amounts.iter().map(|&a| item(a)));
            records.push(Record::new(RecordType::BundleControl));
        }
        records.push(Record::new(RecordType::CashLetterControl));
        records.push(Record::new(RecordType::FileControl));
        records
    }

    #[test]
    fn test_totals_add_item() {
        let mut totals = Totals::default();
        totals.add_item(Decimal::new(1000, 2), true).unwrap();
        totals.add_item(Decimal::new(250, 2), false).unwrap();
        assert_eq!(totals.item_count, 2);
        assert_eq!(totals.amount, Decimal::new(1250, 2));
        assert_eq!(totals.micr_valid_amount, Decimal::new(1000, 2));
    }

    #[test]
    fn test_roll_up_is_additive() {
        let mut acc = Accumulators::new();
        acc.open_cash_letter();
        for bundle in [[100, 200], [300, 400]] {
            acc.open_bundle();
            for amount in bundle {
                acc.add_item(Decimal::new(amount, 2), true).unwrap();
                acc.add_image();
            }
            let closed = acc.close_bundle().unwrap();
            assert_eq!(closed.item_count, 2);
        }
        let cash_letter = acc.close_cash_letter().unwrap();
        assert_eq!(cash_letter.bundle_count, 2);
        assert_eq!(cash_letter.item_count, 4);
        assert_eq!(cash_letter.image_count, 4);
        assert_eq!(cash_letter.amount, Decimal::new(1000, 2));
        assert_eq!(acc.file().cash_letter_count, 1);
        assert_eq!(acc.file().amount, Decimal::new(1000, 2));
    }

    #[test]
    fn test_empty_bundle_rolls_up_zero() {
        let mut acc = Accumulators::new();
        acc.open_cash_letter();
        acc.open_bundle();
        let bundle = acc.close_bundle().unwrap();
        assert_eq!(bundle, Totals::default());
        assert_eq!(acc.close_cash_letter().unwrap().bundle_count, 1);
    }

    #[rstest]
    #[case::repair_overrides(true, Some(5), 4, 1, Resolution::Repaired)]
    #[case::verify_keeps_supplied(false, Some(5), 5, 1, Resolution::Reported)]
    fn test_reconcile_mismatch(
        #[case] repair: bool,
        #[case] supplied: Option<u64>,
        #[case] expected_written: u64,
        #[case] expected_diagnostics: usize,
        #[case] resolution: Resolution,
    ) {
        let computed = Totals {
            item_count: 4,
            ..Totals::default()
        };
        let supplied = TrailerValues {
            item_count: supplied,
            ..TrailerValues::default()
        };
        let mut diagnostics = Diagnostics::new();
        let written = reconcile(Level::Bundle, &computed, &supplied, repair, &mut diagnostics);
        assert_eq!(written.item_count, Some(expected_written));
        assert_eq!(diagnostics.len(), expected_diagnostics);
        let entry = diagnostics.iter().next().unwrap();
        assert_eq!(entry.resolution, resolution);
        assert!(matches!(entry.error, X9Error::TrailerMismatch { .. }));
    }

    #[rstest]
    fn test_reconcile_without_supplied_values(#[values(true, false)] repair: bool) {
        let computed = Totals {
            item_count: 3,
            amount: Decimal::new(3000, 2),
            ..Totals::default()
        };
        let mut diagnostics = Diagnostics::new();
        let written = reconcile(
            Level::Bundle,
            &computed,
            &TrailerValues::default(),
            repair,
            &mut diagnostics,
        );
        assert!(diagnostics.is_empty());
        assert_eq!(written.item_count, Some(3));
        assert_eq!(written.amount, Some(Decimal::new(3000, 2)));
        assert_eq!(written.micr_valid_amount, Some(Decimal::ZERO));
        assert_eq!(written.bundle_count, None);
    }

    #[test]
    fn test_build_trailer_fields() {
        let values = TrailerValues {
            item_count: Some(25),
            amount: Some(Decimal::new(25000, 2)),
            micr_valid_amount: Some(Decimal::new(25000, 2)),
            image_count: Some(0),
            ..TrailerValues::default()
        };
        let record = build_trailer(Level::Bundle, &values).unwrap();
        assert_eq!(record.raw("ItemsWithinBundleCount"), Some("0025"));
        assert_eq!(record.raw("BundleTotalAmount"), Some("000000025000"));
    }

    #[test]
    fn test_build_trailer_overflow() {
        let values = TrailerValues {
            item_count: Some(10_000),
            ..TrailerValues::default()
        };
        assert!(matches!(
            build_trailer(Level::Bundle, &values),
            Err(X9Error::FieldOverflow { .. })
        ));
    }

    #[test]
    fn test_repair_then_verify_is_clean() {
        let records = file_with_bundles(&[&[1000, 1000], &[500]]);
        let (repaired, changes) = repair_trailers(records).unwrap();
        assert!(!changes.is_empty());
        assert!(verify(&repaired).unwrap().is_empty());

        let file_control = repaired.last().unwrap();
        assert_eq!(file_control.number("TotalItemCount").unwrap(), 3);
        assert_eq!(file_control.number("CashLetterCount").unwrap(), 1);
        assert_eq!(file_control.number("TotalRecordCount").unwrap(), repaired.len() as u64);
        assert_eq!(
            file_control.amount("FileTotalAmount").unwrap(),
            Decimal::new(2500, 2)
        );
        let cash_letter_control = &repaired[repaired.len() - 2];
        assert_eq!(cash_letter_control.number("BundleCount").unwrap(), 2);
    }

    #[test]
    fn test_verify_reports_each_field() {
        let records = file_with_bundles(&[&[1000]]);
        let diagnostics = verify(&records).unwrap();
        // bundle: count, amount, micr amount; cash letter: bundles, items, amount;
        // file: cash letters, records, items, amount
        assert_eq!(diagnostics.len(), 10);
        assert!(diagnostics.iter().all(|d| d.resolution == Resolution::Reported));
    }

    fn sequence(types: &[RecordType]) -> Vec<Record> {
        types
            .iter()
            .map(|&t| match t {
                RecordType::CheckDetail => item(1000),
                other => Record::new(other),
            })
            .collect()
    }

    use RecordType::{
        BundleControl as B70, BundleHeader as B20, CashLetterControl as C90,
        CashLetterHeader as C10, CheckDetail as I25, CheckDetailAddendumA as A26,
        CheckDetailAddendumC as A28, FileControl as F99, FileHeader as F01,
        ImageViewData as V52, ImageViewDetail as V50,
    };

    #[rstest]
    #[case::file_control_with_open_cash_letter(&[F01, C10, B20, I25, B70, F99])]
    #[case::file_control_with_open_bundle(&[F01, C10, B20, I25, F99])]
    #[case::item_before_cash_letter(&[F01, I25, C10, B20, B70, C90, F99])]
    #[case::item_between_bundles(&[F01, C10, B20, B70, I25, C90, F99])]
    #[case::addendum_a_outside_bundle(&[F01, C10, A26, B20, B70, C90, F99])]
    #[case::addendum_c_outside_bundle(&[F01, C10, A28, B20, B70, C90, F99])]
    #[case::image_detail_outside_bundle(&[F01, C10, V50, B20, B70, C90, F99])]
    #[case::image_data_outside_bundle(&[F01, C10, V52, B20, B70, C90, F99])]
    #[case::bundle_without_cash_letter(&[F01, B20, I25, B70, F99])]
    #[case::nested_bundle(&[F01, C10, B20, B20, B70, C90, F99])]
    #[case::nested_cash_letter(&[F01, C10, C10, C90, F99])]
    #[case::file_header_inside_cash_letter(&[F01, C10, F01, C90, F99])]
    fn test_misnested_file_is_rejected(
        #[case] types: &[RecordType],
        #[values(true, false)] repair: bool,
    ) {
        let records = sequence(types);
        let result = if repair {
            repair_trailers(records).map(|(_, diagnostics)| diagnostics)
        } else {
            verify(&records)
        };
        assert!(
            matches!(result, Err(X9Error::MalformedRecord { .. })),
            "expected MalformedRecord, got {:?}",
            result
        );
    }

    #[test]
    fn test_well_nested_sequence_is_accepted() {
        let records = sequence(&[F01, C10, B20, I25, A26, V50, V52, B70, C90, C10, C90, F99]);
        let (repaired, _) = repair_trailers(records).unwrap();
        let file_control = repaired.last().unwrap();
        assert_eq!(file_control.number("CashLetterCount").unwrap(), 2);
        assert_eq!(file_control.number("TotalItemCount").unwrap(), 1);
        assert_eq!(
            file_control.amount("FileTotalAmount").unwrap(),
            Decimal::new(1000, 2)
        );
    }

    #[test]
    fn test_verify_rejects_orphan_trailer() {
        let records = vec![
            Record::new(RecordType::FileHeader),
            Record::new(RecordType::CashLetterHeader),
            Record::new(RecordType::BundleControl),
        ];
        assert!(matches!(
            verify(&records),
            Err(X9Error::MalformedRecord { .. })
        ));
    }
}
