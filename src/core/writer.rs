//! Hierarchy writer
//!
//! `X9Writer` turns logical headers and items into records and enforces the nesting of
//! an exchange file:
//!
//! ```text
//! Closed -> FileOpen -> CashLetterOpen -> BundleOpen
//!              ^             ^    |          |
//!              |             |    +----------+  (close_bundle)
//!              +-------------+                  (close_cash_letter)
//! FileOpen -> FileClosed                        (close_file)
//! ```
//!
//! Every error moves the writer into `Failed`; from there every call fails. The record
//! stream is unusable once a record has been rejected halfway through an item.
//!
//! # Identifiers
//!
//! - Cash letter IDs count up per file from 1 unless the header supplies one
//! - Bundle IDs count up per file from 1; bundle sequence numbers wrap 9999 -> 1
//! - Item sequence numbers start at `item_sequence_start` and wrap to 1 after
//!   `item_sequence_max`

use super::traits::RecordSink;
use super::trailer::{build_trailer, reconcile, Accumulators, Level, Totals, TrailerValues};
use crate::codec::{Record, RecordType, VariableData};
use crate::config::WriterConfig;
use crate::image;
use crate::types::{
    BundleHeader, CashLetterHeader, CheckItem, Diagnostics, EndorsementKind, FileHeader,
    ItemImage, ItemSequence, X9Error,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

const MAX_BUNDLE_SEQUENCE: u16 = 9999;
const MAX_IMAGES_PER_ITEM: usize = 2;

/// Position of the writer in the file hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Closed,
    FileOpen,
    CashLetterOpen,
    BundleOpen,
    FileClosed,
    Failed,
}

impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            WriterState::Closed => "no file is open",
            WriterState::FileOpen => "a file is open with no cash letter",
            WriterState::CashLetterOpen => "a cash letter is open with no bundle",
            WriterState::BundleOpen => "a bundle is open",
            WriterState::FileClosed => "the file is closed",
            WriterState::Failed => "the writer has failed",
        };
        f.write_str(text)
    }
}

/// Result of a completed file
#[derive(Debug, Clone, PartialEq)]
pub struct WriteSummary {
    /// File-level totals as accumulated
    pub totals: Totals,
    /// Records emitted, including the file control record
    pub record_count: u64,
    pub diagnostics: Diagnostics,
}

/// Writes one exchange file through a record sink
pub struct X9Writer<S: RecordSink> {
    sink: S,
    config: Arc<WriterConfig>,
    state: WriterState,
    totals: Accumulators,
    diagnostics: Diagnostics,
    next_item_sequence: ItemSequence,
    cash_letter_counter: u64,
    bundle_counter: u64,
    bundle_sequence: u16,
    items_in_bundle: usize,
    bundle: Option<BundleHeader>,
}

impl<S: RecordSink> X9Writer<S> {
    /// Create a writer bound to a configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is inconsistent.
    pub fn new(sink: S, config: Arc<WriterConfig>) -> Result<Self, X9Error> {
        config.validate()?;
        let next_item_sequence = config.item_sequence_start;
        Ok(X9Writer {
            sink,
            config,
            state: WriterState::Closed,
            totals: Accumulators::new(),
            diagnostics: Diagnostics::new(),
            next_item_sequence,
            cash_letter_counter: 0,
            bundle_counter: 0,
            bundle_sequence: 0,
            items_in_bundle: 0,
            bundle: None,
        })
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Diagnostics collected so far
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Whether the open bundle holds the configured maximum number of items
    pub fn is_bundle_cutoff_reached(&self) -> bool {
        self.state == WriterState::BundleOpen
            && self
                .config
                .max_items_per_bundle
                .is_some_and(|max| self.items_in_bundle >= max)
    }

    /// Items written into the open bundle
    pub fn items_in_bundle(&self) -> usize {
        self.items_in_bundle
    }

    /// Give back the sink, e.g. to commit its output
    pub fn into_inner(self) -> S {
        self.sink
    }

    /// Run an operation, moving to `Failed` if it errors
    fn guarded<T>(
        &mut self,
        operation: &str,
        allowed: &[WriterState],
        op: impl FnOnce(&mut Self) -> Result<T, X9Error>,
    ) -> Result<T, X9Error> {
        if !allowed.contains(&self.state) {
            let error = X9Error::illegal_sequence(operation, &self.state.to_string());
            self.state = WriterState::Failed;
            return Err(error);
        }
        let result = op(self);
        if result.is_err() {
            self.state = WriterState::Failed;
        }
        result
    }

    fn emit(&mut self, record: &Record) -> Result<(), X9Error> {
        self.sink.emit(record)?;
        self.totals.add_record();
        Ok(())
    }

    /// Begin the file: emits the file header (type 01)
    pub fn open_file(&mut self, header: &FileHeader) -> Result<(), X9Error> {
        self.guarded("open file", &[WriterState::Closed], |w| {
            let mut record = Record::new(RecordType::FileHeader);
            record
                .set("StandardLevel", "03")?
                .set("TestFileIndicator", header.mode.code())?
                .set("ImmediateDestinationRoutingNumber", &header.destination_routing)?
                .set("ImmediateOriginRoutingNumber", &header.origin_routing)?
                .set_date("FileCreationDate", header.creation_date)?
                .set_time("FileCreationTime", header.creation_time)?
                .set("ResendIndicator", if header.resend { "Y" } else { "N" })?
                .set("ImmediateDestinationName", &header.destination_name)?
                .set("ImmediateOriginName", &header.origin_name)?
                .set("FileIdModifier", &header.file_id_modifier)?
                .set("CountryCode", "US")?;
            w.emit(&record)?;
            w.state = WriterState::FileOpen;
            info!(
                destination = %header.destination_routing,
                origin = %header.origin_routing,
                "File opened"
            );
            Ok(())
        })
    }

    /// Begin a cash letter: emits the cash letter header (type 10)
    pub fn open_cash_letter(&mut self, header: &CashLetterHeader) -> Result<(), X9Error> {
        self.guarded("open cash letter", &[WriterState::FileOpen], |w| {
            w.cash_letter_counter += 1;
            let id = header
                .cash_letter_id
                .clone()
                .unwrap_or_else(|| w.cash_letter_counter.to_string());
            let mut record = Record::new(RecordType::CashLetterHeader);
            record
                .set("CollectionTypeIndicator", &header.collection_type)?
                .set("DestinationRoutingNumber", &header.destination_routing)?
                .set("EceInstitutionRoutingNumber", &header.ece_routing)?
                .set_date("CashLetterBusinessDate", header.business_date)?
                .set_date("CashLetterCreationDate", header.creation_date)?
                .set_time("CashLetterCreationTime", header.creation_time)?
                .set("CashLetterRecordTypeIndicator", &header.record_type_indicator)?
                .set("CashLetterDocumentationTypeIndicator", &header.documentation_type)?
                .set("CashLetterId", &id)?
                .set("OriginatorContactName", &header.contact_name)?
                .set("OriginatorContactPhoneNumber", &header.contact_phone)?;
            w.emit(&record)?;
            w.totals.open_cash_letter();
            w.state = WriterState::CashLetterOpen;
            info!(cash_letter_id = %id, "Cash letter opened");
            Ok(())
        })
    }

    /// Begin a bundle: emits the bundle header (type 20)
    pub fn open_bundle(&mut self, header: &BundleHeader) -> Result<(), X9Error> {
        self.guarded("open bundle", &[WriterState::CashLetterOpen], |w| {
            w.bundle_counter += 1;
            w.bundle_sequence = if w.bundle_sequence >= MAX_BUNDLE_SEQUENCE {
                1
            } else {
                w.bundle_sequence + 1
            };
            let id = header
                .bundle_id
                .clone()
                .unwrap_or_else(|| w.bundle_counter.to_string());
            let mut record = Record::new(RecordType::BundleHeader);
            record
                .set("CollectionTypeIndicator", &header.collection_type)?
                .set("DestinationRoutingNumber", &header.destination_routing)?
                .set("EceInstitutionRoutingNumber", &header.ece_routing)?
                .set_date("BundleBusinessDate", header.business_date)?
                .set_date("BundleCreationDate", header.creation_date)?
                .set("BundleId", &id)?
                .set_number("BundleSequenceNumber", u64::from(w.bundle_sequence))?
                .set("CycleNumber", &header.cycle_number)?;
            w.emit(&record)?;
            w.totals.open_bundle();
            w.items_in_bundle = 0;
            w.bundle = Some(header.clone());
            w.state = WriterState::BundleOpen;
            debug!(bundle_id = %id, sequence = w.bundle_sequence, "Bundle opened");
            Ok(())
        })
    }

    fn assign_item_sequence(&mut self) -> ItemSequence {
        let sequence = self.next_item_sequence;
        self.next_item_sequence = if sequence >= self.config.item_sequence_max {
            1
        } else {
            sequence + 1
        };
        sequence
    }

    /// Write one item: check detail (25), its addenda (26/28), and per image 50 + 52
    ///
    /// # Errors
    ///
    /// - `IllegalSequence` if no bundle is open or the bundle cutoff is reached
    /// - `InvalidInputRecord` for a malformed routing number or more than two images
    /// - `FieldOverflow` / `InvalidAmount` for values that do not fit their fields
    pub fn write_item(&mut self, item: &CheckItem) -> Result<ItemSequence, X9Error> {
        if self.is_bundle_cutoff_reached() {
            let state = format!(
                "the bundle cutoff of {} items is reached",
                self.items_in_bundle
            );
            self.state = WriterState::Failed;
            return Err(X9Error::illegal_sequence("write item", &state));
        }
        self.guarded("write item", &[WriterState::BundleOpen], |w| w.write_item_records(item))
    }

    fn write_item_records(&mut self, item: &CheckItem) -> Result<ItemSequence, X9Error> {
        let routing = item.routing.trim();
        if routing.len() != 9 || !routing.bytes().all(|b| b.is_ascii_digit()) {
            return Err(X9Error::invalid_input(
                None,
                format!("payor routing number must be 9 digits, got '{}'", item.routing),
            ));
        }
        if item.images.len() > MAX_IMAGES_PER_ITEM {
            return Err(X9Error::invalid_input(
                None,
                format!("an item carries at most 2 images, got {}", item.images.len()),
            ));
        }

        let sequence = match item.item_sequence {
            Some(sequence) => sequence,
            None => self.assign_item_sequence(),
        };

        let mut detail = Record::new(RecordType::CheckDetail);
        detail
            .set("AuxiliaryOnUs", &item.auxiliary_on_us)?
            .set("ExternalProcessingCode", &item.epc)?
            .set("PayorBankRoutingNumber", &routing[..8])?
            .set("PayorBankCheckDigit", &routing[8..])?
            .set("OnUs", &item.on_us)?
            .set_amount("ItemAmount", item.amount)?
            .set_number("EceInstitutionItemSequenceNumber", sequence)?
            .set("DocumentationTypeIndicator", &item.documentation_type)?
            .set("ReturnAcceptanceIndicator", &item.return_acceptance)?
            .set("MicrValidIndicator", &item.micr_valid)?
            .set("BofdIndicator", &item.bofd_indicator)?
            .set_number("CheckDetailRecordAddendumCount", item.endorsements.len() as u64)?;
        self.emit(&detail)?;

        let mut addendum_a = 0;
        let mut addendum_c = 0;
        for endorsement in &item.endorsements {
            let record = match endorsement.kind {
                EndorsementKind::Bofd => {
                    addendum_a += 1;
                    let mut record = Record::new(RecordType::CheckDetailAddendumA);
                    record
                        .set_number("AddendumRecordNumber", addendum_a)?
                        .set("BofdRoutingNumber", &endorsement.routing)?
                        .set_date("BofdBusinessDate", endorsement.business_date)?
                        .set_number("BofdItemSequenceNumber", endorsement.item_sequence)?
                        .set("DepositAccountNumber", &endorsement.deposit_account)?
                        .set("TruncationIndicator", &endorsement.truncation_indicator)?
                        .set("BofdConversionIndicator", &endorsement.conversion_indicator)?;
                    record
                }
                EndorsementKind::Subsequent => {
                    addendum_c += 1;
                    let mut record = Record::new(RecordType::CheckDetailAddendumC);
                    record
                        .set_number("AddendumRecordNumber", addendum_c)?
                        .set("EndorsingBankRoutingNumber", &endorsement.routing)?
                        .set_date("EndorsingBankEndorsementDate", endorsement.business_date)?
                        .set_number(
                            "EndorsingBankItemSequenceNumber",
                            endorsement.item_sequence,
                        )?
                        .set("TruncationIndicator", &endorsement.truncation_indicator)?
                        .set(
                            "EndorsingBankConversionIndicator",
                            &endorsement.conversion_indicator,
                        )?;
                    record
                }
            };
            self.emit(&record)?;
        }

        let sequence_text = format!("{:015}", sequence);
        for item_image in &item.images {
            let prepared = image::prepare(
                item_image,
                &sequence_text,
                &self.config,
                &mut self.diagnostics,
            );
            let (view_detail, view_data) = self.image_records(item_image, sequence, prepared)?;
            self.emit(&view_detail)?;
            self.emit(&view_data)?;
            self.totals.add_image();
        }

        self.totals.add_item(item.amount, item.is_micr_valid())?;
        self.items_in_bundle += 1;
        debug!(
            item_sequence = sequence,
            amount = %item.amount,
            images = item.images.len(),
            "Item written"
        );
        Ok(sequence)
    }

    fn image_records(
        &self,
        item_image: &ItemImage,
        sequence: ItemSequence,
        prepared: image::PreparedImage,
    ) -> Result<(Record, Record), X9Error> {
        let (ece_routing, business_date) = match &self.bundle {
            Some(bundle) => (bundle.ece_routing.clone(), bundle.business_date),
            None => {
                return Err(X9Error::illegal_sequence(
                    "write image",
                    &WriterState::CashLetterOpen.to_string(),
                ))
            }
        };
        let cycle_number = self
            .bundle
            .as_ref()
            .map(|b| b.cycle_number.clone())
            .unwrap_or_default();

        let mut detail = Record::new(RecordType::ImageViewDetail);
        detail
            .set("ImageIndicator", "1")?
            .set(
                "ImageCreatorRoutingNumber",
                item_image.creator_routing.as_deref().unwrap_or(&ece_routing),
            )?
            .set_date(
                "ImageCreatorDate",
                item_image.creator_date.unwrap_or(business_date),
            )?
            .set("ImageViewFormatIndicator", "00")?
            .set("ImageViewCompressionAlgorithmIdentifier", "00")?
            .set_number("ImageViewDataSize", prepared.declared_size as u64)?
            .set("ViewSideIndicator", item_image.side.code())?
            .set("ViewDescriptor", "00")?
            .set("DigitalSignatureIndicator", "0")?;

        let mut data = Record::new(RecordType::ImageViewData);
        data.set("EceInstitutionRoutingNumber", &ece_routing)?
            .set_date("BundleBusinessDate", business_date)?
            .set("CycleNumber", &cycle_number)?
            .set_number("EceInstitutionItemSequenceNumber", sequence)?
            .set_variable(VariableData {
                image_reference_key: String::new(),
                digital_signature: Vec::new(),
                image_data: prepared.data,
            })?;
        Ok((detail, data))
    }

    /// Close the open bundle with computed trailer totals
    pub fn close_bundle(&mut self) -> Result<(), X9Error> {
        self.close_bundle_with(&TrailerValues::default())
    }

    /// Close the open bundle: emits the bundle control (type 70)
    ///
    /// `supplied` values are validated or overridden per `repair_trailers`.
    pub fn close_bundle_with(&mut self, supplied: &TrailerValues) -> Result<(), X9Error> {
        self.guarded("close bundle", &[WriterState::BundleOpen], |w| {
            let computed = w.totals.bundle().clone();
            w.write_trailer(Level::Bundle, &computed, supplied)?;
            w.totals.close_bundle()?;
            w.bundle = None;
            w.state = WriterState::CashLetterOpen;
            debug!(items = computed.item_count, amount = %computed.amount, "Bundle closed");
            Ok(())
        })
    }

    /// Close the open cash letter with computed trailer totals
    pub fn close_cash_letter(&mut self) -> Result<(), X9Error> {
        self.close_cash_letter_with(&TrailerValues::default())
    }

    /// Close the open cash letter: emits the cash letter control (type 90)
    pub fn close_cash_letter_with(&mut self, supplied: &TrailerValues) -> Result<(), X9Error> {
        self.guarded("close cash letter", &[WriterState::CashLetterOpen], |w| {
            let computed = w.totals.cash_letter().clone();
            w.write_trailer(Level::CashLetter, &computed, supplied)?;
            w.totals.close_cash_letter()?;
            w.state = WriterState::FileOpen;
            info!(
                bundles = computed.bundle_count,
                items = computed.item_count,
                amount = %computed.amount,
                "Cash letter closed"
            );
            Ok(())
        })
    }

    /// Close the file with computed trailer totals
    pub fn close_file(&mut self) -> Result<WriteSummary, X9Error> {
        self.close_file_with(&TrailerValues::default())
    }

    /// Close the file: emits the file control (type 99), flushes, and reports totals
    pub fn close_file_with(&mut self, supplied: &TrailerValues) -> Result<WriteSummary, X9Error> {
        self.guarded("close file", &[WriterState::FileOpen], |w| {
            // The file control counts itself.
            w.totals.add_record();
            let computed = w.totals.file().clone();
            let written = reconcile(
                Level::File,
                &computed,
                supplied,
                w.config.repair_trailers,
                &mut w.diagnostics,
            );
            let record = build_trailer(Level::File, &written)?;
            w.sink.emit(&record)?;
            w.sink.flush()?;
            w.state = WriterState::FileClosed;
            info!(
                records = computed.record_count,
                items = computed.item_count,
                amount = %computed.amount,
                diagnostics = w.diagnostics.len(),
                "File closed"
            );
            Ok(WriteSummary {
                record_count: computed.record_count,
                totals: computed,
                diagnostics: w.diagnostics.clone(),
            })
        })
    }

    fn write_trailer(
        &mut self,
        level: Level,
        computed: &Totals,
        supplied: &TrailerValues,
    ) -> Result<(), X9Error> {
        let written = reconcile(
            level,
            computed,
            supplied,
            self.config.repair_trailers,
            &mut self.diagnostics,
        );
        let record = build_trailer(level, &written)?;
        self.emit(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Endorsement, FileMode, ImageSide, Resolution};
    use chrono::{NaiveDate, NaiveTime};
    use rstest::{fixture, rstest};
    use rust_decimal::Decimal;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn file_header() -> FileHeader {
        FileHeader {
            destination_routing: "011000015".to_string(),
            origin_routing: "121000358".to_string(),
            destination_name: "FED RESERVE".to_string(),
            origin_name: "FIRST BANK".to_string(),
            creation_date: date(),
            creation_time: NaiveTime::from_hms_opt(8, 15, 0).unwrap(),
            resend: false,
            mode: FileMode::Test,
            file_id_modifier: "A".to_string(),
        }
    }

    fn cash_letter_header() -> CashLetterHeader {
        CashLetterHeader {
            collection_type: "01".to_string(),
            destination_routing: "011000015".to_string(),
            ece_routing: "121000358".to_string(),
            business_date: date(),
            creation_date: date(),
            creation_time: NaiveTime::from_hms_opt(8, 15, 0).unwrap(),
            record_type_indicator: "I".to_string(),
            documentation_type: "G".to_string(),
            cash_letter_id: None,
            contact_name: String::new(),
            contact_phone: String::new(),
        }
    }

    fn item(cents: i64) -> CheckItem {
        CheckItem::new("011000015", "123456789/1001", Decimal::new(cents, 2))
    }

    fn writer_with(config: WriterConfig) -> X9Writer<Vec<Record>> {
        X9Writer::new(Vec::new(), Arc::new(config)).unwrap()
    }

    #[fixture]
    fn open_writer() -> X9Writer<Vec<Record>> {
        let mut writer = writer_with(WriterConfig::default());
        writer.open_file(&file_header()).unwrap();
        writer.open_cash_letter(&cash_letter_header()).unwrap();
        writer
            .open_bundle(&BundleHeader::from_cash_letter(&cash_letter_header()))
            .unwrap();
        writer
    }

    fn types(records: &[Record]) -> Vec<&'static str> {
        records.iter().map(|r| r.record_type().code()).collect()
    }

    #[rstest]
    fn test_minimal_file_structure(mut open_writer: X9Writer<Vec<Record>>) {
        open_writer.write_item(&item(1000)).unwrap();
        open_writer.close_bundle().unwrap();
        open_writer.close_cash_letter().unwrap();
        let summary = open_writer.close_file().unwrap();
        let records = open_writer.into_inner();

        assert_eq!(types(&records), ["01", "10", "20", "25", "70", "90", "99"]);
        assert_eq!(summary.record_count, 7);
        assert_eq!(summary.totals.item_count, 1);
        assert!(summary.diagnostics.is_empty());
        let file_control = records.last().unwrap();
        assert_eq!(file_control.number("TotalRecordCount").unwrap(), 7);
        assert_eq!(file_control.number("CashLetterCount").unwrap(), 1);
    }

    #[rstest]
    fn test_assigned_identifiers(mut open_writer: X9Writer<Vec<Record>>) {
        let first = open_writer.write_item(&item(100)).unwrap();
        let second = open_writer.write_item(&item(100)).unwrap();
        assert_eq!((first, second), (1, 2));

        let records = open_writer.into_inner();
        assert_eq!(records[1].text("CashLetterId"), "1");
        assert_eq!(records[2].text("BundleId"), "1");
        assert_eq!(records[2].number("BundleSequenceNumber").unwrap(), 1);
        assert_eq!(records[3].text("PayorBankRoutingNumber"), "01100001");
        assert_eq!(records[3].text("PayorBankCheckDigit"), "5");
    }

    #[test]
    fn test_item_sequence_wraps_to_one() {
        let config = WriterConfig {
            item_sequence_start: 2,
            item_sequence_max: 3,
            ..WriterConfig::default()
        };
        let mut writer = writer_with(config);
        writer.open_file(&file_header()).unwrap();
        writer.open_cash_letter(&cash_letter_header()).unwrap();
        writer
            .open_bundle(&BundleHeader::from_cash_letter(&cash_letter_header()))
            .unwrap();
        let sequences: Vec<_> = (0..4).map(|_| writer.write_item(&item(1)).unwrap()).collect();
        assert_eq!(sequences, vec![2, 3, 1, 2]);
    }

    #[rstest]
    fn test_caller_sequence_is_kept(mut open_writer: X9Writer<Vec<Record>>) {
        let mut check = item(1);
        check.item_sequence = Some(777);
        assert_eq!(open_writer.write_item(&check).unwrap(), 777);
        assert_eq!(open_writer.write_item(&item(1)).unwrap(), 1);
    }

    #[test]
    fn test_bundle_cutoff() {
        let config = WriterConfig {
            max_items_per_bundle: Some(2),
            ..WriterConfig::default()
        };
        let mut writer = writer_with(config);
        writer.open_file(&file_header()).unwrap();
        writer.open_cash_letter(&cash_letter_header()).unwrap();
        writer
            .open_bundle(&BundleHeader::from_cash_letter(&cash_letter_header()))
            .unwrap();
        writer.write_item(&item(1)).unwrap();
        assert!(!writer.is_bundle_cutoff_reached());
        writer.write_item(&item(1)).unwrap();
        assert!(writer.is_bundle_cutoff_reached());

        let result = writer.write_item(&item(1));
        assert!(matches!(result, Err(X9Error::IllegalSequence { .. })));
        assert_eq!(writer.state(), WriterState::Failed);
        assert!(writer.close_bundle().is_err());
    }

    #[rstest]
    #[case::item_before_bundle(WriterState::CashLetterOpen)]
    #[case::item_before_cash_letter(WriterState::FileOpen)]
    #[case::item_before_file(WriterState::Closed)]
    fn test_write_item_requires_open_bundle(#[case] reach: WriterState) {
        let mut writer = writer_with(WriterConfig::default());
        if reach != WriterState::Closed {
            writer.open_file(&file_header()).unwrap();
        }
        if reach == WriterState::CashLetterOpen {
            writer.open_cash_letter(&cash_letter_header()).unwrap();
        }
        let result = writer.write_item(&item(1));
        assert!(matches!(result, Err(X9Error::IllegalSequence { .. })));
        assert_eq!(writer.state(), WriterState::Failed);
    }

    #[test]
    fn test_close_file_with_open_cash_letter_fails() {
        let mut writer = writer_with(WriterConfig::default());
        writer.open_file(&file_header()).unwrap();
        writer.open_cash_letter(&cash_letter_header()).unwrap();
        let error = writer.close_file().unwrap_err();
        assert_eq!(
            error.to_string(),
            "Illegal sequence: cannot close file while a cash letter is open with no bundle"
        );
    }

    #[test]
    fn test_reopen_after_close_fails() {
        let mut writer = writer_with(WriterConfig::default());
        writer.open_file(&file_header()).unwrap();
        writer.close_file().unwrap();
        assert_eq!(writer.state(), WriterState::FileClosed);
        assert!(writer.open_file(&file_header()).is_err());
    }

    #[test]
    fn test_empty_bundle_and_cash_letter_are_legal() {
        let mut writer = writer_with(WriterConfig::default());
        writer.open_file(&file_header()).unwrap();
        writer.open_cash_letter(&cash_letter_header()).unwrap();
        writer
            .open_bundle(&BundleHeader::from_cash_letter(&cash_letter_header()))
            .unwrap();
        writer.close_bundle().unwrap();
        writer.close_cash_letter().unwrap();
        writer.open_cash_letter(&cash_letter_header()).unwrap();
        writer.close_cash_letter().unwrap();
        let summary = writer.close_file().unwrap();
        assert_eq!(summary.totals.cash_letter_count, 2);
        assert_eq!(summary.totals.item_count, 0);

        let records = writer.into_inner();
        assert_eq!(records[3].number("ItemsWithinBundleCount").unwrap(), 0);
        assert_eq!(records[5].text("CashLetterId"), "2");
    }

    #[test]
    fn test_bundle_sequence_wraps() {
        let mut writer = writer_with(WriterConfig::default());
        writer.open_file(&file_header()).unwrap();
        writer.open_cash_letter(&cash_letter_header()).unwrap();
        writer.bundle_sequence = MAX_BUNDLE_SEQUENCE;
        writer
            .open_bundle(&BundleHeader::from_cash_letter(&cash_letter_header()))
            .unwrap();
        let records = writer.into_inner();
        assert_eq!(records[2].number("BundleSequenceNumber").unwrap(), 1);
    }

    #[rstest]
    #[case::repair(true, 1, 1)]
    #[case::validate(false, 5, 1)]
    fn test_supplied_bundle_trailer(
        #[case] repair: bool,
        #[case] written_count: u64,
        #[case] mismatches: usize,
    ) {
        let config = WriterConfig {
            repair_trailers: repair,
            ..WriterConfig::default()
        };
        let mut writer = writer_with(config);
        writer.open_file(&file_header()).unwrap();
        writer.open_cash_letter(&cash_letter_header()).unwrap();
        writer
            .open_bundle(&BundleHeader::from_cash_letter(&cash_letter_header()))
            .unwrap();
        writer.write_item(&item(1000)).unwrap();
        let supplied = TrailerValues {
            item_count: Some(5),
            ..TrailerValues::default()
        };
        writer.close_bundle_with(&supplied).unwrap();
        assert_eq!(
            writer
                .diagnostics()
                .count_where(|e| matches!(e, X9Error::TrailerMismatch { .. })),
            mismatches
        );
        let records = writer.into_inner();
        let control = records.last().unwrap();
        assert_eq!(
            control.number("ItemsWithinBundleCount").unwrap(),
            written_count
        );
    }

    #[rstest]
    fn test_micr_valid_amount_excludes_bad_reads(mut open_writer: X9Writer<Vec<Record>>) {
        open_writer.write_item(&item(1000)).unwrap();
        let mut bad = item(500);
        bad.micr_valid = "0".to_string();
        open_writer.write_item(&bad).unwrap();
        open_writer.close_bundle().unwrap();
        let records = open_writer.into_inner();
        let control = records.last().unwrap();
        assert_eq!(control.amount("BundleTotalAmount").unwrap(), Decimal::new(1500, 2));
        assert_eq!(control.amount("MicrValidTotalAmount").unwrap(), Decimal::new(1000, 2));
    }

    #[rstest]
    fn test_endorsements_and_images(mut open_writer: X9Writer<Vec<Record>>) {
        let mut check = item(1000);
        check.endorsements = vec![
            Endorsement {
                kind: EndorsementKind::Bofd,
                routing: "121000358".to_string(),
                business_date: date(),
                item_sequence: 1,
                deposit_account: "998877".to_string(),
                truncation_indicator: "Y".to_string(),
                conversion_indicator: "2".to_string(),
            },
            Endorsement {
                kind: EndorsementKind::Subsequent,
                routing: "011000015".to_string(),
                business_date: date(),
                item_sequence: 9,
                deposit_account: String::new(),
                truncation_indicator: "N".to_string(),
                conversion_indicator: String::new(),
            },
        ];
        check.images = vec![
            ItemImage::new(ImageSide::Front, vec![1; 10]),
            ItemImage::new(ImageSide::Back, vec![2; 12]),
        ];
        open_writer.write_item(&check).unwrap();
        open_writer.close_bundle().unwrap();
        let records = open_writer.into_inner();

        assert_eq!(
            types(&records[3..]),
            ["25", "26", "28", "50", "52", "50", "52", "70"]
        );
        assert_eq!(records[3].number("CheckDetailRecordAddendumCount").unwrap(), 2);
        assert_eq!(records[5].number("AddendumRecordNumber").unwrap(), 1);
        assert_eq!(records[6].number("ImageViewDataSize").unwrap(), 10);
        assert_eq!(records[8].text("ViewSideIndicator"), "1");
        assert_eq!(records[9].variable().unwrap().image_data, vec![2; 12]);
        assert_eq!(records[10].number("ImagesWithinBundleCount").unwrap(), 2);
    }

    #[rstest]
    fn test_image_size_mismatch_written_through(mut open_writer: X9Writer<Vec<Record>>) {
        let mut check = item(1000);
        let mut front = ItemImage::new(ImageSide::Front, vec![0; 4998]);
        front.declared_size = Some(5000);
        check.images = vec![front];
        open_writer.write_item(&check).unwrap();

        let diagnostics = open_writer.diagnostics().clone();
        assert_eq!(diagnostics.len(), 1);
        let entry = diagnostics.iter().next().unwrap();
        assert!(matches!(
            entry.error,
            X9Error::ImageSizeMismatch {
                declared: 5000,
                actual: 4998,
                ..
            }
        ));
        assert_eq!(entry.resolution, Resolution::Reported);

        let records = open_writer.into_inner();
        assert_eq!(records[4].number("ImageViewDataSize").unwrap(), 5000);
        assert_eq!(records[5].variable().unwrap().image_data.len(), 4998);
    }

    #[rstest]
    #[case::short_routing("01100001")]
    #[case::letters("01100001X")]
    fn test_invalid_routing_fails(mut open_writer: X9Writer<Vec<Record>>, #[case] routing: &str) {
        let mut check = item(1);
        check.routing = routing.to_string();
        assert!(matches!(
            open_writer.write_item(&check),
            Err(X9Error::InvalidInputRecord { .. })
        ));
    }

    #[rstest]
    fn test_amount_overflow_fails(mut open_writer: X9Writer<Vec<Record>>) {
        let check = item(100_000_000_000);
        assert!(matches!(
            open_writer.write_item(&check),
            Err(X9Error::FieldOverflow { .. })
        ));
        assert_eq!(open_writer.state(), WriterState::Failed);
    }
}
