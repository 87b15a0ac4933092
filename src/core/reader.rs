//! Exchange file reading
//!
//! `X9Reader` streams decoded records from a file whose framing and character set are
//! detected from its first bytes. `collect_items` rebuilds check items (endorsements
//! and images included) from a decoded record list.

use crate::codec::{Charset, Framing, Record, RecordReader, RecordType};
use crate::types::{
    CheckItem, Endorsement, EndorsementKind, ImageSide, ItemImage, X9Error,
};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Streaming record reader
pub struct X9Reader<R: Read> {
    records: RecordReader<R>,
}

impl X9Reader<File> {
    /// Open a file and detect its format
    ///
    /// # Errors
    ///
    /// - `FileNotFound` if the path does not exist
    /// - `MalformedRecord` if the format cannot be detected
    pub fn open(path: &Path) -> Result<Self, X9Error> {
        if !path.exists() {
            return Err(X9Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let reader = Self::new(File::open(path)?)?;
        info!(
            path = %path.display(),
            charset = ?reader.charset(),
            framing = ?reader.framing(),
            "Opened exchange file"
        );
        Ok(reader)
    }
}

impl<R: Read> X9Reader<R> {
    /// Wrap an input, detecting framing and character set
    pub fn new(inner: R) -> Result<Self, X9Error> {
        Ok(Self {
            records: RecordReader::detect(inner)?,
        })
    }

    /// Wrap an input with a known format
    pub fn with_format(inner: R, charset: Charset, framing: Framing) -> Self {
        Self {
            records: RecordReader::new(inner, charset, framing),
        }
    }

    pub fn charset(&self) -> Charset {
        self.records.charset()
    }

    pub fn framing(&self) -> Framing {
        self.records.framing()
    }

    /// Decode the remaining records
    ///
    /// # Errors
    ///
    /// Returns the first decoding error; records before it are discarded.
    pub fn read_all(self) -> Result<Vec<Record>, X9Error> {
        let records = self.collect::<Result<Vec<_>, _>>()?;
        debug!(count = records.len(), "Read all records");
        Ok(records)
    }
}

impl<R: Read> Iterator for X9Reader<R> {
    type Item = Result<Record, X9Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next()
    }
}

fn expect_type(record: &Record, expected: RecordType) -> Result<(), X9Error> {
    if record.record_type() != expected {
        return Err(X9Error::malformed(format!(
            "expected a {} record, found record type {}",
            expected.name(),
            record.record_type().code()
        )));
    }
    Ok(())
}

/// Build a check item from a check detail record
///
/// Endorsements and images are not part of the check detail; see `collect_items`.
///
/// # Errors
///
/// Returns `MalformedRecord` for any other record type or a non-numeric amount or
/// sequence number.
pub fn check_item_from_record(record: &Record) -> Result<CheckItem, X9Error> {
    expect_type(record, RecordType::CheckDetail)?;
    let routing = format!(
        "{}{}",
        record.text("PayorBankRoutingNumber"),
        record.text("PayorBankCheckDigit")
    );
    let mut item = CheckItem::new(&routing, record.text("OnUs"), record.amount("ItemAmount")?);
    item.auxiliary_on_us = record.text("AuxiliaryOnUs").to_string();
    item.epc = record.text("ExternalProcessingCode").to_string();
    item.item_sequence = Some(record.number("EceInstitutionItemSequenceNumber")?);
    item.documentation_type = record.text("DocumentationTypeIndicator").to_string();
    item.return_acceptance = record.text("ReturnAcceptanceIndicator").to_string();
    item.micr_valid = record.text("MicrValidIndicator").to_string();
    item.bofd_indicator = record.text("BofdIndicator").to_string();
    Ok(item)
}

fn endorsement_from_record(record: &Record) -> Result<Endorsement, X9Error> {
    let (kind, routing, date, sequence, conversion) = match record.record_type() {
        RecordType::CheckDetailAddendumA => (
            EndorsementKind::Bofd,
            "BofdRoutingNumber",
            "BofdBusinessDate",
            "BofdItemSequenceNumber",
            "BofdConversionIndicator",
        ),
        _ => (
            EndorsementKind::Subsequent,
            "EndorsingBankRoutingNumber",
            "EndorsingBankEndorsementDate",
            "EndorsingBankItemSequenceNumber",
            "EndorsingBankConversionIndicator",
        ),
    };
    let business_date = record.date(date).ok_or_else(|| {
        X9Error::malformed(format!(
            "record type {} has an invalid {}: '{}'",
            record.record_type().code(),
            date,
            record.text(date)
        ))
    })?;
    Ok(Endorsement {
        kind,
        routing: record.text(routing).to_string(),
        business_date,
        item_sequence: record.number(sequence)?,
        deposit_account: record.text("DepositAccountNumber").to_string(),
        truncation_indicator: record.text("TruncationIndicator").to_string(),
        conversion_indicator: record.text(conversion).to_string(),
    })
}

/// Rebuild check items from a decoded record list
///
/// Addenda and image records attach to the most recent check detail.
///
/// # Errors
///
/// Returns `MalformedRecord` when an addendum or image record precedes every check
/// detail, or an image data record has no image view detail.
pub fn collect_items(records: &[Record]) -> Result<Vec<CheckItem>, X9Error> {
    let mut items: Vec<CheckItem> = Vec::new();
    let mut pending_image: Option<ItemImage> = None;

    for record in records {
        let record_type = record.record_type();
        match record_type {
            RecordType::CheckDetail => {
                items.push(check_item_from_record(record)?);
                pending_image = None;
            }
            RecordType::CheckDetailAddendumA
            | RecordType::CheckDetailAddendumC
            | RecordType::ImageViewDetail
            | RecordType::ImageViewData => {
                let item = items.last_mut().ok_or_else(|| {
                    X9Error::malformed(format!(
                        "{} record appears before any check detail",
                        record_type.name()
                    ))
                })?;
                match record_type {
                    RecordType::ImageViewDetail => {
                        let side = ImageSide::from_code(record.text("ViewSideIndicator"))
                            .unwrap_or(ImageSide::Front);
                        let mut image = ItemImage::new(side, Vec::new());
                        image.declared_size = Some(record.number("ImageViewDataSize")? as usize);
                        image.creator_routing =
                            Some(record.text("ImageCreatorRoutingNumber").to_string());
                        image.creator_date = record.date("ImageCreatorDate");
                        pending_image = Some(image);
                    }
                    RecordType::ImageViewData => {
                        let mut image = pending_image.take().ok_or_else(|| {
                            X9Error::malformed("image view data without an image view detail")
                        })?;
                        image.data = record
                            .variable()
                            .map(|v| v.image_data.clone())
                            .unwrap_or_default();
                        item.images.push(image);
                    }
                    _ => item.endorsements.push(endorsement_from_record(record)?),
                }
            }
            _ => pending_image = None,
        }
    }
    debug!(items = items.len(), "Collected check items");
    Ok(items)
}
