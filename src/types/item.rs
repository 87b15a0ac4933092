//! Check item types
//!
//! A `CheckItem` is one check: the check detail record (type 25), its endorsement
//! addenda (types 26 and 28), and up to two images (type 50/52 pairs).

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// ECE item sequence number (15 digits on the wire)
pub type ItemSequence = u64;

/// Which side of the check an image shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSide {
    Front,
    Back,
}

impl ImageSide {
    /// View side indicator code for the image view detail record
    pub fn code(self) -> &'static str {
        match self {
            ImageSide::Front => "0",
            ImageSide::Back => "1",
        }
    }

    /// Parse a view side indicator code
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "0" => Some(ImageSide::Front),
            "1" => Some(ImageSide::Back),
            _ => None,
        }
    }
}

/// Kind of endorsement addendum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndorsementKind {
    /// Bank of first deposit endorsement (Check Detail Addendum A, type 26)
    Bofd,
    /// Subsequent endorsement (Check Detail Addendum C, type 28)
    Subsequent,
}

/// An endorsement attached to a check item
#[derive(Debug, Clone, PartialEq)]
pub struct Endorsement {
    /// Addendum kind
    pub kind: EndorsementKind,
    /// Endorsing bank routing number (9 digits)
    pub routing: String,
    /// Business or endorsement date
    pub business_date: NaiveDate,
    /// Endorsing bank's item sequence number
    pub item_sequence: ItemSequence,
    /// Deposit account number at the BOFD (Addendum A only)
    pub deposit_account: String,
    /// Truncation indicator (`Y`/`N`)
    pub truncation_indicator: String,
    /// Conversion indicator (e.g. `2` original paper converted to IRD)
    pub conversion_indicator: String,
}

/// A TIFF image attached to a check item
#[derive(Debug, Clone, PartialEq)]
pub struct ItemImage {
    /// Front or back
    pub side: ImageSide,
    /// TIFF-encoded payload
    pub data: Vec<u8>,
    /// Size declared by the caller for the image view detail record
    ///
    /// When `None` the payload length is used.
    pub declared_size: Option<usize>,
    /// Image creator routing number; defaults to the bundle's ECE routing
    pub creator_routing: Option<String>,
    /// Image creator date; defaults to the bundle business date
    pub creator_date: Option<NaiveDate>,
}

impl ItemImage {
    /// Create an image with no declared size and default creator fields
    pub fn new(side: ImageSide, data: Vec<u8>) -> Self {
        ItemImage {
            side,
            data,
            declared_size: None,
            creator_routing: None,
            creator_date: None,
        }
    }

    /// The size the image view detail record will declare
    pub fn effective_size(&self) -> usize {
        self.declared_size.unwrap_or(self.data.len())
    }
}

/// One check (record type 25 plus addenda and images)
#[derive(Debug, Clone, PartialEq)]
pub struct CheckItem {
    /// Payor bank routing number, 9 digits (8-digit ID + check digit)
    pub routing: String,
    /// On-us MICR field
    pub on_us: String,
    /// Auxiliary on-us MICR field
    pub auxiliary_on_us: String,
    /// External processing code
    pub epc: String,
    /// Item amount in dollars with at most two fractional digits
    pub amount: Decimal,
    /// ECE item sequence number; assigned by the writer when `None`
    pub item_sequence: Option<ItemSequence>,
    /// Documentation type indicator (`G` image included)
    pub documentation_type: String,
    /// Return acceptance indicator
    pub return_acceptance: String,
    /// MICR valid indicator (`1` = good read)
    pub micr_valid: String,
    /// BOFD indicator (`Y`/`N`/`U`)
    pub bofd_indicator: String,
    /// Endorsement addenda, written in order
    pub endorsements: Vec<Endorsement>,
    /// Front then back image
    pub images: Vec<ItemImage>,
}

impl CheckItem {
    /// Create an item with the indicator fields set to common forward-presentment values
    pub fn new(routing: &str, on_us: &str, amount: Decimal) -> Self {
        CheckItem {
            routing: routing.to_string(),
            on_us: on_us.to_string(),
            auxiliary_on_us: String::new(),
            epc: String::new(),
            amount,
            item_sequence: None,
            documentation_type: "G".to_string(),
            return_acceptance: String::new(),
            micr_valid: "1".to_string(),
            bofd_indicator: "Y".to_string(),
            endorsements: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Whether the MICR line was read successfully
    pub fn is_micr_valid(&self) -> bool {
        self.micr_valid.trim() == "1"
    }

    /// Split the on-us field into account and process control (serial) parts
    ///
    /// On-us fields carry the account and the serial separated by `/`.
    pub fn on_us_parts(&self) -> (String, String) {
        split_on_us(&self.on_us)
    }
}

/// Split an on-us MICR field into (account, process control)
pub fn split_on_us(on_us: &str) -> (String, String) {
    match on_us.split_once('/') {
        Some((account, serial)) => (account.trim().to_string(), serial.trim().to_string()),
        None => (on_us.trim().to_string(), String::new()),
    }
}
