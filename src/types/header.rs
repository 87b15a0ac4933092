//! Header attributes for the File → Cash Letter → Bundle hierarchy
//!
//! These are the caller-facing values for the header records (types 01, 10, 20).
//! Identifiers the writer owns (cash letter ID, bundle ID, bundle sequence) are
//! optional here and assigned by the writer when absent.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Test or production file indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileMode {
    /// `T` — test file
    Test,
    /// `P` — production file
    #[default]
    Production,
}

impl FileMode {
    /// Wire code for the test file indicator field
    pub fn code(self) -> &'static str {
        match self {
            FileMode::Test => "T",
            FileMode::Production => "P",
        }
    }
}

/// File header attributes (record type 01)
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    /// Immediate destination routing number (9 digits)
    pub destination_routing: String,
    /// Immediate origin routing number (9 digits)
    pub origin_routing: String,
    /// Immediate destination name
    pub destination_name: String,
    /// Immediate origin name
    pub origin_name: String,
    /// File creation date
    pub creation_date: NaiveDate,
    /// File creation time (hours and minutes are encoded)
    pub creation_time: NaiveTime,
    /// Whether this file is a resend of a previously transmitted file
    pub resend: bool,
    /// Test or production
    pub mode: FileMode,
    /// Distinguishes files with the same date/time/origin/destination
    pub file_id_modifier: String,
}

/// Cash letter header attributes (record type 10)
#[derive(Debug, Clone, PartialEq)]
pub struct CashLetterHeader {
    /// Collection type indicator (e.g. `01` forward presentment)
    pub collection_type: String,
    /// Destination routing number
    pub destination_routing: String,
    /// ECE institution routing number
    pub ece_routing: String,
    /// Cash letter business date
    pub business_date: NaiveDate,
    /// Cash letter creation date
    pub creation_date: NaiveDate,
    /// Cash letter creation time
    pub creation_time: NaiveTime,
    /// Record type indicator (`I` image, `E` electronic, `N` no electronic)
    pub record_type_indicator: String,
    /// Documentation type indicator (`G` image included)
    pub documentation_type: String,
    /// Cash letter ID; assigned by the writer when `None`
    pub cash_letter_id: Option<String>,
    /// Originator contact name
    pub contact_name: String,
    /// Originator contact phone number
    pub contact_phone: String,
}

/// Bundle header attributes (record type 20)
#[derive(Debug, Clone, PartialEq)]
pub struct BundleHeader {
    /// Collection type indicator
    pub collection_type: String,
    /// Destination routing number
    pub destination_routing: String,
    /// ECE institution routing number
    pub ece_routing: String,
    /// Bundle business date
    pub business_date: NaiveDate,
    /// Bundle creation date
    pub creation_date: NaiveDate,
    /// Cycle number
    pub cycle_number: String,
    /// Bundle ID; assigned by the writer when `None`
    pub bundle_id: Option<String>,
}

impl BundleHeader {
    /// Derive a bundle header from the enclosing cash letter header
    pub fn from_cash_letter(cash_letter: &CashLetterHeader) -> Self {
        BundleHeader {
            collection_type: cash_letter.collection_type.clone(),
            destination_routing: cash_letter.destination_routing.clone(),
            ece_routing: cash_letter.ece_routing.clone(),
            business_date: cash_letter.business_date,
            creation_date: cash_letter.creation_date,
            cycle_number: String::new(),
            bundle_id: None,
        }
    }
}
