//! Configuration
//!
//! All behavior switches are resolved into immutable values before any writer or
//! assembler is constructed. A writer binds to one `WriterConfig` for its whole
//! lifetime; files processed in parallel share the same value behind an `Arc`.
//!
//! # File Format
//!
//! Settings load from a TOML file. Every table and every key is optional:
//!
//! ```toml
//! [writer]
//! charset = "ebcdic"
//! framing = "length-prefixed"
//! repair_trailers = true
//! max_items_per_bundle = 300
//!
//! [file]
//! destination_routing = "011000015"
//! origin_routing = "121000358"
//!
//! [ach]
//! originating_dfi = "12100035"
//! entry_class = "ARC"
//!
//! [images]
//! min_width_inches = 5.5
//! target_dpi = 200
//! ```

use crate::codec::{Charset, Framing};
use crate::types::{BundleHeader, CashLetterHeader, FileHeader, FileMode, X9Error};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Largest ECE item sequence number representable in the 15-digit field
pub const MAX_ITEM_SEQUENCE: u64 = 999_999_999_999_999;

fn default_true() -> bool {
    true
}

fn default_item_sequence_start() -> u64 {
    1
}

fn default_item_sequence_max() -> u64 {
    MAX_ITEM_SEQUENCE
}

/// Writer behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Character set of text fields
    pub charset: Charset,

    /// Record delimiting
    pub framing: Framing,

    /// Compute trailer fields from the accumulators instead of validating supplied ones
    #[serde(default = "default_true")]
    pub repair_trailers: bool,

    /// Correct image size fields and attempt to repair non-conforming images
    pub repair_images: bool,

    /// Items per bundle before the bundle must be closed; unbounded when absent
    pub max_items_per_bundle: Option<usize>,

    /// First automatically assigned ECE item sequence number
    #[serde(default = "default_item_sequence_start")]
    pub item_sequence_start: u64,

    /// Automatically assigned sequence numbers wrap back to 1 after this value
    #[serde(default = "default_item_sequence_max")]
    pub item_sequence_max: u64,

    /// Image requirements checked for every attached image; no checks when absent
    #[serde(skip)]
    pub image_requirements: Option<ImageRequirements>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            charset: Charset::default(),
            framing: Framing::default(),
            repair_trailers: true,
            repair_images: false,
            max_items_per_bundle: None,
            item_sequence_start: default_item_sequence_start(),
            item_sequence_max: default_item_sequence_max(),
            image_requirements: None,
        }
    }
}

impl WriterConfig {
    /// Check the internal consistency of the values
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a zero bundle size, a zero sequence start, or a sequence
    /// range that does not fit the 15-digit field.
    pub fn validate(&self) -> Result<(), X9Error> {
        if self.max_items_per_bundle == Some(0) {
            return Err(X9Error::config("max_items_per_bundle must be at least 1"));
        }
        if self.item_sequence_start == 0 {
            return Err(X9Error::config("item_sequence_start must be at least 1"));
        }
        if self.item_sequence_max > MAX_ITEM_SEQUENCE {
            return Err(X9Error::config(format!(
                "item_sequence_max must not exceed {}",
                MAX_ITEM_SEQUENCE
            )));
        }
        if self.item_sequence_start > self.item_sequence_max {
            return Err(X9Error::config(
                "item_sequence_start must not exceed item_sequence_max",
            ));
        }
        Ok(())
    }
}

/// Default header values for generated files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHeaderDefaults {
    pub destination_routing: String,
    pub origin_routing: String,
    pub destination_name: String,
    pub origin_name: String,
    pub mode: FileMode,
    pub file_id_modifier: String,
    pub collection_type: String,
    pub record_type_indicator: String,
    pub documentation_type: String,
    pub cycle_number: String,
    pub contact_name: String,
    pub contact_phone: String,
    /// Business date of the cash letter; the creation date when absent
    pub business_date: Option<NaiveDate>,
}

impl Default for FileHeaderDefaults {
    fn default() -> Self {
        Self {
            destination_routing: "011000015".to_string(),
            origin_routing: "011000015".to_string(),
            destination_name: String::new(),
            origin_name: String::new(),
            mode: FileMode::Test,
            file_id_modifier: "A".to_string(),
            collection_type: "01".to_string(),
            record_type_indicator: "I".to_string(),
            documentation_type: "G".to_string(),
            cycle_number: "01".to_string(),
            contact_name: String::new(),
            contact_phone: String::new(),
            business_date: None,
        }
    }
}

impl FileHeaderDefaults {
    pub fn file_header(&self, now: NaiveDateTime) -> FileHeader {
        FileHeader {
            destination_routing: self.destination_routing.clone(),
            origin_routing: self.origin_routing.clone(),
            destination_name: self.destination_name.clone(),
            origin_name: self.origin_name.clone(),
            creation_date: now.date(),
            creation_time: now.time(),
            resend: false,
            mode: self.mode,
            file_id_modifier: self.file_id_modifier.clone(),
        }
    }

    pub fn cash_letter_header(&self, now: NaiveDateTime) -> CashLetterHeader {
        CashLetterHeader {
            collection_type: self.collection_type.clone(),
            destination_routing: self.destination_routing.clone(),
            ece_routing: self.origin_routing.clone(),
            business_date: self.business_date.unwrap_or(now.date()),
            creation_date: now.date(),
            creation_time: now.time(),
            record_type_indicator: self.record_type_indicator.clone(),
            documentation_type: self.documentation_type.clone(),
            cash_letter_id: None,
            contact_name: self.contact_name.clone(),
            contact_phone: self.contact_phone.clone(),
        }
    }

    pub fn bundle_header(&self, now: NaiveDateTime) -> BundleHeader {
        let mut bundle = BundleHeader::from_cash_letter(&self.cash_letter_header(now));
        bundle.cycle_number = self.cycle_number.clone();
        bundle
    }
}

fn default_trace_start() -> u32 {
    1
}

/// ACH file and batch header values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AchConfig {
    /// Immediate destination routing number (9 digits)
    pub immediate_destination: String,
    /// Immediate origin (10 characters, usually a routing number or company ID)
    pub immediate_origin: String,
    pub destination_name: String,
    pub origin_name: String,
    /// Originating DFI identification (8 digits), prefix of every trace number
    pub originating_dfi: String,
    pub company_name: String,
    pub company_id: String,
    pub company_entry_description: String,
    /// Standard entry class used for transactions that do not carry one
    pub entry_class: String,
    /// First trace sequence number of every batch
    #[serde(default = "default_trace_start")]
    pub trace_start: u32,
    pub file_id_modifier: String,
    /// Effective entry date; the file creation date when absent
    pub effective_date: Option<NaiveDate>,
}

impl Default for AchConfig {
    fn default() -> Self {
        Self {
            immediate_destination: "011000015".to_string(),
            immediate_origin: "011000015".to_string(),
            destination_name: String::new(),
            origin_name: String::new(),
            originating_dfi: "01100001".to_string(),
            company_name: String::new(),
            company_id: String::new(),
            company_entry_description: "CHECK PMT".to_string(),
            entry_class: "ARC".to_string(),
            trace_start: default_trace_start(),
            file_id_modifier: "A".to_string(),
            effective_date: None,
        }
    }
}

impl AchConfig {
    /// # Errors
    ///
    /// Returns `ConfigError` when the originating DFI is not 8 digits or the trace start
    /// does not fit the 7-digit trace sequence.
    pub fn validate(&self) -> Result<(), X9Error> {
        if self.originating_dfi.len() != 8
            || !self.originating_dfi.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(X9Error::config(format!(
                "originating_dfi must be 8 digits, got '{}'",
                self.originating_dfi
            )));
        }
        if self.trace_start > 9_999_999 {
            return Err(X9Error::config("trace_start must fit in 7 digits"));
        }
        Ok(())
    }
}

fn default_allowed_compressions() -> Vec<u16> {
    // 1 = uncompressed, 4 = CCITT Group 4
    vec![1, 4]
}

fn default_allowed_dpi() -> Vec<u32> {
    vec![200, 240]
}

/// Constraints every attached image must satisfy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageRequirements {
    pub min_width_inches: f64,
    pub max_width_inches: f64,
    pub min_height_inches: f64,
    pub max_height_inches: f64,
    /// Only 1-bit, single-sample images are accepted
    pub require_bitonal: bool,
    /// TIFF compression tag values accepted as-is
    #[serde(default = "default_allowed_compressions")]
    pub allowed_compressions: Vec<u16>,
    /// Resolutions accepted as-is
    #[serde(default = "default_allowed_dpi")]
    pub allowed_dpi: Vec<u32>,
    /// Resolution of repaired images
    pub target_dpi: u32,
}

impl Default for ImageRequirements {
    fn default() -> Self {
        Self {
            min_width_inches: 5.5,
            max_width_inches: 9.25,
            min_height_inches: 2.5,
            max_height_inches: 4.25,
            require_bitonal: true,
            allowed_compressions: default_allowed_compressions(),
            allowed_dpi: default_allowed_dpi(),
            target_dpi: 200,
        }
    }
}

impl ImageRequirements {
    /// # Errors
    ///
    /// Returns `ConfigError` for an empty or inverted size range or a zero target DPI.
    pub fn validate(&self) -> Result<(), X9Error> {
        let ranges = [
            ("width", self.min_width_inches, self.max_width_inches),
            ("height", self.min_height_inches, self.max_height_inches),
        ];
        for (what, min, max) in ranges {
            if !(min > 0.0 && min <= max) {
                return Err(X9Error::config(format!(
                    "image {} range {}..{} inches is invalid",
                    what, min, max
                )));
            }
        }
        if self.target_dpi == 0 {
            return Err(X9Error::config("target_dpi must be positive"));
        }
        Ok(())
    }
}

/// Everything a run of the toolkit can be configured with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub writer: WriterConfig,
    pub file: FileHeaderDefaults,
    pub ach: AchConfig,
    pub images: Option<ImageRequirements>,
}

impl Settings {
    /// Load settings from a TOML file
    ///
    /// # Errors
    ///
    /// - `FileNotFound` if the file does not exist
    /// - `ConfigError` if it cannot be parsed or holds inconsistent values
    pub fn load(path: &Path) -> Result<Self, X9Error> {
        if !path.exists() {
            return Err(X9Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_toml(&content).map_err(|e| match e {
            X9Error::ConfigError { message } => {
                X9Error::config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })?;
        debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self, X9Error> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| X9Error::config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a file when a path is given, or use the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, X9Error> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), X9Error> {
        self.writer.validate()?;
        self.ach.validate()?;
        if let Some(images) = &self.images {
            images.validate()?;
        }
        Ok(())
    }

    /// The writer configuration with the image requirements attached
    pub fn writer_config(&self) -> WriterConfig {
        WriterConfig {
            image_requirements: self.images.clone(),
            ..self.writer.clone()
        }
    }
}
