//! Static record layouts keyed by record type
//!
//! Field widths follow the ANSI X9.37 / X9.100-187 layouts. Every fixed record is
//! 80 bytes. The image view data record (type 52) has a 101-byte fixed prefix listed
//! here; its length-prefixed variable sections are handled by the codec.

use super::field::{alpha, micr, numeric, FieldSpec};
use crate::types::X9Error;

/// Record types understood by the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    FileHeader,
    CashLetterHeader,
    BundleHeader,
    CheckDetail,
    CheckDetailAddendumA,
    CheckDetailAddendumC,
    ImageViewDetail,
    ImageViewData,
    BundleControl,
    CashLetterControl,
    FileControl,
}

/// Length of every fixed-size record
pub const FIXED_RECORD_LENGTH: usize = 80;

/// Length of the fixed prefix of an image view data record
pub const IMAGE_VIEW_DATA_PREFIX_LENGTH: usize = 101;

impl RecordType {
    pub const ALL: [RecordType; 11] = [
        RecordType::FileHeader,
        RecordType::CashLetterHeader,
        RecordType::BundleHeader,
        RecordType::CheckDetail,
        RecordType::CheckDetailAddendumA,
        RecordType::CheckDetailAddendumC,
        RecordType::ImageViewDetail,
        RecordType::ImageViewData,
        RecordType::BundleControl,
        RecordType::CashLetterControl,
        RecordType::FileControl,
    ];

    /// Two-digit wire code
    pub fn code(self) -> &'static str {
        match self {
            RecordType::FileHeader => "01",
            RecordType::CashLetterHeader => "10",
            RecordType::BundleHeader => "20",
            RecordType::CheckDetail => "25",
            RecordType::CheckDetailAddendumA => "26",
            RecordType::CheckDetailAddendumC => "28",
            RecordType::ImageViewDetail => "50",
            RecordType::ImageViewData => "52",
            RecordType::BundleControl => "70",
            RecordType::CashLetterControl => "90",
            RecordType::FileControl => "99",
        }
    }

    /// Look up a record type by its two-digit code
    pub fn from_code(code: &str) -> Result<Self, X9Error> {
        RecordType::ALL
            .into_iter()
            .find(|rt| rt.code() == code)
            .ok_or_else(|| X9Error::malformed(format!("unknown record type '{}'", code)))
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            RecordType::FileHeader => "File Header",
            RecordType::CashLetterHeader => "Cash Letter Header",
            RecordType::BundleHeader => "Bundle Header",
            RecordType::CheckDetail => "Check Detail",
            RecordType::CheckDetailAddendumA => "Check Detail Addendum A",
            RecordType::CheckDetailAddendumC => "Check Detail Addendum C",
            RecordType::ImageViewDetail => "Image View Detail",
            RecordType::ImageViewData => "Image View Data",
            RecordType::BundleControl => "Bundle Control",
            RecordType::CashLetterControl => "Cash Letter Control",
            RecordType::FileControl => "File Control",
        }
    }

    /// Whether the record carries length-prefixed variable sections
    pub fn is_variable(self) -> bool {
        self == RecordType::ImageViewData
    }

    /// Length of the positional part of the record
    pub fn fixed_length(self) -> usize {
        if self.is_variable() {
            IMAGE_VIEW_DATA_PREFIX_LENGTH
        } else {
            FIXED_RECORD_LENGTH
        }
    }

    /// Field table for this record type
    pub fn layout(self) -> &'static [FieldSpec] {
        match self {
            RecordType::FileHeader => FILE_HEADER,
            RecordType::CashLetterHeader => CASH_LETTER_HEADER,
            RecordType::BundleHeader => BUNDLE_HEADER,
            RecordType::CheckDetail => CHECK_DETAIL,
            RecordType::CheckDetailAddendumA => CHECK_DETAIL_ADDENDUM_A,
            RecordType::CheckDetailAddendumC => CHECK_DETAIL_ADDENDUM_C,
            RecordType::ImageViewDetail => IMAGE_VIEW_DETAIL,
            RecordType::ImageViewData => IMAGE_VIEW_DATA,
            RecordType::BundleControl => BUNDLE_CONTROL,
            RecordType::CashLetterControl => CASH_LETTER_CONTROL,
            RecordType::FileControl => FILE_CONTROL,
        }
    }

    /// Index of a named field in the layout
    pub fn field_index(self, name: &str) -> Option<usize> {
        self.layout().iter().position(|spec| spec.name == name)
    }
}

static FILE_HEADER: &[FieldSpec] = &[
    numeric("RecordType", 2),
    numeric("StandardLevel", 2),
    alpha("TestFileIndicator", 1),
    numeric("ImmediateDestinationRoutingNumber", 9),
    numeric("ImmediateOriginRoutingNumber", 9),
    numeric("FileCreationDate", 8),
    numeric("FileCreationTime", 4),
    alpha("ResendIndicator", 1),
    alpha("ImmediateDestinationName", 18),
    alpha("ImmediateOriginName", 18),
    alpha("FileIdModifier", 1),
    alpha("CountryCode", 2),
    alpha("UserField", 4),
    alpha("Reserved", 1),
];

static CASH_LETTER_HEADER: &[FieldSpec] = &[
    numeric("RecordType", 2),
    numeric("CollectionTypeIndicator", 2),
    numeric("DestinationRoutingNumber", 9),
    numeric("EceInstitutionRoutingNumber", 9),
    numeric("CashLetterBusinessDate", 8),
    numeric("CashLetterCreationDate", 8),
    numeric("CashLetterCreationTime", 4),
    alpha("CashLetterRecordTypeIndicator", 1),
    alpha("CashLetterDocumentationTypeIndicator", 1),
    alpha("CashLetterId", 8),
    alpha("OriginatorContactName", 14),
    alpha("OriginatorContactPhoneNumber", 10),
    alpha("FedWorkType", 1),
    alpha("UserField", 2),
    alpha("Reserved", 1),
];

static BUNDLE_HEADER: &[FieldSpec] = &[
    numeric("RecordType", 2),
    numeric("CollectionTypeIndicator", 2),
    numeric("DestinationRoutingNumber", 9),
    numeric("EceInstitutionRoutingNumber", 9),
    numeric("BundleBusinessDate", 8),
    numeric("BundleCreationDate", 8),
    alpha("BundleId", 10),
    numeric("BundleSequenceNumber", 4),
    alpha("CycleNumber", 2),
    alpha("Reserved1", 9),
    alpha("UserField", 5),
    alpha("Reserved2", 12),
];

static CHECK_DETAIL: &[FieldSpec] = &[
    numeric("RecordType", 2),
    micr("AuxiliaryOnUs", 15),
    alpha("ExternalProcessingCode", 1),
    numeric("PayorBankRoutingNumber", 8),
    numeric("PayorBankCheckDigit", 1),
    micr("OnUs", 20),
    numeric("ItemAmount", 10),
    numeric("EceInstitutionItemSequenceNumber", 15),
    alpha("DocumentationTypeIndicator", 1),
    alpha("ReturnAcceptanceIndicator", 1),
    alpha("MicrValidIndicator", 1),
    alpha("BofdIndicator", 1),
    numeric("CheckDetailRecordAddendumCount", 2),
    alpha("CorrectionIndicator", 1),
    alpha("ArchiveTypeIndicator", 1),
];

static CHECK_DETAIL_ADDENDUM_A: &[FieldSpec] = &[
    numeric("RecordType", 2),
    numeric("AddendumRecordNumber", 1),
    numeric("BofdRoutingNumber", 9),
    numeric("BofdBusinessDate", 8),
    numeric("BofdItemSequenceNumber", 15),
    alpha("DepositAccountNumber", 18),
    alpha("BofdDepositBranch", 5),
    alpha("PayeeName", 15),
    alpha("TruncationIndicator", 1),
    alpha("BofdConversionIndicator", 1),
    alpha("BofdCorrectionIndicator", 1),
    alpha("UserField", 1),
    alpha("Reserved", 3),
];

static CHECK_DETAIL_ADDENDUM_C: &[FieldSpec] = &[
    numeric("RecordType", 2),
    numeric("AddendumRecordNumber", 2),
    numeric("EndorsingBankRoutingNumber", 9),
    numeric("EndorsingBankEndorsementDate", 8),
    numeric("EndorsingBankItemSequenceNumber", 15),
    alpha("TruncationIndicator", 1),
    alpha("EndorsingBankConversionIndicator", 1),
    alpha("EndorsingBankCorrectionIndicator", 1),
    alpha("ReturnReason", 1),
    alpha("UserField", 19),
    alpha("EndorsingBankIdentifier", 1),
    alpha("Reserved", 20),
];

static IMAGE_VIEW_DETAIL: &[FieldSpec] = &[
    numeric("RecordType", 2),
    numeric("ImageIndicator", 1),
    numeric("ImageCreatorRoutingNumber", 9),
    numeric("ImageCreatorDate", 8),
    numeric("ImageViewFormatIndicator", 2),
    numeric("ImageViewCompressionAlgorithmIdentifier", 2),
    numeric("ImageViewDataSize", 7),
    numeric("ViewSideIndicator", 1),
    numeric("ViewDescriptor", 2),
    numeric("DigitalSignatureIndicator", 1),
    numeric("DigitalSignatureMethod", 2),
    numeric("SecurityKeySize", 5),
    numeric("StartOfProtectedData", 7),
    numeric("LengthOfProtectedData", 7),
    alpha("ImageRecreateIndicator", 1),
    alpha("UserField", 8),
    alpha("Reserved", 15),
];

static IMAGE_VIEW_DATA: &[FieldSpec] = &[
    numeric("RecordType", 2),
    numeric("EceInstitutionRoutingNumber", 9),
    numeric("BundleBusinessDate", 8),
    alpha("CycleNumber", 2),
    numeric("EceInstitutionItemSequenceNumber", 15),
    alpha("SecurityOriginatorName", 16),
    alpha("SecurityAuthenticatorName", 16),
    alpha("SecurityKeyName", 16),
    alpha("ClippingOrigin", 1),
    alpha("ClippingCoordinateH1", 4),
    alpha("ClippingCoordinateH2", 4),
    alpha("ClippingCoordinateV1", 4),
    alpha("ClippingCoordinateV2", 4),
];

static BUNDLE_CONTROL: &[FieldSpec] = &[
    numeric("RecordType", 2),
    numeric("ItemsWithinBundleCount", 4),
    numeric("BundleTotalAmount", 12),
    numeric("MicrValidTotalAmount", 12),
    numeric("ImagesWithinBundleCount", 5),
    alpha("UserField", 20),
    alpha("Reserved", 25),
];

static CASH_LETTER_CONTROL: &[FieldSpec] = &[
    numeric("RecordType", 2),
    numeric("BundleCount", 6),
    numeric("ItemsWithinCashLetterCount", 8),
    numeric("CashLetterTotalAmount", 14),
    numeric("ImagesWithinCashLetterCount", 9),
    alpha("EceInstitutionName", 18),
    numeric("SettlementDate", 8),
    alpha("Reserved", 15),
];

static FILE_CONTROL: &[FieldSpec] = &[
    numeric("RecordType", 2),
    numeric("CashLetterCount", 6),
    numeric("TotalRecordCount", 8),
    numeric("TotalItemCount", 8),
    numeric("FileTotalAmount", 16),
    alpha("ImmediateOriginContactName", 14),
    alpha("ImmediateOriginContactPhoneNumber", 10),
    alpha("Reserved", 16),
];
