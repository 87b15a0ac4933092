//! ACH transaction input and debit/credit classification

use crate::types::{CheckItem, X9Error};
use rust_decimal::Decimal;

/// Source record type of an X9 check detail
pub const CHECK_DETAIL_RECORD_TYPE: &str = "25";

/// Direction of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryDirection {
    Debit,
    Credit,
}

impl EntryDirection {
    /// Classify a source record type
    ///
    /// Check details (and collections) become debits; anything else is a credit.
    pub fn classify(source_record_type: &str) -> Self {
        if source_record_type.trim() == CHECK_DETAIL_RECORD_TYPE {
            EntryDirection::Debit
        } else {
            EntryDirection::Credit
        }
    }

    /// Checking account transaction code
    pub fn transaction_code(self) -> &'static str {
        match self {
            EntryDirection::Debit => "27",
            EntryDirection::Credit => "22",
        }
    }

    /// Service class code of a batch holding only entries of this direction
    pub fn service_class(self) -> &'static str {
        match self {
            EntryDirection::Debit => "225",
            EntryDirection::Credit => "220",
        }
    }
}

/// One payment to be placed in an ACH batch
#[derive(Debug, Clone, PartialEq)]
pub struct AchTransaction {
    /// Record type the payment originates from (`25` = check detail)
    pub source_record_type: String,
    /// Receiving DFI routing number, 8 digits plus check digit
    pub routing: String,
    /// DFI account number
    pub account: String,
    /// Process control (check serial) split off the on-us field
    pub process_control: String,
    pub amount: Decimal,
    /// Check serial or receiver identification; may be blank
    pub identification: String,
    pub name: String,
    pub discretionary_data: String,
    /// Source item sequence number, as written in the source record
    pub sequence: String,
    /// Payment related information for a `05` addenda
    pub addenda: Option<String>,
    /// Entry class overriding the configured default
    pub entry_class: Option<String>,
}

impl AchTransaction {
    /// Convert an X9 check detail into a debit entry
    ///
    /// The on-us field supplies the account and process control; the auxiliary on-us
    /// field (when present) supplies the check serial.
    pub fn from_check_item(item: &CheckItem) -> Self {
        let (account, process_control) = item.on_us_parts();
        Self {
            source_record_type: CHECK_DETAIL_RECORD_TYPE.to_string(),
            routing: item.routing.trim().to_string(),
            account,
            process_control,
            amount: item.amount,
            identification: item.auxiliary_on_us.trim().to_string(),
            name: String::new(),
            discretionary_data: String::new(),
            sequence: item
                .item_sequence
                .map(|sequence| format!("{:015}", sequence))
                .unwrap_or_default(),
            addenda: None,
            entry_class: None,
        }
    }

    pub fn direction(&self) -> EntryDirection {
        EntryDirection::classify(&self.source_record_type)
    }

    /// Receiving DFI identification (first 8 routing digits) and check digit
    ///
    /// # Errors
    ///
    /// Returns `InvalidInputRecord` unless the routing number is 8 or 9 digits.
    pub fn receiving_dfi(&self) -> Result<(&str, &str), X9Error> {
        let routing = self.routing.trim();
        if !(8..=9).contains(&routing.len()) || !routing.bytes().all(|b| b.is_ascii_digit()) {
            return Err(X9Error::invalid_input(
                None,
                format!("routing number '{}' must be 8 or 9 digits", self.routing),
            ));
        }
        Ok(routing.split_at(8))
    }
}
