//! Synchronous CSV readers with iterator interfaces
//!
//! Provides streaming iterators over check item rows and ACH transaction rows.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Iterator Interface
//!
//! Both readers implement `Iterator`, yielding `Result<T, X9Error>` for each CSV row:
//!
//! ```no_run
//! use x9_cashletter::io::sync_reader::ItemReader;
//! use std::path::Path;
//!
//! let reader = ItemReader::new(Path::new("items.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(item) => println!("Item for {}", item.routing),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual row errors are yielded as `Err` variants carrying the line number
//! - Callers building an output file stop at the first error; a partial file is
//!   never useful downstream
//!
//! # Memory Efficiency
//!
//! Rows are read one at a time; memory usage is O(1) per row, not O(file_size).

use crate::ach::transaction::AchTransaction;
use crate::io::csv_format::{convert_ach_row, convert_item_record, ItemCsvRecord};
use crate::types::{CheckItem, X9Error};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::path::{Path, PathBuf};

fn open_csv(path: &Path) -> Result<csv::Reader<File>, X9Error> {
    if !path.exists() {
        return Err(X9Error::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let file = File::open(path)?;
    Ok(ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .buffer_capacity(8 * 1024)
        .from_reader(file))
}

fn parse_error(line: Option<u64>, error: csv::Error) -> X9Error {
    X9Error::ParseError {
        line,
        message: error.to_string(),
    }
}

/// Streaming reader over check item rows
///
/// Image paths in the rows are resolved against the CSV file's directory.
#[derive(Debug)]
pub struct ItemReader {
    reader: csv::Reader<File>,
    base_dir: PathBuf,
    line_num: u64,
}

impl ItemReader {
    /// Open an item CSV file
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` or `IoError` if the file cannot be opened.
    pub fn new(path: &Path) -> Result<Self, X9Error> {
        let reader = open_csv(path)?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            reader,
            base_dir,
            line_num: 1,
        })
    }
}

impl Iterator for ItemReader {
    type Item = Result<CheckItem, X9Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<ItemCsvRecord>();
        let result = deserializer.next()?;
        self.line_num += 1;
        let line = Some(self.line_num);
        Some(match result {
            Ok(row) => convert_item_record(row, line, &self.base_dir),
            Err(e) => Err(parse_error(line, e)),
        })
    }
}

/// Streaming reader over 9-column ACH transaction rows
#[derive(Debug)]
pub struct AchReader {
    reader: csv::Reader<File>,
    row: StringRecord,
    line_num: u64,
}

impl AchReader {
    /// Open an ACH transaction CSV file
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` or `IoError` if the file cannot be opened.
    pub fn new(path: &Path) -> Result<Self, X9Error> {
        Ok(Self {
            reader: open_csv(path)?,
            row: StringRecord::new(),
            line_num: 1,
        })
    }
}

impl Iterator for AchReader {
    type Item = Result<AchTransaction, X9Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.row) {
            Ok(false) => None,
            Ok(true) => {
                self.line_num += 1;
                Some(convert_ach_row(&self.row, Some(self.line_num)))
            }
            Err(e) => {
                self.line_num += 1;
                Some(Err(parse_error(Some(self.line_num), e)))
            }
        }
    }
}

/// Read every ACH transaction, stopping at the first bad row
pub fn read_ach_transactions(path: &Path) -> Result<Vec<AchTransaction>, X9Error> {
    AchReader::new(path)?.collect()
}

/// Read every check item, stopping at the first bad row
pub fn read_items(path: &Path) -> Result<Vec<CheckItem>, X9Error> {
    ItemReader::new(path)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ACH_HEADER: &str =
        "transaction_code,routing,account,amount,identification,name,discretionary_data,trace_number,addenda\n";
    const ITEM_HEADER: &str =
        "routing,on_us,auxiliary_on_us,epc,amount,item_sequence,front_image,back_image\n";

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_item_reader_fails_on_missing_file() {
        let result = ItemReader::new(Path::new("nonexistent.csv"));
        assert!(matches!(result, Err(X9Error::FileNotFound { .. })));
    }

    #[test]
    fn test_item_reader_iterates_rows() {
        let csv_content = format!(
            "{}011000015,12345678/1001,,,10.00,,,\n021000021,555/7,99,,2.50,9,,\n",
            ITEM_HEADER
        );
        let file = create_temp_csv(&csv_content);

        let items: Vec<_> = ItemReader::new(file.path()).unwrap().collect();

        assert_eq!(items.len(), 2);
        let second = items[1].as_ref().unwrap();
        assert_eq!(second.amount, Decimal::new(250, 2));
        assert_eq!(second.auxiliary_on_us, "99");
        assert_eq!(second.item_sequence, Some(9));
    }

    #[test]
    fn test_item_reader_includes_line_numbers_in_errors() {
        let csv_content = format!(
            "{}011000015,1/2,,,1.00,,,\n011000015,1/2,,,oops,,,\n",
            ITEM_HEADER
        );
        let file = create_temp_csv(&csv_content);

        let items: Vec<_> = ItemReader::new(file.path()).unwrap().collect();

        assert!(items[0].is_ok());
        assert!(matches!(
            items[1],
            Err(X9Error::InvalidInputRecord { line: Some(3), .. })
        ));
    }

    #[test]
    fn test_item_reader_handles_whitespace() {
        let csv_content = format!("{}  011000015 , 1/2 ,,, 3.00 ,,,\n", ITEM_HEADER);
        let file = create_temp_csv(&csv_content);

        let items = read_items(file.path()).unwrap();

        assert_eq!(items[0].routing, "011000015");
        assert_eq!(items[0].amount, Decimal::new(300, 2));
    }

    #[test]
    fn test_ach_reader_parses_rows() {
        let csv_content = format!(
            "{}25,011000015,12345678/123456,10.00,,JANE DOE,,0000000000000001,\n",
            ACH_HEADER
        );
        let file = create_temp_csv(&csv_content);

        let transactions = read_ach_transactions(file.path()).unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].process_control, "123456");
        assert_eq!(transactions[0].name, "JANE DOE");
    }

    #[test]
    fn test_ach_reader_rejects_wrong_field_count() {
        let csv_content = format!(
            "{}25,011000015,1,10.00,,A,,1,\n25,011000015,1,10.00\n",
            ACH_HEADER
        );
        let file = create_temp_csv(&csv_content);

        let result = read_ach_transactions(file.path());

        assert!(matches!(
            result,
            Err(X9Error::InvalidInputRecord { line: Some(3), .. })
        ));
    }

    #[test]
    fn test_ach_reader_handles_empty_file_after_header() {
        let file = create_temp_csv(ACH_HEADER);
        assert!(read_ach_transactions(file.path()).unwrap().is_empty());
    }
}
