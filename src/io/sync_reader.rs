//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over operations from a script file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! ```no_run
//! use rust_banking_ledger::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("operations.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(operation) => println!("Applying: {:?}", operation),
//!         Err(e) => eprintln!("Skipping row: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual row errors are yielded as Err variants in the iterator,
//!   carrying the line number

use crate::io::csv_format::{convert_operation_row, OperationRow};
use crate::types::{BankError, Operation};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Synchronous script reader
///
/// Reads one row at a time; memory use does not grow with the file.
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: u64,
}

impl SyncReader {
    /// Open a script file for streaming iteration
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Allow flexible field counts (trailing empty columns may be omitted)
    /// - Use an 8KB buffer for efficient I/O
    ///
    /// # Errors
    ///
    /// * `FileNotFound` if the path does not exist
    /// * `IoError` if the file cannot be opened for another reason
    pub fn new(path: &Path) -> Result<Self, BankError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BankError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => BankError::IoError {
                message: format!("Failed to open file '{}': {}", path.display(), e),
            },
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 1,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<Operation, BankError>;

    /// Next operation from the script
    ///
    /// # Returns
    ///
    /// * `Some(Ok(Operation))` - Successfully parsed row
    /// * `Some(Err(BankError::ParseError))` - Parse or conversion error with line number
    /// * `None` - End of file reached
    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<OperationRow>();
        let next = deserializer.next()?;
        self.line_num += 1;

        let line = self.line_num;
        Some(match next {
            Ok(row) => convert_operation_row(row).map_err(|e| BankError::ParseError {
                line: Some(line),
                message: e.to_string(),
            }),
            Err(e) => Err(BankError::ParseError {
                line: Some(line),
                message: e.to_string(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_reader_valid_script() {
        let file = create_temp_csv(
            "op,subject,target,amount,class,name\n\
             customer,,,20000,Savings,Ada\n\
             deposit,222200000001,,250.50,,\n\
             transfer,222200000001,222200000002,100,,\n",
        );

        let operations: Vec<Operation> = SyncReader::new(file.path())
            .unwrap()
            .map(Result::unwrap)
            .collect();

        assert_eq!(operations.len(), 3);
        assert_eq!(
            operations[1],
            Operation::Deposit {
                account: 222200000001,
                amount: Decimal::new(25050, 2)
            }
        );
        assert_eq!(operations[2].name(), "transfer");
    }

    #[test]
    fn test_sync_reader_short_rows_and_whitespace() {
        let file = create_temp_csv(
            "op,subject,target,amount,class,name\n\
             revert , 111100000003\n\
             close,222200000001\n",
        );

        let operations: Vec<Operation> = SyncReader::new(file.path())
            .unwrap()
            .map(Result::unwrap)
            .collect();

        assert_eq!(
            operations,
            vec![
                Operation::Revert {
                    transaction: 111100000003
                },
                Operation::CloseAccount {
                    account: 222200000001
                },
            ]
        );
    }

    #[test]
    fn test_sync_reader_reports_line_numbers() {
        let file = create_temp_csv(
            "op,subject,target,amount,class,name\n\
             deposit,222200000001,,10,,\n\
             bogus,1,,,,\n\
             deposit,not_a_number,,10,,\n\
             withdraw,222200000001,,5,,\n",
        );

        let results: Vec<Result<Operation, BankError>> =
            SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(results.len(), 4);
        assert!(results[0].is_ok());
        assert!(matches!(
            &results[1],
            Err(BankError::ParseError { line: Some(3), .. })
        ));
        assert!(matches!(
            &results[2],
            Err(BankError::ParseError { line: Some(4), .. })
        ));
        assert!(results[3].is_ok());
    }

    #[test]
    fn test_sync_reader_missing_file() {
        let err = SyncReader::new(Path::new("does/not/exist.csv")).unwrap_err();
        assert!(matches!(err, BankError::FileNotFound { .. }));
    }

    #[test]
    fn test_sync_reader_header_only() {
        let file = create_temp_csv("op,subject,target,amount,class,name\n");
        assert_eq!(SyncReader::new(file.path()).unwrap().count(), 0);
    }
}
