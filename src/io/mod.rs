//! I/O module
//!
//! Handles operation script parsing and CSV output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (row conversion, output serialization)
//! - `sync_reader` - Synchronous script reader with iterator interface
//! - `async_reader` - Asynchronous script reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{convert_operation_row, write_accounts_csv, write_ledger_csv, OperationRow};
pub use sync_reader::SyncReader;
