//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account record and snapshot
//! - `customer`: Customer record and snapshot
//! - `policy`: Account classes and their limits
//! - `transaction`: Ledger rows and identifiers
//! - `operation`: Operations read from a replay script
//! - `outcome`: Receipts and the tagged operation outcome
//! - `config`: Ledger configuration
//! - `error`: Error types for the ledger

pub mod account;
pub mod config;
pub mod customer;
pub mod error;
pub mod operation;
pub mod outcome;
pub mod policy;
pub mod transaction;

pub use account::{Account, AccountId, AccountSnapshot, ACCOUNT_ID_BASE};
pub use config::{DeleteCascade, LedgerConfig};
pub use customer::{Customer, CustomerId, CustomerSnapshot, CUSTOMER_ID_BASE};
pub use error::{BankError, ErrorKind};
pub use operation::Operation;
pub use outcome::{
    AccountClosed, AccountOpened, Applied, Confirmation, ConversionReceipt, CustomerCreated,
    CustomerRemoved, DepositReceipt, ErrorDetail, OperationOutcome, RevertReceipt,
    TransferReceipt, WithdrawalReceipt,
};
pub use policy::{AccountClass, AccountPolicy, ClassFilter};
pub use transaction::{
    EntryFilter, EntryType, LedgerEntry, TransactionId, TransactionSnapshot, TransferSnapshot,
    TRANSACTION_ID_BASE,
};
