//! Rust Banking Ledger Library
//! # Overview
//!
//! An in-memory banking ledger: customers own accounts of a policy class,
//! and every balance change is recorded as an immutable ledger row. Account
//! classes carry a minimum balance and a rolling 24 hour withdrawal quota.
//!
//! # Architecture
//!
//! - [`types`] - Accounts, customers, ledger rows, operations, receipts, errors
//! - [`core`] - Business logic:
//!   - [`core::engine`] - Deposits, withdrawals, transfers and class conversion
//!   - [`core::revert`] - Reverting a transfer by replaying it backwards
//!   - [`core::lifecycle`] - Creating and deleting customers and accounts
//!   - [`core::queries`] - Read-only views
//!   - [`core::batch_processor`] - Account-partitioned concurrent replay
//! - [`io`] - Operation script parsing and CSV output
//! - [`strategy`] - Sync and async script replay
//! - [`cli`] - Command-line arguments
//! - [`logging`] - tracing subscriber setup
//!
//! # Example
//!
//! ```
//! use rust_banking_ledger::BankEngine;
//! use rust_decimal::Decimal;
//!
//! let engine = BankEngine::new();
//! let created = engine
//!     .create_customer("Ada Lovelace", "Savings", Decimal::new(20_000, 0))
//!     .unwrap();
//! let account = created.account.account;
//!
//! engine.withdraw(account, Decimal::new(500, 0)).unwrap();
//! assert_eq!(engine.account(account).unwrap().balance, Decimal::new(19_500, 0));
//! ```

pub mod cli;
pub mod core;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use core::{BankEngine, PolicyCatalog};
pub use io::{write_accounts_csv, write_ledger_csv};
pub use types::{
    Account, AccountClass, AccountId, AccountPolicy, BankError, Customer, CustomerId,
    DeleteCascade, ErrorKind, LedgerConfig, LedgerEntry, Operation, OperationOutcome,
    TransactionId,
};
