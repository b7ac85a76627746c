//! Core business logic module
//!
//! This module contains the ledger components:
//! - `traits` - Clock abstraction for deterministic time
//! - `policy_catalog` - Account class to policy table
//! - `account_store` - Concurrent account map with per-account locks
//! - `transaction_ledger` - Append-only ledger of transaction rows
//! - `customer_registry` - Customer records
//! - `engine` - Deposit, withdraw, transfer and conversion
//! - `revert` - Reversal of transfers
//! - `lifecycle` - Customer and account creation and deletion
//! - `queries` - Read-only views over accounts, customers and the ledger
//! - `batch_processor` - Account-partitioned concurrent replay

pub mod account_store;
pub mod batch_processor;
pub mod customer_registry;
pub mod engine;
pub mod lifecycle;
pub mod policy_catalog;
pub mod queries;
pub mod revert;
pub mod traits;
pub mod transaction_ledger;

pub use account_store::AccountStore;
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use customer_registry::CustomerRegistry;
pub use engine::BankEngine;
pub use policy_catalog::PolicyCatalog;
pub use traits::{Clock, ManualClock, SystemClock};
pub use transaction_ledger::TransactionLedger;
