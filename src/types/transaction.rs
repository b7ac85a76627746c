//! Ledger row types
//!
//! Every balance change is mirrored by immutable ledger rows. A deposit or
//! withdrawal writes one row; a transfer writes a `Withdraw` row against the
//! sender and a `Deposit` row against the receiver under one shared
//! transaction id.

use super::account::AccountId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction identifier, shared by both legs of a transfer
pub type TransactionId = u64;

/// First transaction id handed out; anything below is malformed
pub const TRANSACTION_ID_BASE: TransactionId = 111_100_000_001;

/// Direction of a ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    /// Money in: a deposit, an opening balance, or the receiving leg of a transfer
    Deposit,

    /// Money out: a withdrawal, or the sending leg of a transfer
    Withdraw,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::Deposit => f.write_str("Deposit"),
            EntryType::Withdraw => f.write_str("Withdraw"),
        }
    }
}

/// One immutable ledger row
///
/// Only `deleted` ever changes after the row is appended.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub transaction_id: TransactionId,
    pub account: AccountId,
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub deleted: bool,
}

impl LedgerEntry {
    pub fn snapshot(&self) -> TransactionSnapshot {
        TransactionSnapshot {
            transaction: self.transaction_id,
            account: self.account,
            entry_type: self.entry_type,
            amount: self.amount,
            created_at: self.created_at,
            description: self.description.clone(),
        }
    }
}

/// Read model of a ledger row, without the soft-delete flag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionSnapshot {
    pub transaction: TransactionId,
    pub account: AccountId,
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub description: String,
}

/// Both legs of a transfer folded into one view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferSnapshot {
    pub transaction: TransactionId,
    pub sender: AccountId,
    pub receiver: AccountId,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Row selector for account statements
///
/// `Transfer` selects rows whose transaction id is shared by a pair;
/// `Deposit` and `Withdraw` select single-row operations only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFilter {
    All,
    Deposit,
    Withdraw,
    Transfer,
}

impl EntryFilter {
    /// `is_transfer` is whether the row's id is shared with another row
    pub fn matches(&self, entry_type: EntryType, is_transfer: bool) -> bool {
        match self {
            EntryFilter::All => true,
            EntryFilter::Transfer => is_transfer,
            EntryFilter::Deposit => !is_transfer && entry_type == EntryType::Deposit,
            EntryFilter::Withdraw => !is_transfer && entry_type == EntryType::Withdraw,
        }
    }
}
