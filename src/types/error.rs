//! Error types for the banking ledger
//!
//! This module defines every error a ledger operation can report. Errors are
//! values, never panics: each core operation returns `Result<_, BankError>` and
//! the caller decides how to surface it.
//!
//! # Error Categories
//!
//! Every variant maps onto one [`ErrorKind`]:
//!
//! - **NotFound**: account, customer or transaction absent or soft-deleted
//! - **InvalidArgument**: non-positive amount, identical sender/receiver,
//!   unknown account class, malformed id, invalid date/amount range
//! - **PolicyViolation**: minimum balance, daily amount/count limits, conversion rules
//! - **InconsistentLedger**: a transfer whose row pair is incomplete
//! - **Io**: file and CSV problems raised by the replay tooling

use crate::types::{AccountClass, AccountId, CustomerId, TransactionId};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Coarse classification of a [`BankError`]
///
/// This is what an HTTP-facing collaborator needs to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    PolicyViolation,
    InconsistentLedger,
    Io,
}

impl ErrorKind {
    /// HTTP status class for this kind of failure
    ///
    /// `NotFound` maps to 404, I/O failures to 500 and everything else to 400.
    pub fn status_class(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Io => 500,
            ErrorKind::InvalidArgument
            | ErrorKind::PolicyViolation
            | ErrorKind::InconsistentLedger => 400,
        }
    }
}

/// Main error type for the banking ledger
///
/// Each variant carries the identifiers and amounts needed to produce a
/// human-readable message without consulting the stores again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BankError {
    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError { message: String },

    /// CSV parsing error in an operation script
    #[error("CSV parse error{}: {message}", .line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError { line: Option<u64>, message: String },

    /// Unknown operation name in an operation script
    #[error("Invalid operation '{op}'")]
    InvalidOperation { op: String },

    /// A script operation is missing a field it requires
    #[error("Operation '{op}' requires a {field}")]
    MissingField { op: String, field: String },

    /// Amount is zero, negative or carries more than two decimal places
    #[error("Invalid amount {amount}: amount must be positive with at most two decimal places")]
    InvalidAmount { amount: Decimal },

    #[error("Invalid account id {account}: account ids start from 222200000001")]
    InvalidAccountId { account: AccountId },

    #[error("Invalid transaction id {transaction}: transaction ids start from 111100000001")]
    InvalidTransactionId { transaction: TransactionId },

    #[error("Invalid customer id {customer}: customer ids start from 333300000001")]
    InvalidCustomerId { customer: CustomerId },

    /// Sender and receiver of a transfer are the same account
    #[error("Sender and receiver account {account} cannot be the same")]
    SameAccountTransfer { account: AccountId },

    /// Account class name is not in the policy catalog
    #[error("Invalid account class '{name}': valid classes are 'Savings' and 'Current'")]
    InvalidAccountClass { name: String },

    #[error("Invalid date range: {reason}")]
    InvalidDateRange { reason: String },

    #[error("Invalid amount range {min} - {max}: bounds must be non-negative and min must not exceed max")]
    InvalidAmountRange { min: Decimal, max: Decimal },

    /// Account absent or soft-deleted
    #[error("No account found with account id {account}")]
    AccountNotFound { account: AccountId },

    /// Customer absent or soft-deleted
    #[error("No customer found with customer id {customer}")]
    CustomerNotFound { customer: CustomerId },

    /// No live ledger rows carry this transaction id
    #[error("Transaction {transaction} doesn't exist")]
    TransactionNotFound { transaction: TransactionId },

    /// Debit would leave the balance below the class minimum
    #[error("Rejected: debit from account {account} would drop the balance below the minimum required balance of {min_balance:.2}")]
    InsufficientMinimumBalance {
        account: AccountId,
        min_balance: Decimal,
    },

    /// Sender balance does not cover the transfer amount
    #[error("Rejected: insufficient balance in account {account}: balance {balance:.2}, requested {requested:.2}")]
    InsufficientBalance {
        account: AccountId,
        balance: Decimal,
        requested: Decimal,
    },

    /// Opening deposit below the class minimum
    #[error("Opening amount {amount:.2} is below the minimum balance of {min_balance:.2} for a {class} account")]
    InsufficientOpeningDeposit {
        class: AccountClass,
        min_balance: Decimal,
        amount: Decimal,
    },

    /// Amount exceeds what is left of today's withdrawal allowance
    #[error("Rejected: exceeds daily withdrawal limit for account {account}. You can withdraw only {remaining:.2}")]
    DailyAmountLimitExceeded {
        account: AccountId,
        remaining: Decimal,
    },

    /// No withdrawals left in the current window
    #[error("Rejected: daily withdrawal limit reached for account {account}. You can withdraw money after {hours_until_reset} hours")]
    DailyCountLimitExceeded {
        account: AccountId,
        hours_until_reset: i64,
    },

    /// Conversion target equals the current class
    #[error("Conversion failed: account {account} is already a {class} account")]
    NoOpConversion {
        account: AccountId,
        class: AccountClass,
    },

    /// Balance below the target class minimum
    #[error("Conversion failed: a {class} account requires a minimum balance of {min_balance:.2}. Please deposit {shortfall:.2} and try again")]
    InsufficientBalanceForConversion {
        account: AccountId,
        class: AccountClass,
        min_balance: Decimal,
        shortfall: Decimal,
    },

    /// Transaction id does not identify a two-row transfer
    #[error("Transaction {transaction} is not a transfer ({rows} ledger rows): cannot revert")]
    NotATransfer {
        transaction: TransactionId,
        rows: usize,
    },

    /// Two rows exist but they are not one Withdraw plus one Deposit of the same amount
    #[error("Transaction {transaction} has an incomplete transfer pair")]
    IncompleteTransferPair { transaction: TransactionId },

    /// Arithmetic overflow would occur
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        operation: String,
        account: AccountId,
    },
}

impl BankError {
    /// Classify this error into the four-way taxonomy (plus I/O)
    pub fn kind(&self) -> ErrorKind {
        match self {
            BankError::AccountNotFound { .. }
            | BankError::CustomerNotFound { .. }
            | BankError::TransactionNotFound { .. } => ErrorKind::NotFound,

            BankError::InvalidOperation { .. }
            | BankError::MissingField { .. }
            | BankError::ParseError { .. }
            | BankError::InvalidAmount { .. }
            | BankError::InvalidAccountId { .. }
            | BankError::InvalidTransactionId { .. }
            | BankError::InvalidCustomerId { .. }
            | BankError::SameAccountTransfer { .. }
            | BankError::InvalidAccountClass { .. }
            | BankError::InvalidDateRange { .. }
            | BankError::InvalidAmountRange { .. }
            | BankError::NotATransfer { .. }
            | BankError::ArithmeticOverflow { .. } => ErrorKind::InvalidArgument,

            BankError::InsufficientMinimumBalance { .. }
            | BankError::InsufficientBalance { .. }
            | BankError::InsufficientOpeningDeposit { .. }
            | BankError::DailyAmountLimitExceeded { .. }
            | BankError::DailyCountLimitExceeded { .. }
            | BankError::NoOpConversion { .. }
            | BankError::InsufficientBalanceForConversion { .. } => ErrorKind::PolicyViolation,

            BankError::IncompleteTransferPair { .. } => ErrorKind::InconsistentLedger,

            BankError::FileNotFound { .. } | BankError::IoError { .. } => ErrorKind::Io,
        }
    }
}

impl From<std::io::Error> for BankError {
    fn from(error: std::io::Error) -> Self {
        BankError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for BankError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        BankError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl From<csv_async::Error> for BankError {
    fn from(error: csv_async::Error) -> Self {
        BankError::ParseError {
            line: None,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl BankError {
    pub fn account_not_found(account: AccountId) -> Self {
        BankError::AccountNotFound { account }
    }

    pub fn customer_not_found(customer: CustomerId) -> Self {
        BankError::CustomerNotFound { customer }
    }

    pub fn transaction_not_found(transaction: TransactionId) -> Self {
        BankError::TransactionNotFound { transaction }
    }

    pub fn invalid_amount(amount: Decimal) -> Self {
        BankError::InvalidAmount { amount }
    }

    pub fn invalid_account_class(name: &str) -> Self {
        BankError::InvalidAccountClass {
            name: name.to_string(),
        }
    }

    pub fn invalid_date_range(reason: &str) -> Self {
        BankError::InvalidDateRange {
            reason: reason.to_string(),
        }
    }

    pub fn missing_field(op: &str, field: &str) -> Self {
        BankError::MissingField {
            op: op.to_string(),
            field: field.to_string(),
        }
    }

    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        BankError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::file_not_found(
        BankError::FileNotFound { path: "ops.csv".to_string() },
        "File not found: ops.csv"
    )]
    #[case::parse_error_with_line(
        BankError::ParseError { line: Some(7), message: "Invalid field".to_string() },
        "CSV parse error at line 7: Invalid field"
    )]
    #[case::parse_error_without_line(
        BankError::ParseError { line: None, message: "Invalid field".to_string() },
        "CSV parse error: Invalid field"
    )]
    #[case::account_not_found(
        BankError::AccountNotFound { account: 222200000009 },
        "No account found with account id 222200000009"
    )]
    #[case::minimum_balance(
        BankError::InsufficientMinimumBalance { account: 222200000001, min_balance: Decimal::new(10000, 0) },
        "Rejected: debit from account 222200000001 would drop the balance below the minimum required balance of 10000.00"
    )]
    #[case::daily_amount(
        BankError::DailyAmountLimitExceeded { account: 222200000001, remaining: Decimal::new(250000, 2) },
        "Rejected: exceeds daily withdrawal limit for account 222200000001. You can withdraw only 2500.00"
    )]
    #[case::daily_count(
        BankError::DailyCountLimitExceeded { account: 222200000001, hours_until_reset: 23 },
        "Rejected: daily withdrawal limit reached for account 222200000001. You can withdraw money after 23 hours"
    )]
    #[case::conversion_shortfall(
        BankError::InsufficientBalanceForConversion {
            account: 222200000002,
            class: AccountClass::Savings,
            min_balance: Decimal::new(10000, 0),
            shortfall: Decimal::new(2500, 0),
        },
        "Conversion failed: a Savings account requires a minimum balance of 10000.00. Please deposit 2500.00 and try again"
    )]
    #[case::not_a_transfer(
        BankError::NotATransfer { transaction: 111100000001, rows: 1 },
        "Transaction 111100000001 is not a transfer (1 ledger rows): cannot revert"
    )]
    fn test_error_display(#[case] error: BankError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::account(BankError::account_not_found(222200000001), ErrorKind::NotFound)]
    #[case::transaction(BankError::transaction_not_found(111100000001), ErrorKind::NotFound)]
    #[case::amount(BankError::invalid_amount(Decimal::ZERO), ErrorKind::InvalidArgument)]
    #[case::same_account(BankError::SameAccountTransfer { account: 222200000001 }, ErrorKind::InvalidArgument)]
    #[case::class(BankError::invalid_account_class("gold"), ErrorKind::InvalidArgument)]
    #[case::count_limit(
        BankError::DailyCountLimitExceeded { account: 222200000001, hours_until_reset: 3 },
        ErrorKind::PolicyViolation
    )]
    #[case::no_op(
        BankError::NoOpConversion { account: 222200000001, class: AccountClass::Current },
        ErrorKind::PolicyViolation
    )]
    #[case::incomplete_pair(
        BankError::IncompleteTransferPair { transaction: 111100000001 },
        ErrorKind::InconsistentLedger
    )]
    fn test_error_kind(#[case] error: BankError, #[case] expected: ErrorKind) {
        assert_eq!(error.kind(), expected);
    }

    #[rstest]
    #[case(ErrorKind::NotFound, 404)]
    #[case(ErrorKind::InvalidArgument, 400)]
    #[case(ErrorKind::PolicyViolation, 400)]
    #[case(ErrorKind::InconsistentLedger, 400)]
    #[case(ErrorKind::Io, 500)]
    fn test_status_class(#[case] kind: ErrorKind, #[case] expected: u16) {
        assert_eq!(kind.status_class(), expected);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: BankError = io_error.into();
        assert!(matches!(error, BankError::IoError { .. }));
        assert_eq!(error.to_string(), "I/O error: Permission denied");
    }
}
