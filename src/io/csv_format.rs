//! CSV format handling for operation scripts and ledger output
//!
//! This module centralizes all CSV format concerns, providing:
//! - OperationRow structure for deserialization
//! - Conversion from script rows to [`Operation`]s
//! - Account and ledger output serialization
//!
//! All functions are pure (no file I/O) for easy testing.
//!
//! # Script format
//!
//! ```text
//! op,subject,target,amount,class,name
//! customer,,,20000,Savings,Ada Lovelace
//! open,333300000001,,5000,Current,
//! deposit,222200000001,,250.50,,
//! withdraw,222200000001,,100,,
//! transfer,222200000001,222200000002,1000,,
//! revert,111100000004,,,,
//! convert,222200000002,,,Savings,
//! close,222200000002,,,,
//! remove_customer,333300000001,,,,
//! ```

use crate::types::{Account, BankError, LedgerEntry, Operation};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// One row of an operation script
///
/// Every column but `op` is optional; which ones an operation needs is
/// checked by [`convert_operation_row`].
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct OperationRow {
    pub op: String,
    #[serde(default)]
    pub subject: Option<u64>,
    #[serde(default)]
    pub target: Option<u64>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Convert an OperationRow to an Operation
///
/// This function:
/// - Parses the `op` keyword (case-insensitive)
/// - Parses the amount string into a Decimal where the operation needs one
/// - Checks that every column the operation needs is present
///
/// Amount sign and precision are not checked here; the ledger rejects bad
/// amounts with `InvalidAmount` like any other caller's.
///
/// # Errors
///
/// - `InvalidOperation` for an unknown keyword
/// - `MissingField` when a required column is empty
/// - `ParseError` when the amount is not a number
pub fn convert_operation_row(row: OperationRow) -> Result<Operation, BankError> {
    let op = row.op.to_lowercase();

    let operation = match op.as_str() {
        "customer" => Operation::CreateCustomer {
            name: required_text(&op, "name", row.name)?,
            class: required_text(&op, "class", row.class)?,
            amount: required_amount(&op, row.amount)?,
        },
        "open" => Operation::OpenAccount {
            customer: required_id(&op, "subject", row.subject)?,
            class: required_text(&op, "class", row.class)?,
            amount: required_amount(&op, row.amount)?,
        },
        "deposit" => Operation::Deposit {
            account: required_id(&op, "subject", row.subject)?,
            amount: required_amount(&op, row.amount)?,
        },
        "withdraw" | "withdrawal" => Operation::Withdraw {
            account: required_id(&op, "subject", row.subject)?,
            amount: required_amount(&op, row.amount)?,
        },
        "transfer" => Operation::Transfer {
            sender: required_id(&op, "subject", row.subject)?,
            receiver: required_id(&op, "target", row.target)?,
            amount: required_amount(&op, row.amount)?,
        },
        "revert" => Operation::Revert {
            transaction: required_id(&op, "subject", row.subject)?,
        },
        "convert" => Operation::Convert {
            account: required_id(&op, "subject", row.subject)?,
            class: required_text(&op, "class", row.class)?,
        },
        "close" => Operation::CloseAccount {
            account: required_id(&op, "subject", row.subject)?,
        },
        "remove_customer" => Operation::RemoveCustomer {
            customer: required_id(&op, "subject", row.subject)?,
        },
        _ => return Err(BankError::InvalidOperation { op: row.op }),
    };

    Ok(operation)
}

fn required_id(op: &str, field: &str, value: Option<u64>) -> Result<u64, BankError> {
    value.ok_or_else(|| BankError::missing_field(op, field))
}

fn required_text(op: &str, field: &str, value: Option<String>) -> Result<String, BankError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(BankError::missing_field(op, field)),
    }
}

fn required_amount(op: &str, value: Option<String>) -> Result<Decimal, BankError> {
    let text = required_text(op, "amount", value)?;
    Decimal::from_str(&text).map_err(|_| BankError::ParseError {
        line: None,
        message: format!("Invalid amount '{}' for {}", text, op),
    })
}

/// Write account states to CSV format
///
/// Writes accounts with columns: account, customer, class, balance,
/// remaining_withdrawal_amount, remaining_withdrawal_count, deleted.
/// Accounts are sorted by account number for deterministic output and
/// amounts are printed with two decimals.
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), BankError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record([
        "account",
        "customer",
        "class",
        "balance",
        "remaining_withdrawal_amount",
        "remaining_withdrawal_count",
        "deleted",
    ])?;

    let mut sorted_accounts = accounts.to_vec();
    sorted_accounts.sort_by_key(|account| account.id);

    for account in sorted_accounts {
        writer.write_record(&[
            account.id.to_string(),
            account.customer.to_string(),
            account.class.to_string(),
            format!("{:.2}", account.balance),
            format!("{:.2}", account.remaining_withdrawal_amount),
            account.remaining_withdrawal_count.to_string(),
            account.deleted.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write ledger rows to CSV format, in the order given
///
/// Columns: transaction, account, type, amount, deleted, description.
pub fn write_ledger_csv(rows: &[LedgerEntry], output: &mut dyn Write) -> Result<(), BankError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["transaction", "account", "type", "amount", "deleted", "description"])?;

    for row in rows {
        writer.write_record(&[
            row.transaction_id.to_string(),
            row.account.to_string(),
            row.entry_type.to_string(),
            format!("{:.2}", row.amount),
            row.deleted.to_string(),
            row.description.clone(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PolicyCatalog;
    use crate::types::EntryType;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn row(op: &str) -> OperationRow {
        OperationRow {
            op: op.to_string(),
            ..OperationRow::default()
        }
    }

    #[test]
    fn test_convert_customer_row() {
        let input = OperationRow {
            name: Some(" Ada Lovelace ".to_string()),
            class: Some("savings".to_string()),
            amount: Some("20000".to_string()),
            ..row("customer")
        };

        assert_eq!(
            convert_operation_row(input).unwrap(),
            Operation::CreateCustomer {
                name: "Ada Lovelace".to_string(),
                class: "savings".to_string(),
                amount: Decimal::new(20000, 0),
            }
        );
    }

    #[rstest]
    #[case::deposit("deposit")]
    #[case::uppercase("DEPOSIT")]
    fn test_convert_deposit_row(#[case] op: &str) {
        let input = OperationRow {
            subject: Some(222200000001),
            amount: Some("250.50".to_string()),
            ..row(op)
        };

        assert_eq!(
            convert_operation_row(input).unwrap(),
            Operation::Deposit {
                account: 222200000001,
                amount: Decimal::new(25050, 2),
            }
        );
    }

    #[test]
    fn test_convert_transfer_row() {
        let input = OperationRow {
            subject: Some(222200000001),
            target: Some(222200000002),
            amount: Some("1000".to_string()),
            ..row("transfer")
        };

        assert_eq!(
            convert_operation_row(input).unwrap(),
            Operation::Transfer {
                sender: 222200000001,
                receiver: 222200000002,
                amount: Decimal::new(1000, 0),
            }
        );
    }

    #[rstest]
    #[case::revert_missing_subject(row("revert"), "MissingField")]
    #[case::unknown_op(OperationRow { subject: Some(1), ..row("dispute") }, "InvalidOperation")]
    #[case::deposit_missing_amount(OperationRow { subject: Some(222200000001), ..row("deposit") }, "MissingField")]
    #[case::transfer_missing_target(
        OperationRow { subject: Some(222200000001), amount: Some("5".to_string()), ..row("transfer") },
        "MissingField"
    )]
    #[case::blank_class(
        OperationRow { subject: Some(222200000001), class: Some("  ".to_string()), ..row("convert") },
        "MissingField"
    )]
    #[case::bad_amount(
        OperationRow { subject: Some(222200000001), amount: Some("ten".to_string()), ..row("withdraw") },
        "ParseError"
    )]
    fn test_convert_operation_row_errors(#[case] input: OperationRow, #[case] expected: &str) {
        let err = convert_operation_row(input).unwrap_err();
        let debug = format!("{:?}", err);
        assert!(debug.starts_with(expected), "Expected {}, got {}", expected, debug);
    }

    #[test]
    fn test_write_accounts_csv_sorted_with_two_decimals() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let catalog = PolicyCatalog::new();
        let savings = catalog.resolve("Savings").unwrap();
        let current = catalog.resolve("Current").unwrap();

        let mut closed =
            Account::open(222200000001, 333300000001, &current, Decimal::new(5000, 0), now);
        closed.deleted = true;
        let open =
            Account::open(222200000002, 333300000002, &savings, Decimal::new(1050050, 2), now);
        let accounts = vec![open, closed];

        let mut output = Vec::new();
        write_accounts_csv(&accounts, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "account,customer,class,balance,remaining_withdrawal_amount,remaining_withdrawal_count,deleted\n\
             222200000001,333300000001,Current,5000.00,10000000.00,6,true\n\
             222200000002,333300000002,Savings,10500.50,25000.00,5,false\n"
        );
    }

    #[test]
    fn test_write_accounts_csv_empty() {
        let mut output = Vec::new();
        write_accounts_csv(&[], &mut output).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "account,customer,class,balance,remaining_withdrawal_amount,remaining_withdrawal_count,deleted\n"
        );
    }

    #[test]
    fn test_write_ledger_csv_quotes_descriptions() {
        let rows = vec![LedgerEntry {
            transaction_id: 111100000001,
            account: 222200000001,
            entry_type: EntryType::Deposit,
            amount: Decimal::new(1000, 0),
            created_at: Utc::now(),
            description: "Account Id 222200000001 credited with 1000.00, by teller".to_string(),
            deleted: false,
        }];

        let mut output = Vec::new();
        write_ledger_csv(&rows, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "transaction,account,type,amount,deleted,description\n\
             111100000001,222200000001,Deposit,1000.00,false,\"Account Id 222200000001 credited with 1000.00, by teller\"\n"
        );
    }
}
