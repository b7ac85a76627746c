//! Typed receipts for successful operations and the tagged outcome built from them
//!
//! Core operations return a receipt struct on success. Anything that needs the
//! flat `{ success, message }` shape an HTTP layer would send back builds an
//! [`OperationOutcome`] from the `Result`.

use super::error::{BankError, ErrorKind};
use super::{AccountClass, AccountId, CustomerId, TransactionId};
use rust_decimal::Decimal;
use serde::Serialize;

/// A successful operation that can describe itself to a user
pub trait Confirmation {
    fn message(&self) -> String;

    /// Ledger id written by the operation, if it wrote any rows
    fn transaction(&self) -> Option<TransactionId> {
        None
    }
}

/// What a replay keeps from an applied operation
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub message: String,
    pub transaction: Option<TransactionId>,
}

impl Applied {
    pub fn from_receipt<T: Confirmation>(receipt: &T) -> Self {
        Applied {
            message: receipt.message(),
            transaction: receipt.transaction(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepositReceipt {
    pub transaction: TransactionId,
    pub account: AccountId,
    pub amount: Decimal,
    pub balance: Decimal,
}

impl Confirmation for DepositReceipt {
    fn transaction(&self) -> Option<TransactionId> {
        Some(self.transaction)
    }

    fn message(&self) -> String {
        format!("Account Id {} credited with {:.2}", self.account, self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithdrawalReceipt {
    pub transaction: TransactionId,
    pub account: AccountId,
    pub amount: Decimal,
    pub balance: Decimal,
    pub remaining_withdrawal_amount: Decimal,
    pub remaining_withdrawal_count: u32,
}

impl Confirmation for WithdrawalReceipt {
    fn transaction(&self) -> Option<TransactionId> {
        Some(self.transaction)
    }

    fn message(&self) -> String {
        format!("Account Id {} debited with {:.2}", self.account, self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferReceipt {
    pub transaction: TransactionId,
    pub sender: AccountId,
    pub receiver: AccountId,
    pub amount: Decimal,
    pub sender_balance: Decimal,
    pub receiver_balance: Decimal,
}

impl Confirmation for TransferReceipt {
    fn transaction(&self) -> Option<TransactionId> {
        Some(self.transaction)
    }

    fn message(&self) -> String {
        format!(
            "Transferred {:.2} from account {} to account {}",
            self.amount, self.sender, self.receiver
        )
    }
}

/// A revert is a fresh transfer; `reverted` is the transaction it undoes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevertReceipt {
    pub reverted: TransactionId,
    pub transfer: TransferReceipt,
}

impl Confirmation for RevertReceipt {
    fn transaction(&self) -> Option<TransactionId> {
        Some(self.transfer.transaction)
    }

    fn message(&self) -> String {
        format!(
            "Transaction {} reverted as transaction {}. {}",
            self.reverted,
            self.transfer.transaction,
            self.transfer.message()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReceipt {
    pub account: AccountId,
    pub from: AccountClass,
    pub to: AccountClass,
}

impl Confirmation for ConversionReceipt {
    fn message(&self) -> String {
        format!(
            "Account {} converted from {} to {}",
            self.account, self.from, self.to
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountOpened {
    pub customer: CustomerId,
    pub account: AccountId,
    pub class: AccountClass,
    /// Opening `Deposit` row
    pub transaction: TransactionId,
    pub balance: Decimal,
}

impl Confirmation for AccountOpened {
    fn transaction(&self) -> Option<TransactionId> {
        Some(self.transaction)
    }

    fn message(&self) -> String {
        format!(
            "{} account {} opened for customer {} with {:.2}",
            self.class, self.account, self.customer, self.balance
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerCreated {
    pub customer: CustomerId,
    pub name: String,
    pub account: AccountOpened,
}

impl Confirmation for CustomerCreated {
    fn transaction(&self) -> Option<TransactionId> {
        Some(self.account.transaction)
    }

    fn message(&self) -> String {
        format!(
            "Customer {} ({}) created. {}",
            self.customer,
            self.name,
            self.account.message()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountClosed {
    pub account: AccountId,
    pub customer: CustomerId,
    /// Number of ledger rows flagged as deleted
    pub rows_flagged: usize,
    /// Whether the customer went with their last account
    pub customer_deleted: bool,
}

impl Confirmation for AccountClosed {
    fn message(&self) -> String {
        if self.customer_deleted {
            format!(
                "Account {} deleted. Customer {} had no other accounts and was deleted too",
                self.account, self.customer
            )
        } else {
            format!("Account {} deleted", self.account)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRemoved {
    pub customer: CustomerId,
    pub accounts: Vec<AccountId>,
}

impl Confirmation for CustomerRemoved {
    fn message(&self) -> String {
        format!(
            "Customer {} deleted along with {} account(s)",
            self.customer,
            self.accounts.len()
        )
    }
}

/// Failure detail carried by a rejected [`OperationOutcome`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub status: u16,
}

/// Tagged success/failure result with a human-readable message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl OperationOutcome {
    pub fn from_result<T: Confirmation>(result: &Result<T, BankError>) -> Self {
        match result {
            Ok(receipt) => OperationOutcome {
                success: true,
                message: receipt.message(),
                error: None,
            },
            Err(error) => {
                let kind = error.kind();
                OperationOutcome {
                    success: false,
                    message: error.to_string(),
                    error: Some(ErrorDetail {
                        kind,
                        status: kind.status_class(),
                    }),
                }
            }
        }
    }
}
