//! Transfer reversion
//!
//! Reverting a transfer is not an undo: the original rows stay as they are,
//! and a brand new transfer moves the same amount from the original receiver
//! back to the original sender. It goes through the full transfer validation,
//! so a receiver that has since spent the money, or hit its daily limits,
//! cannot be reverted.

use crate::core::engine::{validate_transaction_id, BankEngine};
use crate::types::{BankError, EntryType, LedgerEntry, RevertReceipt, TransactionId};
use tracing::info;

impl BankEngine {
    /// Replay transfer `transaction` in the opposite direction
    ///
    /// # Errors
    ///
    /// - `InvalidTransactionId` if the id is below the transaction id base
    /// - `TransactionNotFound` if no live rows carry the id
    /// - `NotATransfer` if the id does not have exactly two live rows
    /// - `IncompleteTransferPair` if the two rows are not one `Withdraw` and
    ///   one `Deposit` of the same amount
    /// - any error [`BankEngine::transfer`] can return, evaluated against the
    ///   original receiver
    pub fn revert(&self, transaction: TransactionId) -> Result<RevertReceipt, BankError> {
        validate_transaction_id(transaction)?;

        let rows = self.ledger.rows_for(transaction);
        let (sender_leg, receiver_leg) = transfer_legs(transaction, &rows)?;

        let transfer = self.transfer(
            receiver_leg.account,
            sender_leg.account,
            receiver_leg.amount,
        )?;

        info!(
            reverted = transaction,
            transaction = transfer.transaction,
            "transfer reverted"
        );
        Ok(RevertReceipt {
            reverted: transaction,
            transfer,
        })
    }
}

/// Split a transfer's rows into its `(Withdraw, Deposit)` legs
fn transfer_legs(
    transaction: TransactionId,
    rows: &[LedgerEntry],
) -> Result<(&LedgerEntry, &LedgerEntry), BankError> {
    match rows {
        [] => Err(BankError::transaction_not_found(transaction)),
        [first, second] => {
            let (sender, receiver) = match (first.entry_type, second.entry_type) {
                (EntryType::Withdraw, EntryType::Deposit) => (first, second),
                (EntryType::Deposit, EntryType::Withdraw) => (second, first),
                _ => return Err(BankError::IncompleteTransferPair { transaction }),
            };
            if sender.amount != receiver.amount {
                return Err(BankError::IncompleteTransferPair { transaction });
            }
            Ok((sender, receiver))
        }
        other => Err(BankError::NotATransfer {
            transaction,
            rows: other.len(),
        }),
    }
}
