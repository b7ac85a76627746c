//! Operations parsed from an operation script
//!
//! An [`Operation`] is one row of a replay script turned into a typed
//! request. Class names stay as raw strings here: resolving them against the
//! policy catalog is the ledger's job, so an unknown class surfaces as an
//! `InvalidAccountClass` rejection rather than a parse failure.

use super::account::AccountId;
use super::customer::CustomerId;
use super::transaction::TransactionId;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Create a customer together with their first account
    CreateCustomer {
        name: String,
        class: String,
        amount: Decimal,
    },

    /// Open an additional account for an existing customer
    OpenAccount {
        customer: CustomerId,
        class: String,
        amount: Decimal,
    },

    Deposit {
        account: AccountId,
        amount: Decimal,
    },

    Withdraw {
        account: AccountId,
        amount: Decimal,
    },

    Transfer {
        sender: AccountId,
        receiver: AccountId,
        amount: Decimal,
    },

    /// Replay a past transfer in the opposite direction
    Revert { transaction: TransactionId },

    Convert { account: AccountId, class: String },

    /// Soft-delete an account
    CloseAccount { account: AccountId },

    /// Soft-delete a customer and every account they hold
    RemoveCustomer { customer: CustomerId },
}

impl Operation {
    /// Script keyword for this operation
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateCustomer { .. } => "customer",
            Operation::OpenAccount { .. } => "open",
            Operation::Deposit { .. } => "deposit",
            Operation::Withdraw { .. } => "withdraw",
            Operation::Transfer { .. } => "transfer",
            Operation::Revert { .. } => "revert",
            Operation::Convert { .. } => "convert",
            Operation::CloseAccount { .. } => "close",
            Operation::RemoveCustomer { .. } => "remove_customer",
        }
    }

    /// Accounts this operation reads or writes
    ///
    /// Returns `None` for barrier operations, whose footprint is not known
    /// until they run: creations allocate new ids, a revert discovers its
    /// accounts from the ledger, and deletions may cascade to the customer
    /// and their other accounts.
    pub fn footprint(&self) -> Option<Vec<AccountId>> {
        match self {
            Operation::Deposit { account, .. }
            | Operation::Withdraw { account, .. }
            | Operation::Convert { account, .. } => Some(vec![*account]),
            Operation::Transfer {
                sender, receiver, ..
            } => Some(vec![*sender, *receiver]),
            Operation::CreateCustomer { .. }
            | Operation::OpenAccount { .. }
            | Operation::Revert { .. }
            | Operation::CloseAccount { .. }
            | Operation::RemoveCustomer { .. } => None,
        }
    }

    pub fn is_barrier(&self) -> bool {
        self.footprint().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::deposit(Operation::Deposit { account: 222200000001, amount: Decimal::ONE }, Some(vec![222200000001]))]
    #[case::transfer(
        Operation::Transfer { sender: 222200000001, receiver: 222200000002, amount: Decimal::ONE },
        Some(vec![222200000001, 222200000002])
    )]
    #[case::convert(Operation::Convert { account: 222200000003, class: "Savings".to_string() }, Some(vec![222200000003]))]
    #[case::revert(Operation::Revert { transaction: 111100000001 }, None)]
    #[case::close(Operation::CloseAccount { account: 222200000001 }, None)]
    #[case::open(
        Operation::OpenAccount { customer: 333300000001, class: "Current".to_string(), amount: Decimal::ONE },
        None
    )]
    fn test_footprint(#[case] op: Operation, #[case] expected: Option<Vec<AccountId>>) {
        assert_eq!(op.footprint(), expected);
        assert_eq!(op.is_barrier(), expected.is_none());
    }
}
