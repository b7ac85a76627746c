//! Read-only queries
//!
//! Nothing here mutates state or touches withdrawal quotas, not even the
//! daily reset. Results are snapshots without soft-delete bookkeeping; an
//! empty result is `Ok(vec![])`, never an error.

use crate::core::engine::{
    validate_account_id, validate_customer_id, validate_transaction_id, BankEngine,
};
use crate::core::transaction_ledger::transfer_ids;
use crate::types::{
    Account, AccountId, AccountSnapshot, BankError, ClassFilter, CustomerId, CustomerSnapshot,
    EntryFilter, EntryType, LedgerEntry, TransactionId, TransactionSnapshot, TransferSnapshot,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashSet};

impl BankEngine {
    /// Snapshot of a live account
    pub fn account(&self, account: AccountId) -> Result<AccountSnapshot, BankError> {
        validate_account_id(account)?;
        self.accounts
            .get(account)
            .filter(|stored| !stored.deleted)
            .map(|stored| stored.snapshot())
            .ok_or_else(|| BankError::account_not_found(account))
    }

    /// Live accounts matching a class filter, sorted by id
    pub fn accounts_by_class(&self, filter: ClassFilter) -> Vec<AccountSnapshot> {
        self.live_accounts_where(|account| filter.matches(account.class))
    }

    /// Snapshot of a live customer
    pub fn customer(&self, customer: CustomerId) -> Result<CustomerSnapshot, BankError> {
        validate_customer_id(customer)?;
        self.customers
            .live(customer)
            .map(|stored| stored.snapshot())
            .ok_or_else(|| BankError::customer_not_found(customer))
    }

    /// Live accounts held by a live customer
    pub fn customer_accounts(
        &self,
        customer: CustomerId,
    ) -> Result<Vec<AccountSnapshot>, BankError> {
        self.customer(customer)?;
        Ok(self
            .live_accounts_of(customer)
            .iter()
            .map(|account| account.snapshot())
            .collect())
    }

    /// Live customers holding at least one live account matching `filter`
    pub fn customers_with_class(&self, filter: ClassFilter) -> Vec<CustomerSnapshot> {
        let holders: BTreeSet<CustomerId> = self
            .accounts_by_class(filter)
            .iter()
            .map(|account| account.customer)
            .collect();

        holders
            .into_iter()
            .filter_map(|id| self.customers.live(id))
            .map(|customer| customer.snapshot())
            .collect()
    }

    /// Live accounts of a class opened within `[start, end]`
    ///
    /// # Errors
    ///
    /// `InvalidDateRange` if `start` is after `end` or in the future.
    pub fn accounts_created_between(
        &self,
        filter: ClassFilter,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AccountSnapshot>, BankError> {
        self.validate_date_range(start, end)?;
        Ok(self.live_accounts_where(|account| {
            filter.matches(account.class) && in_range(account.created_at, start, end)
        }))
    }

    /// Live customers holding a live account of a class opened within `[start, end]`
    ///
    /// The account's opening date counts, not the customer's, so a customer
    /// who adds a matching account later shows up for that later range.
    pub fn customers_created_between(
        &self,
        filter: ClassFilter,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CustomerSnapshot>, BankError> {
        let holders: BTreeSet<CustomerId> = self
            .accounts_created_between(filter, start, end)?
            .iter()
            .map(|account| account.customer)
            .collect();

        Ok(holders
            .into_iter()
            .filter_map(|id| self.customers.live(id))
            .map(|customer| customer.snapshot())
            .collect())
    }

    /// Live accounts, now of a class, whose last conversion falls within `[start, end]`
    pub fn accounts_converted_between(
        &self,
        filter: ClassFilter,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AccountSnapshot>, BankError> {
        self.validate_date_range(start, end)?;
        Ok(self.live_accounts_where(|account| {
            filter.matches(account.class)
                && account
                    .converted_at
                    .is_some_and(|at| in_range(at, start, end))
        }))
    }

    /// Live accounts of a class with a balance within `[min, max]`
    ///
    /// # Errors
    ///
    /// `InvalidAmountRange` if either bound is negative or `min > max`.
    pub fn accounts_with_balance_between(
        &self,
        filter: ClassFilter,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<AccountSnapshot>, BankError> {
        validate_amount_range(min, max)?;
        Ok(self.live_accounts_where(|account| {
            filter.matches(account.class) && account.balance >= min && account.balance <= max
        }))
    }

    /// Live ledger rows of one transaction (two for a transfer)
    pub fn transaction(
        &self,
        transaction: TransactionId,
    ) -> Result<Vec<TransactionSnapshot>, BankError> {
        validate_transaction_id(transaction)?;
        let rows = self.ledger.rows_for(transaction);
        if rows.is_empty() {
            return Err(BankError::transaction_not_found(transaction));
        }
        Ok(rows.iter().map(LedgerEntry::snapshot).collect())
    }

    /// Live ledger rows of a live account
    ///
    /// `Deposit` and `Withdraw` select single-row operations, `Transfer`
    /// selects transfer legs in either direction. The other transaction
    /// queries read `EntryFilter` the same way.
    pub fn account_statement(
        &self,
        account: AccountId,
        filter: EntryFilter,
    ) -> Result<Vec<TransactionSnapshot>, BankError> {
        self.account(account)?;
        Ok(self.rows_where(filter, |row| row.account == account && !row.deleted))
    }

    /// Live ledger rows on any account a live customer has ever held
    pub fn customer_transactions(
        &self,
        customer: CustomerId,
        filter: EntryFilter,
    ) -> Result<Vec<TransactionSnapshot>, BankError> {
        self.customer(customer)?;
        let accounts = self.account_ids_of(customer);
        Ok(self.rows_where(filter, |row| !row.deleted && accounts.contains(&row.account)))
    }

    /// Soft-deleted ledger rows on a customer's accounts
    ///
    /// Works for deleted customers too: that is when these rows exist.
    pub fn deleted_customer_transactions(
        &self,
        customer: CustomerId,
        filter: EntryFilter,
    ) -> Result<Vec<TransactionSnapshot>, BankError> {
        validate_customer_id(customer)?;
        if self.customers.get(customer).is_none() {
            return Err(BankError::customer_not_found(customer));
        }
        let accounts = self.account_ids_of(customer);
        Ok(self.rows_where(filter, |row| row.deleted && accounts.contains(&row.account)))
    }

    /// Live ledger rows created within `[start, end]`
    pub fn transactions_between(
        &self,
        filter: EntryFilter,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TransactionSnapshot>, BankError> {
        self.validate_date_range(start, end)?;
        Ok(self.rows_where(filter, |row| {
            !row.deleted && in_range(row.created_at, start, end)
        }))
    }

    /// Live ledger rows with an amount within `[min, max]`
    pub fn transactions_with_amount_between(
        &self,
        filter: EntryFilter,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<TransactionSnapshot>, BankError> {
        validate_amount_range(min, max)?;
        Ok(self.rows_where(filter, |row| {
            !row.deleted && row.amount >= min && row.amount <= max
        }))
    }

    /// Transfers received by a live account, each paired with its sender
    pub fn transfers_received(
        &self,
        account: AccountId,
    ) -> Result<Vec<TransferSnapshot>, BankError> {
        self.account(account)?;

        Ok(self.ledger.read(|rows| {
            rows.iter()
                .filter(|row| {
                    row.account == account && !row.deleted && row.entry_type == EntryType::Deposit
                })
                .filter_map(|credit| {
                    rows.iter()
                        .find(|debit| {
                            debit.transaction_id == credit.transaction_id
                                && debit.entry_type == EntryType::Withdraw
                        })
                        .map(|debit| TransferSnapshot {
                            transaction: credit.transaction_id,
                            sender: debit.account,
                            receiver: credit.account,
                            amount: credit.amount,
                            created_at: credit.created_at,
                        })
                })
                .collect()
        }))
    }

    fn live_accounts_where(
        &self,
        predicate: impl Fn(&Account) -> bool,
    ) -> Vec<AccountSnapshot> {
        self.accounts
            .all()
            .iter()
            .filter(|account| !account.deleted && predicate(account))
            .map(|account| account.snapshot())
            .collect()
    }

    /// Rows passing `predicate` and `filter`; transfers are told apart over
    /// the whole ledger, deleted rows included
    fn rows_where(
        &self,
        filter: EntryFilter,
        predicate: impl Fn(&LedgerEntry) -> bool,
    ) -> Vec<TransactionSnapshot> {
        self.ledger.read(|rows| {
            let transfers = transfer_ids(rows);
            rows.iter()
                .filter(|row| predicate(row))
                .filter(|row| {
                    filter.matches(row.entry_type, transfers.contains(&row.transaction_id))
                })
                .map(LedgerEntry::snapshot)
                .collect()
        })
    }

    /// Every account id a customer has held, deleted included
    fn account_ids_of(&self, customer: CustomerId) -> HashSet<AccountId> {
        self.accounts
            .all()
            .iter()
            .filter(|account| account.customer == customer)
            .map(|account| account.id)
            .collect()
    }

    fn validate_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), BankError> {
        if start > self.now() {
            return Err(BankError::invalid_date_range("start date is in the future"));
        }
        if start > end {
            return Err(BankError::invalid_date_range("start date is after end date"));
        }
        Ok(())
    }
}

fn in_range(at: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    at >= start && at <= end
}

fn validate_amount_range(min: Decimal, max: Decimal) -> Result<(), BankError> {
    if min.is_sign_negative() || max.is_sign_negative() || min > max {
        return Err(BankError::InvalidAmountRange { min, max });
    }
    Ok(())
}
