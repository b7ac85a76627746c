//! Customer and account lifecycle
//!
//! Creation opens an account with an opening `Deposit` row; deletion is soft
//! and cascades: closing a customer's last account removes the customer, and
//! removing a customer closes every account they hold. Which ledger rows get
//! flagged on close is governed by [`LedgerConfig::delete_cascade`].
//!
//! [`LedgerConfig::delete_cascade`]: crate::types::LedgerConfig
//!
//! Every operation here holds the customer's lock from the liveness check to
//! the last write, so lifecycle changes to one customer never interleave.

use crate::core::customer_registry::CustomerHandle;
use crate::core::engine::{
    validate_account_id, validate_amount, validate_customer_id, BankEngine,
};
use crate::types::{
    Account, AccountClosed, AccountId, AccountOpened, AccountPolicy, BankError, CustomerCreated,
    CustomerId, CustomerRemoved, EntryType,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

impl BankEngine {
    /// Register a customer together with their first account
    ///
    /// # Arguments
    ///
    /// * `name` - Customer name, must not be blank
    /// * `class_name` - Account class of the first account (case-insensitive)
    /// * `opening_amount` - Opening deposit, at least the class minimum balance
    ///
    /// # Errors
    ///
    /// - `MissingField` if `name` is blank
    /// - `InvalidAccountClass` if the class is unknown
    /// - `InvalidAmount` if the amount is not a positive two-decimal value
    /// - `InsufficientOpeningDeposit` if the amount is below the class minimum
    pub fn create_customer(
        &self,
        name: &str,
        class_name: &str,
        opening_amount: Decimal,
    ) -> Result<CustomerCreated, BankError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BankError::missing_field("customer", "name"));
        }
        let policy = self.opening_policy(class_name, opening_amount)?;

        let now = self.now();
        let (customer, account) = self.customers.create_with(name, now, |customer| {
            self.open_account(customer, &policy, opening_amount, now)
        });

        info!(customer, account = account.account, "customer created");
        Ok(CustomerCreated {
            customer,
            name: name.to_string(),
            account,
        })
    }

    /// Open another account for an existing customer
    ///
    /// # Errors
    ///
    /// - `InvalidCustomerId`, `CustomerNotFound`
    /// - the class and amount errors of [`BankEngine::create_customer`]
    pub fn add_account(
        &self,
        customer: CustomerId,
        class_name: &str,
        opening_amount: Decimal,
    ) -> Result<AccountOpened, BankError> {
        validate_customer_id(customer)?;
        let handle = self.customer_handle(customer)?;
        let record = handle.lock();
        if record.deleted {
            return Err(BankError::customer_not_found(customer));
        }
        let policy = self.opening_policy(class_name, opening_amount)?;

        let opened = self.open_account(customer, &policy, opening_amount, self.now());
        drop(record);

        info!(customer, account = opened.account, "account opened");
        Ok(opened)
    }

    /// Soft-delete an account
    ///
    /// Flags the account's ledger rows according to the configured cascade.
    /// If this was the customer's last live account, the customer is deleted
    /// as well.
    ///
    /// # Errors
    ///
    /// - `InvalidAccountId`, `AccountNotFound`
    pub fn delete_account(&self, account: AccountId) -> Result<AccountClosed, BankError> {
        validate_account_id(account)?;
        let customer = self
            .accounts
            .get(account)
            .filter(|stored| !stored.deleted)
            .map(|stored| stored.customer)
            .ok_or_else(|| BankError::account_not_found(account))?;

        let handle = self.customer_handle(customer)?;
        let mut record = handle.lock();
        let rows_flagged = self.close_account(account)?;

        let customer_deleted =
            self.live_accounts_of(customer).is_empty() && record.soft_delete(self.now());
        drop(record);

        info!(account, customer, rows_flagged, customer_deleted, "account deleted");
        Ok(AccountClosed {
            account,
            customer,
            rows_flagged,
            customer_deleted,
        })
    }

    /// Soft-delete a customer and every live account they hold
    ///
    /// # Errors
    ///
    /// - `InvalidCustomerId`, `CustomerNotFound`
    pub fn delete_customer(&self, customer: CustomerId) -> Result<CustomerRemoved, BankError> {
        validate_customer_id(customer)?;
        let handle = self.customer_handle(customer)?;
        let mut record = handle.lock();
        if record.deleted {
            return Err(BankError::customer_not_found(customer));
        }

        let mut accounts = Vec::new();
        for account in self.live_accounts_of(customer) {
            self.close_account(account.id)?;
            accounts.push(account.id);
        }
        record.soft_delete(self.now());
        drop(record);

        info!(customer, accounts = accounts.len(), "customer deleted");
        Ok(CustomerRemoved { customer, accounts })
    }

    /// Limits attached to an account class
    pub fn account_terms(&self, class_name: &str) -> Result<AccountPolicy, BankError> {
        self.catalog.resolve(class_name)
    }

    /// Live accounts held by `customer`, sorted by id
    pub(crate) fn live_accounts_of(&self, customer: CustomerId) -> Vec<Account> {
        self.accounts
            .all()
            .into_iter()
            .filter(|account| account.customer == customer && !account.deleted)
            .collect()
    }

    fn customer_handle(&self, customer: CustomerId) -> Result<CustomerHandle, BankError> {
        self.customers
            .handle(customer)
            .ok_or_else(|| BankError::customer_not_found(customer))
    }

    fn opening_policy(
        &self,
        class_name: &str,
        amount: Decimal,
    ) -> Result<AccountPolicy, BankError> {
        let policy = self.catalog.resolve(class_name)?;
        validate_amount(amount)?;
        if amount < policy.min_balance {
            return Err(BankError::InsufficientOpeningDeposit {
                class: policy.class,
                min_balance: policy.min_balance,
                amount,
            });
        }
        Ok(policy)
    }

    fn open_account(
        &self,
        customer: CustomerId,
        policy: &AccountPolicy,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> AccountOpened {
        let account = self.accounts.allocate_id();
        let transaction = self.accounts.insert_with(
            Account::open(account, customer, policy, amount, now),
            |_| {
                self.ledger.append(
                    account,
                    EntryType::Deposit,
                    amount,
                    format!("Opening deposit of {:.2} into account {}", amount, account),
                    now,
                )
            },
        );

        AccountOpened {
            customer,
            account,
            class: policy.class,
            transaction,
            balance: amount,
        }
    }

    /// Flag an account deleted; returns the number of ledger rows flagged
    ///
    /// Callers hold the owning customer's lock.
    fn close_account(&self, account: AccountId) -> Result<usize, BankError> {
        let handle = self.live_handle(account)?;
        let mut guard = handle.lock();
        if guard.deleted {
            return Err(BankError::account_not_found(account));
        }

        let rows_flagged = self
            .ledger
            .flag_deleted(account, self.config.delete_cascade);
        guard.deleted = true;
        guard.deleted_at = Some(self.now());

        Ok(rows_flagged)
    }
}
