//! Balance mutation engine
//!
//! [`BankEngine`] owns the account store, the transaction ledger, the
//! customer registry and the policy catalog, and is the only thing that
//! changes balances. Every method takes `&self`; the engine is shared behind
//! an `Arc` and serializes work per account.
//!
//! # Mutation protocol
//!
//! 1. Validate the request shape (id format, amount)
//! 2. Lock the affected account(s), in ascending id order for transfers
//! 3. Validate against a working copy of each account, applying the daily
//!    quota reset to the copy first
//! 4. Append the ledger row(s)
//! 5. Write the working copies back
//!
//! Nothing can fail after step 3, so a rejected operation leaves accounts and
//! ledger exactly as they were, including the quota reset timestamp.
//!
//! The engine enforces these rules:
//! - `balance >= min_balance` after every withdrawal and transfer debit
//! - at most `max_withdrawal_count_per_day` debits, totalling at most
//!   `max_withdrawal_amount_per_day`, per rolling 24 hour window
//! - a transfer writes exactly two ledger rows sharing one transaction id

use crate::core::account_store::{AccountHandle, AccountStore};
use crate::core::customer_registry::CustomerRegistry;
use crate::core::policy_catalog::PolicyCatalog;
use crate::core::traits::{Clock, SystemClock};
use crate::core::transaction_ledger::TransactionLedger;
use crate::types::{
    Account, AccountId, AccountPolicy, Applied, BankError, ConversionReceipt, CustomerId,
    DepositReceipt, EntryType, LedgerConfig, Operation, TransactionId, TransferReceipt,
    WithdrawalReceipt, ACCOUNT_ID_BASE, CUSTOMER_ID_BASE, TRANSACTION_ID_BASE,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Length of the withdrawal quota window
const QUOTA_WINDOW_HOURS: i64 = 24;

/// The banking ledger core
#[derive(Debug)]
pub struct BankEngine {
    pub(crate) accounts: AccountStore,
    pub(crate) ledger: TransactionLedger,
    pub(crate) customers: CustomerRegistry,
    pub(crate) catalog: PolicyCatalog,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: LedgerConfig,
}

impl BankEngine {
    /// Create an empty engine with the standard policy catalog and the wall clock
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        Self::with_parts(PolicyCatalog::new(), Arc::new(SystemClock), config)
    }

    /// Create an engine from explicit collaborators
    ///
    /// # Arguments
    ///
    /// * `catalog` - Policy table used to resolve account classes
    /// * `clock` - Time source for timestamps and the quota window
    /// * `config` - Ledger behaviour settings
    pub fn with_parts(catalog: PolicyCatalog, clock: Arc<dyn Clock>, config: LedgerConfig) -> Self {
        BankEngine {
            accounts: AccountStore::new(),
            ledger: TransactionLedger::new(),
            customers: CustomerRegistry::new(),
            catalog,
            clock,
            config,
        }
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn ledger(&self) -> &TransactionLedger {
        &self.ledger
    }

    pub fn customers(&self) -> &CustomerRegistry {
        &self.customers
    }

    pub fn catalog(&self) -> &PolicyCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Credit `amount` to an account
    ///
    /// Deposits never touch the withdrawal quota.
    ///
    /// # Returns
    ///
    /// * `Ok(DepositReceipt)` with the new balance and the ledger row's id
    ///
    /// # Errors
    ///
    /// - `InvalidAccountId` if `account` is below the id base
    /// - `InvalidAmount` if `amount` is not positive or has more than two decimals
    /// - `AccountNotFound` if the account is absent or deleted
    /// - `ArithmeticOverflow` if the balance would overflow
    pub fn deposit(&self, account: AccountId, amount: Decimal) -> Result<DepositReceipt, BankError> {
        validate_account_id(account)?;
        validate_amount(amount)?;

        let handle = self.live_handle(account)?;
        let mut guard = handle.lock();
        if guard.deleted {
            return Err(BankError::account_not_found(account));
        }

        let balance = guard
            .balance
            .checked_add(amount)
            .ok_or_else(|| BankError::arithmetic_overflow("deposit", account))?;

        let transaction = self.ledger.append(
            account,
            EntryType::Deposit,
            amount,
            format!("Account Id {} credited with {:.2}", account, amount),
            self.now(),
        );
        guard.balance = balance;

        debug!(account, %amount, transaction, %balance, "deposit applied");
        Ok(DepositReceipt {
            transaction,
            account,
            amount,
            balance,
        })
    }

    /// Debit `amount` from an account, subject to its class limits
    ///
    /// If more than 24 hours have passed since the quota window started, both
    /// quota counters are restored before any limit is evaluated.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - `InvalidAccountId`, `InvalidAmount`
    /// - `AccountNotFound`
    /// - `InsufficientMinimumBalance` if the balance would drop below the class minimum
    /// - `DailyAmountLimitExceeded` if `amount` exceeds what is left for today
    /// - `DailyCountLimitExceeded` if no withdrawals are left, with the hours until reset
    pub fn withdraw(
        &self,
        account: AccountId,
        amount: Decimal,
    ) -> Result<WithdrawalReceipt, BankError> {
        validate_account_id(account)?;
        validate_amount(amount)?;

        let handle = self.live_handle(account)?;
        let mut guard = handle.lock();
        if guard.deleted {
            return Err(BankError::account_not_found(account));
        }

        let policy = self.catalog.policy_for(guard.class)?;
        let now = self.now();

        let mut working = guard.clone();
        debit(&mut working, &policy, amount, now)?;

        let transaction = self.ledger.append(
            account,
            EntryType::Withdraw,
            amount,
            format!("Account Id {} debited with {:.2}", account, amount),
            now,
        );
        *guard = working;

        debug!(
            account,
            %amount,
            transaction,
            remaining_count = guard.remaining_withdrawal_count,
            "withdrawal applied"
        );
        Ok(WithdrawalReceipt {
            transaction,
            account,
            amount,
            balance: guard.balance,
            remaining_withdrawal_amount: guard.remaining_withdrawal_amount,
            remaining_withdrawal_count: guard.remaining_withdrawal_count,
        })
    }

    /// Move `amount` from `sender` to `receiver`
    ///
    /// The sender is debited under the same reset-then-limits sequence as
    /// [`BankEngine::withdraw`]; the receiver is credited with no quota
    /// interaction. Both account updates and both ledger rows land together
    /// or not at all.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - `SameAccountTransfer`
    /// - `InvalidAccountId` for either side, then `InvalidAmount`
    /// - `AccountNotFound` for the sender, then the receiver
    /// - `InsufficientBalance` if the sender holds less than `amount`
    /// - the withdrawal limit errors, evaluated against the sender
    pub fn transfer(
        &self,
        sender: AccountId,
        receiver: AccountId,
        amount: Decimal,
    ) -> Result<TransferReceipt, BankError> {
        if sender == receiver {
            return Err(BankError::SameAccountTransfer { account: sender });
        }
        validate_account_id(sender)?;
        validate_account_id(receiver)?;
        validate_amount(amount)?;

        let sender_handle = self.live_handle(sender)?;
        let receiver_handle = self.live_handle(receiver)?;
        let (mut sender_guard, mut receiver_guard) =
            AccountStore::lock_pair(&sender_handle, sender, &receiver_handle, receiver);

        if sender_guard.deleted {
            return Err(BankError::account_not_found(sender));
        }
        if receiver_guard.deleted {
            return Err(BankError::account_not_found(receiver));
        }

        if sender_guard.balance < amount {
            return Err(BankError::InsufficientBalance {
                account: sender,
                balance: sender_guard.balance,
                requested: amount,
            });
        }

        let policy = self.catalog.policy_for(sender_guard.class)?;
        let now = self.now();

        let mut working_sender = sender_guard.clone();
        debit(&mut working_sender, &policy, amount, now)?;

        let receiver_balance = receiver_guard
            .balance
            .checked_add(amount)
            .ok_or_else(|| BankError::arithmetic_overflow("transfer", receiver))?;

        let transaction = self
            .ledger
            .append_transfer_pair(sender, receiver, amount, now);
        *sender_guard = working_sender;
        receiver_guard.balance = receiver_balance;

        debug!(sender, receiver, %amount, transaction, "transfer applied");
        Ok(TransferReceipt {
            transaction,
            sender,
            receiver,
            amount,
            sender_balance: sender_guard.balance,
            receiver_balance,
        })
    }

    /// Move an account to a different class
    ///
    /// On success the conversion timestamp is stamped and the quota counters
    /// restart from the new class's maxima.
    ///
    /// # Errors
    ///
    /// - `InvalidAccountId`, `InvalidAccountClass`
    /// - `AccountNotFound`
    /// - `NoOpConversion` if the account already has that class
    /// - `InsufficientBalanceForConversion` if the balance is below the new
    ///   class minimum, carrying the shortfall
    pub fn convert_account(
        &self,
        account: AccountId,
        class_name: &str,
    ) -> Result<ConversionReceipt, BankError> {
        validate_account_id(account)?;
        let policy = self.catalog.resolve(class_name)?;

        let handle = self.live_handle(account)?;
        let mut guard = handle.lock();
        if guard.deleted {
            return Err(BankError::account_not_found(account));
        }

        if guard.class == policy.class {
            return Err(BankError::NoOpConversion {
                account,
                class: policy.class,
            });
        }
        if guard.balance < policy.min_balance {
            return Err(BankError::InsufficientBalanceForConversion {
                account,
                class: policy.class,
                min_balance: policy.min_balance,
                shortfall: policy.min_balance - guard.balance,
            });
        }

        let from = guard.class;
        let now = self.now();
        guard.class = policy.class;
        guard.converted_at = Some(now);
        guard.reset_quota(&policy, now);

        info!(account, %from, to = %policy.class, "account converted");
        Ok(ConversionReceipt {
            account,
            from,
            to: policy.class,
        })
    }

    /// Apply one script operation and return its confirmation message
    ///
    /// Rejections are logged at `warn` and returned; the caller decides
    /// whether to keep going.
    pub fn apply(&self, operation: &Operation) -> Result<String, BankError> {
        self.execute(operation).map(|applied| applied.message)
    }

    /// Like [`apply`](Self::apply), also reporting the transaction id written
    pub fn execute(&self, operation: &Operation) -> Result<Applied, BankError> {
        let result = match operation {
            Operation::CreateCustomer {
                name,
                class,
                amount,
            } => self
                .create_customer(name, class, *amount)
                .map(|r| Applied::from_receipt(&r)),
            Operation::OpenAccount {
                customer,
                class,
                amount,
            } => self
                .add_account(*customer, class, *amount)
                .map(|r| Applied::from_receipt(&r)),
            Operation::Deposit { account, amount } => {
                self.deposit(*account, *amount)
                    .map(|r| Applied::from_receipt(&r))
            }
            Operation::Withdraw { account, amount } => {
                self.withdraw(*account, *amount)
                    .map(|r| Applied::from_receipt(&r))
            }
            Operation::Transfer {
                sender,
                receiver,
                amount,
            } => self
                .transfer(*sender, *receiver, *amount)
                .map(|r| Applied::from_receipt(&r)),
            Operation::Revert { transaction } => self
                .revert(*transaction)
                .map(|r| Applied::from_receipt(&r)),
            Operation::Convert { account, class } => {
                self.convert_account(*account, class)
                    .map(|r| Applied::from_receipt(&r))
            }
            Operation::CloseAccount { account } => {
                self.delete_account(*account)
                    .map(|r| Applied::from_receipt(&r))
            }
            Operation::RemoveCustomer { customer } => {
                self.delete_customer(*customer)
                    .map(|r| Applied::from_receipt(&r))
            }
        };

        if let Err(error) = &result {
            warn!(op = operation.name(), kind = ?error.kind(), "{}", error);
        }
        result
    }

    /// Handle for an account that exists in the store
    ///
    /// The deleted flag must still be checked once the handle is locked.
    pub(crate) fn live_handle(&self, account: AccountId) -> Result<AccountHandle, BankError> {
        self.accounts
            .handle(account)
            .ok_or_else(|| BankError::account_not_found(account))
    }
}

impl Default for BankEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply a debit to a working copy of an account
///
/// Resets the quota window if it has expired, then checks minimum balance,
/// the daily amount and the daily count, in that order. Only mutates
/// `account` past the reset when every check passes.
fn debit(
    account: &mut Account,
    policy: &AccountPolicy,
    amount: Decimal,
    now: DateTime<Utc>,
) -> Result<(), BankError> {
    if now - account.last_reset_at > Duration::hours(QUOTA_WINDOW_HOURS) {
        account.reset_quota(policy, now);
    }

    let balance = account
        .balance
        .checked_sub(amount)
        .ok_or_else(|| BankError::arithmetic_overflow("debit", account.id))?;

    if balance < policy.min_balance {
        return Err(BankError::InsufficientMinimumBalance {
            account: account.id,
            min_balance: policy.min_balance,
        });
    }
    if amount > account.remaining_withdrawal_amount {
        return Err(BankError::DailyAmountLimitExceeded {
            account: account.id,
            remaining: account.remaining_withdrawal_amount,
        });
    }
    if account.remaining_withdrawal_count == 0 {
        return Err(BankError::DailyCountLimitExceeded {
            account: account.id,
            hours_until_reset: hours_until_reset(account.last_reset_at, now),
        });
    }

    account.balance = balance;
    account.remaining_withdrawal_amount -= amount;
    account.remaining_withdrawal_count -= 1;
    Ok(())
}

/// `24 - ceil(hours since last reset)`
fn hours_until_reset(last_reset_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let elapsed = (now - last_reset_at).num_seconds().max(0);
    let elapsed_hours = (elapsed + 3599) / 3600;
    QUOTA_WINDOW_HOURS - elapsed_hours
}

/// Amounts must be positive with at most two decimal places
pub(crate) fn validate_amount(amount: Decimal) -> Result<(), BankError> {
    if amount <= Decimal::ZERO || amount.normalize().scale() > 2 {
        return Err(BankError::invalid_amount(amount));
    }
    Ok(())
}

pub(crate) fn validate_account_id(account: AccountId) -> Result<(), BankError> {
    if account < ACCOUNT_ID_BASE {
        return Err(BankError::InvalidAccountId { account });
    }
    Ok(())
}

pub(crate) fn validate_transaction_id(transaction: TransactionId) -> Result<(), BankError> {
    if transaction < TRANSACTION_ID_BASE {
        return Err(BankError::InvalidTransactionId { transaction });
    }
    Ok(())
}

pub(crate) fn validate_customer_id(customer: CustomerId) -> Result<(), BankError> {
    if customer < CUSTOMER_ID_BASE {
        return Err(BankError::InvalidCustomerId { customer });
    }
    Ok(())
}
