//! Account record and its read model
//!
//! [`Account`] is the full stored record, including the daily withdrawal
//! quota bookkeeping and the soft-delete flag. [`AccountSnapshot`] is what
//! leaves the core: the same data without the deletion bookkeeping.

use super::customer::CustomerId;
use super::policy::{AccountClass, AccountPolicy};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Account number (monotonically increasing from [`ACCOUNT_ID_BASE`])
pub type AccountId = u64;

/// First account number handed out; anything below is malformed
pub const ACCOUNT_ID_BASE: AccountId = 222_200_000_001;

/// Stored account state
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,

    /// Owning customer
    pub customer: CustomerId,

    pub class: AccountClass,

    /// Current balance, two decimal places
    pub balance: Decimal,

    pub created_at: DateTime<Utc>,

    /// Last class conversion, `None` if never converted
    pub converted_at: Option<DateTime<Utc>>,

    /// What may still be withdrawn in the current 24 hour window
    pub remaining_withdrawal_amount: Decimal,

    /// How many withdrawals are still allowed in the current 24 hour window
    pub remaining_withdrawal_count: u32,

    /// Start of the current 24 hour window
    pub last_reset_at: DateTime<Utc>,

    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Create a freshly opened account holding `balance`
    ///
    /// Quota counters start at the policy maxima and the reset window starts
    /// at `now`.
    ///
    /// # Arguments
    ///
    /// * `id` - Account number allocated by the account store
    /// * `customer` - Owning customer
    /// * `policy` - Policy of the account's class
    /// * `balance` - Opening balance
    /// * `now` - Creation instant
    pub fn open(
        id: AccountId,
        customer: CustomerId,
        policy: &AccountPolicy,
        balance: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Account {
            id,
            customer,
            class: policy.class,
            balance,
            created_at: now,
            converted_at: None,
            remaining_withdrawal_amount: policy.max_withdrawal_amount_per_day,
            remaining_withdrawal_count: policy.max_withdrawal_count_per_day,
            last_reset_at: now,
            deleted: false,
            deleted_at: None,
        }
    }

    /// Restore both quota counters to the policy maxima and restart the window
    pub fn reset_quota(&mut self, policy: &AccountPolicy, now: DateTime<Utc>) {
        self.remaining_withdrawal_amount = policy.max_withdrawal_amount_per_day;
        self.remaining_withdrawal_count = policy.max_withdrawal_count_per_day;
        self.last_reset_at = now;
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            account: self.id,
            customer: self.customer,
            class: self.class,
            balance: self.balance,
            created_at: self.created_at,
            converted_at: self.converted_at,
            remaining_withdrawal_amount: self.remaining_withdrawal_amount,
            remaining_withdrawal_count: self.remaining_withdrawal_count,
            last_reset_at: self.last_reset_at,
        }
    }
}

/// Read model of an account, without soft-delete bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSnapshot {
    pub account: AccountId,
    pub customer: CustomerId,
    pub class: AccountClass,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub converted_at: Option<DateTime<Utc>>,
    pub remaining_withdrawal_amount: Decimal,
    pub remaining_withdrawal_count: u32,
    pub last_reset_at: DateTime<Utc>,
}
