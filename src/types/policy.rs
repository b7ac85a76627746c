//! Account classes and the limits each class imposes
//!
//! An [`AccountClass`] is a closed enum; the numbers that go with it live in
//! the policy catalog (`core::policy_catalog`). Adding a class means adding a
//! variant here and a row there; the mutation engine only ever sees an
//! [`AccountPolicy`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Policy bucket an account belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccountClass {
    Savings,
    Current,
}

impl AccountClass {
    /// Canonical display name, as stored and printed
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountClass::Savings => "Savings",
            AccountClass::Current => "Current",
        }
    }
}

impl fmt::Display for AccountClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Limits attached to an account class
///
/// `interest_rate` is a percentage (3.5 means 3.5%). It is informational only;
/// nothing in the ledger accrues interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountPolicy {
    pub class: AccountClass,
    pub min_balance: Decimal,
    pub interest_rate: Decimal,
    pub max_withdrawal_amount_per_day: Decimal,
    pub max_withdrawal_count_per_day: u32,
}

/// Account class selector used by read-only queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassFilter {
    All,
    Only(AccountClass),
}

impl ClassFilter {
    pub fn matches(&self, class: AccountClass) -> bool {
        match self {
            ClassFilter::All => true,
            ClassFilter::Only(wanted) => *wanted == class,
        }
    }
}
